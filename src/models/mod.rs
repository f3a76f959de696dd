pub mod assignment;
pub mod day_off;
pub mod driver;
pub mod trip;

pub use assignment::{Assignment, DriverRole};
pub use day_off::{DayOffRequest, DayOffStatus};
pub use driver::Driver;
pub use trip::{Trip, TripStatus, TripSummary};
