pub mod assignment_repository;
pub mod day_off_repository;
pub mod driver_repository;
pub mod memory;
pub mod trip_repository;

pub use assignment_repository::AssignmentTable;
pub use day_off_repository::DayOffLedger;
pub use driver_repository::DriverDirectory;
pub use trip_repository::TripStore;
