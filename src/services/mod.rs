pub mod assignment_service;
pub mod conflict_service;
pub mod schedule_service;

pub use assignment_service::AssignmentCoordinator;
pub use conflict_service::ConflictDetector;
pub use schedule_service::ScheduleProjector;
