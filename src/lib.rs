//! Core de scheduling de conductores y trips
//!
//! Asigna conductores a trips con restricciones de rol, detecta conflictos
//! de ventanas de tiempo al asignar o al conceder días libres, y deriva la
//! agenda y el dashboard de cada conductor a partir de la tabla de
//! asignaciones. El transporte HTTP, la autenticación y el ciclo de vida
//! de los trips pertenecen a colaboradores externos; aquí solo vive la
//! lógica de planificación sobre los contratos de store.

pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

pub use models::{Assignment, DayOffRequest, DayOffStatus, Driver, DriverRole, Trip, TripStatus, TripSummary};
pub use services::{AssignmentCoordinator, ConflictDetector, ScheduleProjector};
pub use utils::errors::{SchedulingError, SchedulingResult};
