//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del core de scheduling.
//! La capa de transporte (externa) decide el framing HTTP; aquí solo se
//! distingue violación de regla de negocio (4xx) de fallo de
//! infraestructura (5xx).

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::day_off::DayOffStatus;

/// Errores del core de scheduling
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Trip with id '{0}' not found")]
    TripNotFound(i32),

    #[error("Driver with id '{0}' not found")]
    DriverNotFound(i32),

    #[error("Day-off request with id '{0}' not found")]
    RequestNotFound(i32),

    #[error("Driver {driver_id} already has trip {trip_id} blocking the requested window")]
    ScheduleConflict { driver_id: i32, trip_id: i32 },

    #[error("Trip start for driver {driver_id} falls inside an approved day off")]
    DayOffConflict { driver_id: i32 },

    #[error("Driver {driver_id} is already assigned to trip {trip_id}")]
    DuplicateAssignment { trip_id: i32, driver_id: i32 },

    #[error("Trip {trip_id} already has a main driver")]
    RoleConflict { trip_id: i32 },

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Driver {driver_id} already has a pending or approved day off overlapping the window")]
    OverlappingRequest { driver_id: i32 },

    #[error("Day-off request {request_id} is already {status}")]
    InvalidTransition {
        request_id: i32,
        status: DayOffStatus,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SchedulingError {
    /// true para violaciones de regla de negocio (rechazo estilo 4xx);
    /// false para fallos de infraestructura (fallo estilo 5xx)
    pub fn is_business_rule(&self) -> bool {
        !matches!(
            self,
            SchedulingError::Database(_) | SchedulingError::Internal(_)
        )
    }

    /// Código estable para la capa de transporte
    pub fn code(&self) -> &'static str {
        match self {
            SchedulingError::TripNotFound(_) => "TRIP_NOT_FOUND",
            SchedulingError::DriverNotFound(_) => "DRIVER_NOT_FOUND",
            SchedulingError::RequestNotFound(_) => "REQUEST_NOT_FOUND",
            SchedulingError::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
            SchedulingError::DayOffConflict { .. } => "DAY_OFF_CONFLICT",
            SchedulingError::DuplicateAssignment { .. } => "DUPLICATE_ASSIGNMENT",
            SchedulingError::RoleConflict { .. } => "ROLE_CONFLICT",
            SchedulingError::InvalidRange { .. } => "INVALID_RANGE",
            SchedulingError::OverlappingRequest { .. } => "OVERLAPPING_REQUEST",
            SchedulingError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SchedulingError::Database(_) => "DB_ERROR",
            SchedulingError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type SchedulingResult<T> = Result<T, SchedulingError>;
