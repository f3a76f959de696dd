//! Modelo de Trip
//!
//! Este módulo contiene el struct Trip y su ciclo de vida. Los trips son
//! creados y transicionados por el workflow de booking/dispatch (externo);
//! este core solo los lee para planificar asignaciones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::SchedulingError;

/// Estado del trip - mapea a la columna `status` de la tabla trips
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Scheduled => "SCHEDULED",
            TripStatus::Ongoing => "ONGOING",
            TripStatus::Completed => "COMPLETED",
            TripStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, SchedulingError> {
        match value {
            "SCHEDULED" => Ok(TripStatus::Scheduled),
            "ONGOING" => Ok(TripStatus::Ongoing),
            "COMPLETED" => Ok(TripStatus::Completed),
            "CANCELLED" => Ok(TripStatus::Cancelled),
            other => Err(SchedulingError::Internal(format!(
                "unknown trip status '{}'",
                other
            ))),
        }
    }

    /// COMPLETED y CANCELLED nunca bloquean una ventana de tiempo
    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    /// Trips visibles en el dashboard del conductor
    pub fn is_active(&self) -> bool {
        matches!(self, TripStatus::Scheduled | TripStatus::Ongoing)
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip principal - espejo de la tabla trips (propiedad del subsistema de booking)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub id: i32,
    pub start_location: String,
    pub end_location: String,
    pub start_time: DateTime<Utc>,
    /// Nullable hasta que el trip arranca/termina; start_time < end_time cuando existe
    pub end_time: Option<DateTime<Utc>>,
    pub status: TripStatus,
}

/// Response de trip para dashboard y schedule del conductor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripSummary {
    pub trip_id: i32,
    pub start_location: String,
    pub end_location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: TripStatus,
}

impl From<Trip> for TripSummary {
    fn from(trip: Trip) -> Self {
        Self {
            trip_id: trip.id,
            start_location: trip.start_location,
            end_location: trip.end_location,
            start_time: trip.start_time,
            end_time: trip.end_time,
            status: trip.status,
        }
    }
}
