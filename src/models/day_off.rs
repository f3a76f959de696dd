//! Modelo de DayOffRequest
//!
//! Solicitudes de ausencia por conductor. Nacen PENDING por acción del
//! conductor y un manager las aprueba o rechaza; la aprobación pasa antes
//! por el detector de conflictos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::errors::SchedulingError;

/// Estado de la solicitud de día libre
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOffStatus {
    Pending,
    Approved,
    Rejected,
}

impl DayOffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOffStatus::Pending => "PENDING",
            DayOffStatus::Approved => "APPROVED",
            DayOffStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, SchedulingError> {
        match value {
            "PENDING" => Ok(DayOffStatus::Pending),
            "APPROVED" => Ok(DayOffStatus::Approved),
            "REJECTED" => Ok(DayOffStatus::Rejected),
            other => Err(SchedulingError::Internal(format!(
                "unknown day-off status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DayOffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Solicitud de día libre - invariante: start_date <= end_date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayOffRequest {
    pub id: i32,
    pub driver_id: i32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: DayOffStatus,
    pub reason: Option<String>,
}
