//! Modelo de Assignment
//!
//! Relación many-to-many entre drivers y trips con un rol. La clave
//! compuesta es (trip_id, driver_id); el id surrogate conserva el orden de
//! inserción, del que depende la canonicidad del main driver.

use serde::{Deserialize, Serialize};

use crate::utils::errors::SchedulingError;

/// Rol del conductor dentro de un trip - mapea a la columna `driver_role`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverRole {
    MainDriver,
    CoDriver,
}

impl DriverRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverRole::MainDriver => "MAIN_DRIVER",
            DriverRole::CoDriver => "CO_DRIVER",
        }
    }

    pub fn parse(value: &str) -> Result<Self, SchedulingError> {
        match value {
            "MAIN_DRIVER" => Ok(DriverRole::MainDriver),
            "CO_DRIVER" => Ok(DriverRole::CoDriver),
            other => Err(SchedulingError::Internal(format!(
                "unknown driver role '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DriverRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fila de la tabla de asignaciones. Referencia Trip y Driver solo por id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub id: i64,
    pub trip_id: i32,
    pub driver_id: i32,
    pub role: DriverRole,
}
