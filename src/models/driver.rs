//! Modelo de Driver
//!
//! Identidad mínima del conductor. El registro completo de empleado vive en
//! el subsistema de HR; aquí solo se necesita el id para planificar.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Driver {
    pub id: i32,
    pub full_name: String,
}
