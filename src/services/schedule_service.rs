//! Servicio de proyección de agenda
//!
//! Construye la vista de agenda y el dato de dashboard del conductor a
//! partir de la tabla de asignaciones. El dashboard devuelve el trip
//! activo con el arranque más próximo (mínimo por start_time, empates por
//! id más bajo); reusar el listado descendente y tomar el primero
//! devolvería el más lejano.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::trip::TripSummary;
use crate::repositories::assignment_repository::AssignmentTable;
use crate::utils::errors::SchedulingResult;

#[derive(Clone)]
pub struct ScheduleProjector {
    assignments: Arc<dyn AssignmentTable>,
}

impl ScheduleProjector {
    pub fn new(assignments: Arc<dyn AssignmentTable>) -> Self {
        Self { assignments }
    }

    /// Trip actual/siguiente del conductor: entre los SCHEDULED/ONGOING,
    /// el de arranque más temprano
    pub async fn dashboard_for(&self, driver_id: i32) -> SchedulingResult<Option<TripSummary>> {
        info!("[DriverDashboard] Fetching dashboard for driver {}", driver_id);
        let assignments = self.assignments.assignments_for_driver(driver_id, None).await?;

        Ok(assignments
            .into_iter()
            .map(|(trip, _)| trip)
            .filter(|trip| trip.status.is_active())
            .min_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)))
            .map(TripSummary::from))
    }

    /// Agenda del conductor, descendente por start_time (más nuevo
    /// primero, igual que el listado publicado). El rango opcional filtra
    /// por start_time inclusivo en ambos extremos.
    pub async fn schedule_for(
        &self,
        driver_id: i32,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> SchedulingResult<Vec<TripSummary>> {
        info!("[DriverSchedule] Loading schedule for driver {}", driver_id);
        let assignments = self.assignments.assignments_for_driver(driver_id, range).await?;

        Ok(assignments
            .into_iter()
            .map(|(trip, _)| TripSummary::from(trip))
            .collect())
    }
}
