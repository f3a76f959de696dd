//! Servicio de detección de conflictos
//!
//! Decide si un conductor está libre para una ventana half-open
//! [start, end). Solo se compara el start_time de los trips existentes
//! contra los bordes de la ventana; la duración del trip más allá de los
//! bordes no se examina (aproximación deliberada del sistema). Los trips
//! CANCELLED y COMPLETED nunca bloquean.
//!
//! El mismo servicio valida las dos direcciones: una ventana de día libre
//! contra los trips asignados, y un trip nuevo contra los días libres ya
//! aprobados.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::trip::Trip;
use crate::repositories::assignment_repository::AssignmentTable;
use crate::repositories::day_off_repository::DayOffLedger;
use crate::utils::errors::SchedulingResult;

#[derive(Clone)]
pub struct ConflictDetector {
    assignments: Arc<dyn AssignmentTable>,
    day_offs: Arc<dyn DayOffLedger>,
}

impl ConflictDetector {
    pub fn new(assignments: Arc<dyn AssignmentTable>, day_offs: Arc<dyn DayOffLedger>) -> Self {
        Self {
            assignments,
            day_offs,
        }
    }

    /// Trips no terminales del conductor cuyo start cae en [start, end),
    /// en orden ascendente por start_time
    pub async fn blocking_trips(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Trip>> {
        let blocking = self
            .assignments
            .conflicting_trips(driver_id, start, end)
            .await?;
        debug!(
            "[ConflictDetector] driver {} window [{}, {}): {} blocking trip(s)",
            driver_id,
            start,
            end,
            blocking.len()
        );
        Ok(blocking)
    }

    /// El conductor está libre sii la lista filtrada queda vacía
    pub async fn is_free(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<bool> {
        Ok(self.blocking_trips(driver_id, start, end).await?.is_empty())
    }

    /// Conflictos al asignar un trip concreto: trips existentes que
    /// arrancan dentro de la ventana del candidato, más trips existentes
    /// cuya ventana cubre el start del candidato. Sin end_time la ventana
    /// del candidato degenera a su instante de arranque.
    pub async fn assignment_conflicts(
        &self,
        driver_id: i32,
        candidate: &Trip,
    ) -> SchedulingResult<Vec<Trip>> {
        let window_end = candidate
            .end_time
            .unwrap_or(candidate.start_time + Duration::microseconds(1));

        let mut conflicts = self
            .blocking_trips(driver_id, candidate.start_time, window_end)
            .await?;

        let covering = self
            .assignments
            .covering_trips(driver_id, candidate.start_time)
            .await?;
        for trip in covering {
            if trip.id != candidate.id && !conflicts.iter().any(|c| c.id == trip.id) {
                conflicts.push(trip);
            }
        }

        conflicts.retain(|trip| trip.id != candidate.id);
        conflicts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(conflicts)
    }

    /// true si un día libre APPROVED del conductor cubre el instante
    pub async fn approved_day_off_covers(
        &self,
        driver_id: i32,
        at: DateTime<Utc>,
    ) -> SchedulingResult<bool> {
        self.day_offs.approved_covering(driver_id, at).await
    }
}
