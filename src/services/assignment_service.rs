//! Servicio coordinador de asignaciones
//!
//! Orquesta las mutaciones del scheduling: asignar/desasignar conductores
//! y el ciclo de vida de los días libres. Toda mutación pasa antes por el
//! detector de conflictos, y la secuencia check+write se ejecuta bajo un
//! lock por conductor para que dos escritores concurrentes del mismo
//! conductor no pasen ambos la verificación.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::models::assignment::{Assignment, DriverRole};
use crate::models::day_off::{DayOffRequest, DayOffStatus};
use crate::repositories::assignment_repository::AssignmentTable;
use crate::repositories::day_off_repository::DayOffLedger;
use crate::repositories::driver_repository::DriverDirectory;
use crate::repositories::trip_repository::TripStore;
use crate::services::conflict_service::ConflictDetector;
use crate::utils::errors::{SchedulingError, SchedulingResult};

pub struct AssignmentCoordinator {
    trips: Arc<dyn TripStore>,
    drivers: Arc<dyn DriverDirectory>,
    assignments: Arc<dyn AssignmentTable>,
    day_offs: Arc<dyn DayOffLedger>,
    detector: ConflictDetector,
    driver_locks: RwLock<HashMap<i32, Arc<Mutex<()>>>>,
}

impl AssignmentCoordinator {
    pub fn new(
        trips: Arc<dyn TripStore>,
        drivers: Arc<dyn DriverDirectory>,
        assignments: Arc<dyn AssignmentTable>,
        day_offs: Arc<dyn DayOffLedger>,
    ) -> Self {
        let detector = ConflictDetector::new(assignments.clone(), day_offs.clone());
        Self {
            trips,
            drivers,
            assignments,
            day_offs,
            detector,
            driver_locks: RwLock::new(HashMap::new()),
        }
    }

    /// Lock de exclusión mutua por conductor; serializa check+write
    async fn driver_lock(&self, driver_id: i32) -> Arc<Mutex<()>> {
        {
            let locks = self.driver_locks.read().await;
            if let Some(lock) = locks.get(&driver_id) {
                return lock.clone();
            }
        }
        let mut locks = self.driver_locks.write().await;
        locks
            .entry(driver_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Asigna un conductor a un trip con un rol, verificando antes que la
    /// ventana del trip esté libre y que no caiga en un día libre aprobado
    pub async fn assign_driver(
        &self,
        trip_id: i32,
        driver_id: i32,
        role: DriverRole,
    ) -> SchedulingResult<Assignment> {
        info!(
            "[AssignDriver] driver {} -> trip {} as {}",
            driver_id, trip_id, role
        );

        let trip = self
            .trips
            .get(trip_id)
            .await?
            .ok_or(SchedulingError::TripNotFound(trip_id))?;

        if !self.drivers.exists(driver_id).await? {
            return Err(SchedulingError::DriverNotFound(driver_id));
        }

        let lock = self.driver_lock(driver_id).await;
        let _guard = lock.lock().await;

        let conflicts = self.detector.assignment_conflicts(driver_id, &trip).await?;
        if let Some(blocking) = conflicts.first() {
            warn!(
                "[AssignDriver] rejected: driver {} blocked by trip {}",
                driver_id, blocking.id
            );
            return Err(SchedulingError::ScheduleConflict {
                driver_id,
                trip_id: blocking.id,
            });
        }

        if self
            .detector
            .approved_day_off_covers(driver_id, trip.start_time)
            .await?
        {
            warn!(
                "[AssignDriver] rejected: trip {} starts inside an approved day off of driver {}",
                trip_id, driver_id
            );
            return Err(SchedulingError::DayOffConflict { driver_id });
        }

        self.assignments.create(trip_id, driver_id, role).await
    }

    /// Desasignación idempotente; repetirla no es un error
    pub async fn unassign_driver(&self, trip_id: i32, driver_id: i32) -> SchedulingResult<()> {
        let removed = self.assignments.delete(trip_id, driver_id).await?;
        info!(
            "[UnassignDriver] driver {} / trip {}: removed={}",
            driver_id, trip_id, removed
        );
        Ok(())
    }

    /// Limpieza en cascada de todas las asignaciones de un trip, previa al
    /// borrado del trip por el workflow de booking
    pub async fn remove_trip_assignments(&self, trip_id: i32) -> SchedulingResult<()> {
        info!("[RemoveTripAssignments] trip {}", trip_id);
        self.assignments.delete_by_trip(trip_id).await
    }

    /// Crea una solicitud de día libre en estado PENDING
    pub async fn request_day_off(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        reason: Option<String>,
    ) -> SchedulingResult<DayOffRequest> {
        info!(
            "[RequestDayOff] driver {} window [{}, {})",
            driver_id, start, end
        );

        if start > end {
            return Err(SchedulingError::InvalidRange { start, end });
        }

        if !self.drivers.exists(driver_id).await? {
            return Err(SchedulingError::DriverNotFound(driver_id));
        }

        let lock = self.driver_lock(driver_id).await;
        let _guard = lock.lock().await;

        if self
            .day_offs
            .active_or_pending_overlap(driver_id, start, end)
            .await?
        {
            return Err(SchedulingError::OverlappingRequest { driver_id });
        }

        self.day_offs.create(driver_id, start, end, reason).await
    }

    /// Aprueba o rechaza una solicitud PENDING. La aprobación verifica
    /// antes que ningún trip no terminal arranque dentro de la ventana;
    /// ante conflicto la solicitud queda PENDING.
    pub async fn decide_day_off(
        &self,
        request_id: i32,
        approve: bool,
    ) -> SchedulingResult<DayOffRequest> {
        let request = self
            .day_offs
            .get(request_id)
            .await?
            .ok_or(SchedulingError::RequestNotFound(request_id))?;

        let lock = self.driver_lock(request.driver_id).await;
        let _guard = lock.lock().await;

        // Releer bajo el lock: otro decisor pudo ganar la carrera
        let request = self
            .day_offs
            .get(request_id)
            .await?
            .ok_or(SchedulingError::RequestNotFound(request_id))?;

        if request.status != DayOffStatus::Pending {
            return Err(SchedulingError::InvalidTransition {
                request_id,
                status: request.status,
            });
        }

        if approve {
            let blocking = self
                .detector
                .blocking_trips(request.driver_id, request.start_date, request.end_date)
                .await?;
            if let Some(trip) = blocking.first() {
                warn!(
                    "[DecideDayOff] request {} blocked by trip {} of driver {}",
                    request_id, trip.id, request.driver_id
                );
                return Err(SchedulingError::ScheduleConflict {
                    driver_id: request.driver_id,
                    trip_id: trip.id,
                });
            }
            info!("[DecideDayOff] request {} approved", request_id);
            self.day_offs
                .set_status(request_id, DayOffStatus::Approved)
                .await
        } else {
            info!("[DecideDayOff] request {} rejected", request_id);
            self.day_offs
                .set_status(request_id, DayOffStatus::Rejected)
                .await
        }
    }

    /// Solicitudes de día libre del conductor, más recientes primero
    pub async fn day_offs_for(&self, driver_id: i32) -> SchedulingResult<Vec<DayOffRequest>> {
        if !self.drivers.exists(driver_id).await? {
            return Err(SchedulingError::DriverNotFound(driver_id));
        }
        self.day_offs.list_for_driver(driver_id).await
    }
}
