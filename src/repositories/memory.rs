//! Stores en memoria
//!
//! Implementaciones en memoria de los mismos contratos que los
//! repositorios Postgres, para tests y despliegues embebidos. El estado
//! compartido vive detrás de `Arc<RwLock<...>>`; las invariantes de
//! escritura se verifican bajo el write lock, igual que en la transacción
//! del repositorio Postgres.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::assignment::{Assignment, DriverRole};
use crate::models::day_off::{DayOffRequest, DayOffStatus};
use crate::models::driver::Driver;
use crate::models::trip::{Trip, TripStatus};
use crate::utils::errors::{SchedulingError, SchedulingResult};

use super::assignment_repository::AssignmentTable;
use super::day_off_repository::DayOffLedger;
use super::driver_repository::DriverDirectory;
use super::trip_repository::TripStore;

/// Store de trips en memoria. Los trips los escribe el workflow de booking;
/// `insert` y `set_status` son esa superficie externa.
#[derive(Clone, Default)]
pub struct InMemoryTripStore {
    trips: Arc<RwLock<HashMap<i32, Trip>>>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, trip: Trip) {
        self.trips.write().await.insert(trip.id, trip);
    }

    pub async fn set_status(&self, trip_id: i32, status: TripStatus) -> SchedulingResult<()> {
        let mut trips = self.trips.write().await;
        let trip = trips
            .get_mut(&trip_id)
            .ok_or(SchedulingError::TripNotFound(trip_id))?;
        trip.status = status;
        Ok(())
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn get(&self, trip_id: i32) -> SchedulingResult<Option<Trip>> {
        Ok(self.trips.read().await.get(&trip_id).cloned())
    }

    async fn list(&self) -> SchedulingResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self.trips.read().await.values().cloned().collect();
        trips.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));
        Ok(trips)
    }
}

/// Directorio de drivers en memoria
#[derive(Clone, Default)]
pub struct InMemoryDriverDirectory {
    drivers: Arc<RwLock<HashMap<i32, Driver>>>,
}

impl InMemoryDriverDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, driver: Driver) {
        self.drivers.write().await.insert(driver.id, driver);
    }
}

#[async_trait]
impl DriverDirectory for InMemoryDriverDirectory {
    async fn get(&self, driver_id: i32) -> SchedulingResult<Option<Driver>> {
        Ok(self.drivers.read().await.get(&driver_id).cloned())
    }
}

#[derive(Default)]
struct AssignmentState {
    rows: Vec<Assignment>,
    next_id: i64,
}

/// Tabla de asignaciones en memoria. Necesita el store de trips para
/// devolver los pares (Trip, rol) ya resueltos.
#[derive(Clone)]
pub struct InMemoryAssignmentTable {
    state: Arc<RwLock<AssignmentState>>,
    trips: InMemoryTripStore,
}

impl InMemoryAssignmentTable {
    pub fn new(trips: InMemoryTripStore) -> Self {
        Self {
            state: Arc::new(RwLock::new(AssignmentState::default())),
            trips,
        }
    }

    async fn resolved_for_driver(&self, driver_id: i32) -> SchedulingResult<Vec<(Trip, DriverRole)>> {
        let rows: Vec<Assignment> = {
            let state = self.state.read().await;
            state
                .rows
                .iter()
                .filter(|a| a.driver_id == driver_id)
                .cloned()
                .collect()
        };

        let mut resolved = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(trip) = self.trips.get(row.trip_id).await? {
                resolved.push((trip, row.role));
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl AssignmentTable for InMemoryAssignmentTable {
    async fn assignments_for_driver(
        &self,
        driver_id: i32,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> SchedulingResult<Vec<(Trip, DriverRole)>> {
        let mut resolved = self.resolved_for_driver(driver_id).await?;
        if let Some((from, to)) = range {
            resolved.retain(|(trip, _)| trip.start_time >= from && trip.start_time <= to);
        }
        resolved.sort_by(|(a, _), (b, _)| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));
        Ok(resolved)
    }

    async fn assignments_for_trip(
        &self,
        trip_id: i32,
    ) -> SchedulingResult<Vec<(i32, DriverRole)>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .iter()
            .filter(|a| a.trip_id == trip_id)
            .map(|a| (a.driver_id, a.role))
            .collect())
    }

    async fn main_driver_of(&self, trip_id: i32) -> SchedulingResult<Option<i32>> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .iter()
            .filter(|a| a.trip_id == trip_id && a.role == DriverRole::MainDriver)
            .min_by_key(|a| a.id)
            .map(|a| a.driver_id))
    }

    async fn exists(&self, trip_id: i32, driver_id: i32) -> SchedulingResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .rows
            .iter()
            .any(|a| a.trip_id == trip_id && a.driver_id == driver_id))
    }

    async fn create(
        &self,
        trip_id: i32,
        driver_id: i32,
        role: DriverRole,
    ) -> SchedulingResult<Assignment> {
        let mut state = self.state.write().await;

        if state
            .rows
            .iter()
            .any(|a| a.trip_id == trip_id && a.driver_id == driver_id)
        {
            return Err(SchedulingError::DuplicateAssignment { trip_id, driver_id });
        }

        if role == DriverRole::MainDriver
            && state
                .rows
                .iter()
                .any(|a| a.trip_id == trip_id && a.role == DriverRole::MainDriver)
        {
            return Err(SchedulingError::RoleConflict { trip_id });
        }

        state.next_id += 1;
        let assignment = Assignment {
            id: state.next_id,
            trip_id,
            driver_id,
            role,
        };
        state.rows.push(assignment.clone());
        Ok(assignment)
    }

    async fn delete(&self, trip_id: i32, driver_id: i32) -> SchedulingResult<bool> {
        let mut state = self.state.write().await;
        let before = state.rows.len();
        state
            .rows
            .retain(|a| !(a.trip_id == trip_id && a.driver_id == driver_id));
        Ok(state.rows.len() < before)
    }

    async fn delete_by_trip(&self, trip_id: i32) -> SchedulingResult<()> {
        let mut state = self.state.write().await;
        state.rows.retain(|a| a.trip_id != trip_id);
        Ok(())
    }

    async fn conflicting_trips(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .resolved_for_driver(driver_id)
            .await?
            .into_iter()
            .map(|(trip, _)| trip)
            .filter(|trip| {
                !trip.status.is_terminal()
                    && trip.start_time >= start
                    && trip.start_time < end
            })
            .collect();
        trips.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(trips)
    }

    async fn covering_trips(
        &self,
        driver_id: i32,
        at: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Trip>> {
        let mut trips: Vec<Trip> = self
            .resolved_for_driver(driver_id)
            .await?
            .into_iter()
            .map(|(trip, _)| trip)
            .filter(|trip| {
                !trip.status.is_terminal()
                    && trip.start_time <= at
                    && trip.end_time.map_or(false, |end| end > at)
            })
            .collect();
        trips.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(trips)
    }
}

#[derive(Default)]
struct DayOffState {
    rows: HashMap<i32, DayOffRequest>,
    next_id: i32,
}

/// Ledger de días libres en memoria
#[derive(Clone, Default)]
pub struct InMemoryDayOffLedger {
    state: Arc<RwLock<DayOffState>>,
}

impl InMemoryDayOffLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DayOffLedger for InMemoryDayOffLedger {
    async fn create(
        &self,
        driver_id: i32,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        reason: Option<String>,
    ) -> SchedulingResult<DayOffRequest> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let request = DayOffRequest {
            id: state.next_id,
            driver_id,
            start_date,
            end_date,
            status: DayOffStatus::Pending,
            reason,
        };
        state.rows.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, request_id: i32) -> SchedulingResult<Option<DayOffRequest>> {
        Ok(self.state.read().await.rows.get(&request_id).cloned())
    }

    async fn set_status(
        &self,
        request_id: i32,
        status: DayOffStatus,
    ) -> SchedulingResult<DayOffRequest> {
        let mut state = self.state.write().await;
        let request = state
            .rows
            .get_mut(&request_id)
            .ok_or(SchedulingError::RequestNotFound(request_id))?;
        request.status = status;
        Ok(request.clone())
    }

    async fn active_or_pending_overlap(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<bool> {
        let state = self.state.read().await;
        Ok(state.rows.values().any(|r| {
            r.driver_id == driver_id
                && matches!(r.status, DayOffStatus::Pending | DayOffStatus::Approved)
                && r.start_date < end
                && r.end_date > start
        }))
    }

    async fn approved_covering(
        &self,
        driver_id: i32,
        at: DateTime<Utc>,
    ) -> SchedulingResult<bool> {
        let state = self.state.read().await;
        Ok(state.rows.values().any(|r| {
            r.driver_id == driver_id
                && r.status == DayOffStatus::Approved
                && r.start_date <= at
                && r.end_date > at
        }))
    }

    async fn list_for_driver(&self, driver_id: i32) -> SchedulingResult<Vec<DayOffRequest>> {
        let state = self.state.read().await;
        let mut rows: Vec<DayOffRequest> = state
            .rows
            .values()
            .filter(|r| r.driver_id == driver_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(a.id.cmp(&b.id)));
        Ok(rows)
    }
}
