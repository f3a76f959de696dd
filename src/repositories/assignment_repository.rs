//! Repositorio de Assignments
//!
//! Tabla de relación driver<->trip con rol. Las invariantes de escritura
//! (par único, un solo main driver por trip) se verifican dentro de
//! `create`, no del lado del cliente: un segundo main driver falla con
//! RoleConflict aunque existan duplicados legacy, para los que el primero
//! insertado sigue siendo el canónico.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::models::assignment::{Assignment, DriverRole};
use crate::models::trip::{Trip, TripStatus};
use crate::utils::errors::{SchedulingError, SchedulingResult};

/// Contrato sobre la tabla trip_drivers
#[async_trait]
pub trait AssignmentTable: Send + Sync {
    /// Trips del conductor con su rol, orden descendente por start_time.
    /// El rango opcional filtra por start_time inclusivo en ambos extremos.
    async fn assignments_for_driver(
        &self,
        driver_id: i32,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> SchedulingResult<Vec<(Trip, DriverRole)>>;

    async fn assignments_for_trip(
        &self,
        trip_id: i32,
    ) -> SchedulingResult<Vec<(i32, DriverRole)>>;

    /// Main driver canónico del trip: el MAIN_DRIVER insertado primero,
    /// ignorando duplicados legacy
    async fn main_driver_of(&self, trip_id: i32) -> SchedulingResult<Option<i32>>;

    async fn exists(&self, trip_id: i32, driver_id: i32) -> SchedulingResult<bool>;

    async fn create(
        &self,
        trip_id: i32,
        driver_id: i32,
        role: DriverRole,
    ) -> SchedulingResult<Assignment>;

    /// Borrado idempotente de un par; devuelve si existía
    async fn delete(&self, trip_id: i32, driver_id: i32) -> SchedulingResult<bool>;

    /// Limpieza en cascada antes de borrar el trip; idempotente
    async fn delete_by_trip(&self, trip_id: i32) -> SchedulingResult<()>;

    /// Trips no terminales del conductor con start_time en [start, end),
    /// orden ascendente por start_time. Semántica half-open solo sobre el
    /// start del trip; la duración del trip no se examina.
    async fn conflicting_trips(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Trip>>;

    /// Trips no terminales del conductor cuya ventana [start_time, end_time)
    /// contiene el instante dado; end_time ausente no puede cubrir
    async fn covering_trips(&self, driver_id: i32, at: DateTime<Utc>)
        -> SchedulingResult<Vec<Trip>>;
}

#[derive(Debug, sqlx::FromRow)]
struct AssignedTripRow {
    trip_id: i32,
    start_location: String,
    end_location: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    status: String,
    driver_role: String,
}

impl AssignedTripRow {
    fn into_pair(self) -> SchedulingResult<(Trip, DriverRole)> {
        let trip = Trip {
            id: self.trip_id,
            start_location: self.start_location,
            end_location: self.end_location,
            start_time: self.start_time,
            end_time: self.end_time,
            status: TripStatus::parse(&self.status)?,
        };
        Ok((trip, DriverRole::parse(&self.driver_role)?))
    }
}

pub struct PgAssignmentRepository {
    pool: PgPool,
}

impl PgAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentTable for PgAssignmentRepository {
    async fn assignments_for_driver(
        &self,
        driver_id: i32,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> SchedulingResult<Vec<(Trip, DriverRole)>> {
        let (from, to) = match range {
            Some((from, to)) => (Some(from), Some(to)),
            None => (None, None),
        };

        let rows = sqlx::query_as::<_, AssignedTripRow>(
            "SELECT t.id AS trip_id, t.start_location, t.end_location,
                    t.start_time, t.end_time, t.status, td.driver_role
             FROM trip_drivers td
             JOIN trips t ON t.id = td.trip_id
             WHERE td.driver_id = $1
               AND ($2::timestamptz IS NULL OR t.start_time >= $2)
               AND ($3::timestamptz IS NULL OR t.start_time <= $3)
             ORDER BY t.start_time DESC",
        )
        .bind(driver_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        rows.into_iter().map(AssignedTripRow::into_pair).collect()
    }

    async fn assignments_for_trip(
        &self,
        trip_id: i32,
    ) -> SchedulingResult<Vec<(i32, DriverRole)>> {
        let rows: Vec<(i32, String)> = sqlx::query_as(
            "SELECT driver_id, driver_role FROM trip_drivers
             WHERE trip_id = $1 ORDER BY id ASC",
        )
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        rows.into_iter()
            .map(|(driver_id, role)| Ok((driver_id, DriverRole::parse(&role)?)))
            .collect()
    }

    async fn main_driver_of(&self, trip_id: i32) -> SchedulingResult<Option<i32>> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT driver_id FROM trip_drivers
             WHERE trip_id = $1 AND driver_role = $2
             ORDER BY id ASC LIMIT 1",
        )
        .bind(trip_id)
        .bind(DriverRole::MainDriver.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        Ok(row.map(|r| r.0))
    }

    async fn exists(&self, trip_id: i32, driver_id: i32) -> SchedulingResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM trip_drivers WHERE trip_id = $1 AND driver_id = $2)",
        )
        .bind(trip_id)
        .bind(driver_id)
        .fetch_one(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        Ok(result.0)
    }

    async fn create(
        &self,
        trip_id: i32,
        driver_id: i32,
        role: DriverRole,
    ) -> SchedulingResult<Assignment> {
        let mut tx = self.pool.begin().await.map_err(SchedulingError::Database)?;

        // Serializar escritores del mismo trip para la unicidad de rol
        sqlx::query("SELECT id FROM trips WHERE id = $1 FOR UPDATE")
            .bind(trip_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(SchedulingError::Database)?;

        let duplicate: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM trip_drivers WHERE trip_id = $1 AND driver_id = $2)",
        )
        .bind(trip_id)
        .bind(driver_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(SchedulingError::Database)?;

        if duplicate.0 {
            return Err(SchedulingError::DuplicateAssignment { trip_id, driver_id });
        }

        if role == DriverRole::MainDriver {
            let main_taken: (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM trip_drivers WHERE trip_id = $1 AND driver_role = $2)",
            )
            .bind(trip_id)
            .bind(DriverRole::MainDriver.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(SchedulingError::Database)?;

            if main_taken.0 {
                return Err(SchedulingError::RoleConflict { trip_id });
            }
        }

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO trip_drivers (trip_id, driver_id, driver_role)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(trip_id)
        .bind(driver_id)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(SchedulingError::Database)?;

        tx.commit().await.map_err(SchedulingError::Database)?;

        debug!("[Assignments] created assignment {} ({} on trip {})", id, role, trip_id);

        Ok(Assignment {
            id,
            trip_id,
            driver_id,
            role,
        })
    }

    async fn delete(&self, trip_id: i32, driver_id: i32) -> SchedulingResult<bool> {
        let result = sqlx::query(
            "DELETE FROM trip_drivers WHERE trip_id = $1 AND driver_id = $2",
        )
        .bind(trip_id)
        .bind(driver_id)
        .execute(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_trip(&self, trip_id: i32) -> SchedulingResult<()> {
        sqlx::query("DELETE FROM trip_drivers WHERE trip_id = $1")
            .bind(trip_id)
            .execute(&self.pool)
            .await
            .map_err(SchedulingError::Database)?;

        Ok(())
    }

    async fn conflicting_trips(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, AssignedTripRow>(
            "SELECT t.id AS trip_id, t.start_location, t.end_location,
                    t.start_time, t.end_time, t.status, td.driver_role
             FROM trip_drivers td
             JOIN trips t ON t.id = td.trip_id
             WHERE td.driver_id = $1
               AND t.start_time >= $2
               AND t.start_time < $3
               AND t.status NOT IN ('CANCELLED', 'COMPLETED')
             ORDER BY t.start_time ASC",
        )
        .bind(driver_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        rows.into_iter()
            .map(|row| row.into_pair().map(|(trip, _)| trip))
            .collect()
    }

    async fn covering_trips(
        &self,
        driver_id: i32,
        at: DateTime<Utc>,
    ) -> SchedulingResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, AssignedTripRow>(
            "SELECT t.id AS trip_id, t.start_location, t.end_location,
                    t.start_time, t.end_time, t.status, td.driver_role
             FROM trip_drivers td
             JOIN trips t ON t.id = td.trip_id
             WHERE td.driver_id = $1
               AND t.start_time <= $2
               AND t.end_time IS NOT NULL
               AND t.end_time > $2
               AND t.status NOT IN ('CANCELLED', 'COMPLETED')
             ORDER BY t.start_time ASC",
        )
        .bind(driver_id)
        .bind(at)
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        rows.into_iter()
            .map(|row| row.into_pair().map(|(trip, _)| trip))
            .collect()
    }
}
