//! Repositorio de Trips
//!
//! Los trips pertenecen al subsistema de booking; este core solo los lee.
//! El contrato es un trait para poder testear los servicios contra un
//! store en memoria con la misma semántica.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::trip::{Trip, TripStatus};
use crate::utils::errors::{SchedulingError, SchedulingResult};

/// Contrato de lectura sobre la tabla trips
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Id ausente devuelve Ok(None), nunca un error
    async fn get(&self, trip_id: i32) -> SchedulingResult<Option<Trip>>;

    async fn list(&self) -> SchedulingResult<Vec<Trip>>;
}

// Fila cruda de la tabla trips; el status viaja como TEXT
#[derive(Debug, sqlx::FromRow)]
struct TripRow {
    id: i32,
    start_location: String,
    end_location: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    status: String,
}

impl TripRow {
    fn into_trip(self) -> SchedulingResult<Trip> {
        Ok(Trip {
            id: self.id,
            start_location: self.start_location,
            end_location: self.end_location,
            start_time: self.start_time,
            end_time: self.end_time,
            status: TripStatus::parse(&self.status)?,
        })
    }
}

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripStore for PgTripRepository {
    async fn get(&self, trip_id: i32) -> SchedulingResult<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>(
            "SELECT id, start_location, end_location, start_time, end_time, status
             FROM trips WHERE id = $1",
        )
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        row.map(TripRow::into_trip).transpose()
    }

    async fn list(&self) -> SchedulingResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, TripRow>(
            "SELECT id, start_location, end_location, start_time, end_time, status
             FROM trips ORDER BY start_time DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        rows.into_iter().map(TripRow::into_trip).collect()
    }
}
