//! Repositorio de DayOffRequests
//!
//! Ledger de ausencias por conductor. El solapamiento entre solicitudes se
//! verifica aquí de forma defensiva, independiente del detector de
//! conflictos que vigila los trips.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::day_off::{DayOffRequest, DayOffStatus};
use crate::utils::errors::{SchedulingError, SchedulingResult};

/// Contrato sobre la tabla driver_day_offs
#[async_trait]
pub trait DayOffLedger: Send + Sync {
    /// Crea la solicitud en estado PENDING
    async fn create(
        &self,
        driver_id: i32,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        reason: Option<String>,
    ) -> SchedulingResult<DayOffRequest>;

    async fn get(&self, request_id: i32) -> SchedulingResult<Option<DayOffRequest>>;

    async fn set_status(
        &self,
        request_id: i32,
        status: DayOffStatus,
    ) -> SchedulingResult<DayOffRequest>;

    /// true si el conductor ya tiene una solicitud PENDING o APPROVED cuyo
    /// intervalo se solapa con [start, end)
    async fn active_or_pending_overlap(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<bool>;

    /// true si un día libre APPROVED cubre el instante (half-open [start, end))
    async fn approved_covering(&self, driver_id: i32, at: DateTime<Utc>)
        -> SchedulingResult<bool>;

    async fn list_for_driver(&self, driver_id: i32) -> SchedulingResult<Vec<DayOffRequest>>;
}

#[derive(Debug, sqlx::FromRow)]
struct DayOffRow {
    id: i32,
    driver_id: i32,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    reason: Option<String>,
}

impl DayOffRow {
    fn into_request(self) -> SchedulingResult<DayOffRequest> {
        Ok(DayOffRequest {
            id: self.id,
            driver_id: self.driver_id,
            start_date: self.start_date,
            end_date: self.end_date,
            status: DayOffStatus::parse(&self.status)?,
            reason: self.reason,
        })
    }
}

pub struct PgDayOffRepository {
    pool: PgPool,
}

impl PgDayOffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DayOffLedger for PgDayOffRepository {
    async fn create(
        &self,
        driver_id: i32,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        reason: Option<String>,
    ) -> SchedulingResult<DayOffRequest> {
        let row = sqlx::query_as::<_, DayOffRow>(
            "INSERT INTO driver_day_offs (driver_id, start_date, end_date, status, reason)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, driver_id, start_date, end_date, status, reason",
        )
        .bind(driver_id)
        .bind(start_date)
        .bind(end_date)
        .bind(DayOffStatus::Pending.as_str())
        .bind(reason)
        .fetch_one(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        row.into_request()
    }

    async fn get(&self, request_id: i32) -> SchedulingResult<Option<DayOffRequest>> {
        let row = sqlx::query_as::<_, DayOffRow>(
            "SELECT id, driver_id, start_date, end_date, status, reason
             FROM driver_day_offs WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        row.map(DayOffRow::into_request).transpose()
    }

    async fn set_status(
        &self,
        request_id: i32,
        status: DayOffStatus,
    ) -> SchedulingResult<DayOffRequest> {
        let row = sqlx::query_as::<_, DayOffRow>(
            "UPDATE driver_day_offs SET status = $2 WHERE id = $1
             RETURNING id, driver_id, start_date, end_date, status, reason",
        )
        .bind(request_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(SchedulingError::Database)?
        .ok_or(SchedulingError::RequestNotFound(request_id))?;

        row.into_request()
    }

    async fn active_or_pending_overlap(
        &self,
        driver_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM driver_day_offs
                WHERE driver_id = $1
                  AND status IN ('PENDING', 'APPROVED')
                  AND start_date < $3
                  AND end_date > $2
             )",
        )
        .bind(driver_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        Ok(result.0)
    }

    async fn approved_covering(
        &self,
        driver_id: i32,
        at: DateTime<Utc>,
    ) -> SchedulingResult<bool> {
        let result: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                SELECT 1 FROM driver_day_offs
                WHERE driver_id = $1
                  AND status = 'APPROVED'
                  AND start_date <= $2
                  AND end_date > $2
             )",
        )
        .bind(driver_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        Ok(result.0)
    }

    async fn list_for_driver(&self, driver_id: i32) -> SchedulingResult<Vec<DayOffRequest>> {
        let rows = sqlx::query_as::<_, DayOffRow>(
            "SELECT id, driver_id, start_date, end_date, status, reason
             FROM driver_day_offs WHERE driver_id = $1
             ORDER BY start_date DESC",
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        rows.into_iter().map(DayOffRow::into_request).collect()
    }
}
