//! Repositorio de Drivers
//!
//! La identidad del conductor es propiedad del subsistema de HR; aquí solo
//! se resuelve existencia e identidad mínima para el coordinador.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::driver::Driver;
use crate::utils::errors::{SchedulingError, SchedulingResult};

#[async_trait]
pub trait DriverDirectory: Send + Sync {
    async fn get(&self, driver_id: i32) -> SchedulingResult<Option<Driver>>;

    async fn exists(&self, driver_id: i32) -> SchedulingResult<bool> {
        Ok(self.get(driver_id).await?.is_some())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DriverRow {
    id: i32,
    full_name: String,
}

pub struct PgDriverRepository {
    pool: PgPool,
}

impl PgDriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverDirectory for PgDriverRepository {
    async fn get(&self, driver_id: i32) -> SchedulingResult<Option<Driver>> {
        let row = sqlx::query_as::<_, DriverRow>(
            "SELECT id, full_name FROM drivers WHERE id = $1",
        )
        .bind(driver_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(SchedulingError::Database)?;

        Ok(row.map(|r| Driver {
            id: r.id,
            full_name: r.full_name,
        }))
    }

    async fn exists(&self, driver_id: i32) -> SchedulingResult<bool> {
        let result: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM drivers WHERE id = $1)")
                .bind(driver_id)
                .fetch_one(&self.pool)
                .await
                .map_err(SchedulingError::Database)?;

        Ok(result.0)
    }
}
