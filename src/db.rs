use anyhow::Context;
use futures::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use crate::error::AppError;
use crate::tenant::SchemaName;

/// Pool wrapper that is the sole storage gateway for the engines: every
/// query they issue runs inside a transaction scoped to one tenant
/// partition via [`TenantDb::run_scoped`].
#[derive(Clone)]
pub struct TenantDb {
    pool: PgPool,
}

impl TenantDb {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs `work` inside one transaction bound to `schema`.
    ///
    /// `SET LOCAL search_path` scopes the partition to this transaction
    /// only, so the pooled connection carries nothing over to its next
    /// checkout. Commit happens iff `work` returns Ok; any error rolls
    /// back every statement `work` issued.
    ///
    /// Failure mapping: begin/commit failures surface as `Storage` (writes
    /// are not durable, caller may retry the whole unit); a search_path
    /// failure surfaces as `TenantScope` and fails closed.
    pub async fn run_scoped<T, F>(&self, schema: &SchemaName, work: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, AppError>> + Send,
    {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("SET LOCAL search_path TO {}", schema.quoted()))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::TenantScope(format!("failed to set search_path: {e}")))?;

        match work(&mut *tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                // Explicit rollback; dropping the transaction would do the
                // same, but the error path should not look accidental.
                tx.rollback().await.ok();
                Err(e)
            }
        }
    }
}
