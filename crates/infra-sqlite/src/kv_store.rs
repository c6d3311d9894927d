// SQLite KeyValueStore Implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jobsweep_core::error::{AppError, Result};
use jobsweep_core::port::{KeyValueStore, TimeProvider};
use sqlx::SqlitePool;
use tracing::warn;

/// Settings area
pub const AREA_SYNC: &str = "sync";
/// Job URL cache area
pub const AREA_LOCAL: &str = "local";

// Helper to convert sqlx::Error to AppError with structured information
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "5" => AppError::Storage(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                "13" => AppError::Storage(format!("Database full: {}", db_err.message())),
                other => AppError::Storage(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            },
            None => AppError::Storage(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::PoolTimedOut => AppError::Storage("Connection pool timed out".to_string()),
        _ => AppError::Storage(err.to_string()),
    }
}

/// One storage area backed by the shared `kv_entries` table
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
    area: String,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteKeyValueStore {
    pub fn new(pool: SqlitePool, area: &str, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            area: area.to_string(),
            time_provider,
        }
    }

    pub fn area(&self) -> &str {
        &self.area
    }
}

fn decode(key: &str, raw: &str) -> Result<serde_json::Value> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Storage(format!("Stored value for {} is not JSON: {}", key, e)))
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT value FROM kv_entries WHERE area = ? AND key = ?")
                .bind(&self.area)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        raw.map(|raw| decode(key, &raw)).transpose()
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (area, key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(area, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.area)
        .bind(key)
        .bind(value.to_string())
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE area = ? AND key = ?")
            .bind(&self.area)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for key in keys {
            sqlx::query("DELETE FROM kv_entries WHERE area = ? AND key = ?")
                .bind(&self.area)
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_all(&self) -> Result<HashMap<String, serde_json::Value>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM kv_entries WHERE area = ?")
                .bind(&self.area)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        // A bad row must not hide the rest of the area; it surfaces as a JSON string
        Ok(rows
            .into_iter()
            .map(|(key, raw)| {
                let value = serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!(area = %self.area, key = %key, error = %e, "Stored value is not JSON");
                    serde_json::Value::String(raw)
                });
                (key, value)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use jobsweep_core::port::time_provider::mocks::MockTimeProvider;
    use serde_json::json;

    async fn setup() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn store(pool: &SqlitePool, area: &str) -> SqliteKeyValueStore {
        SqliteKeyValueStore::new(pool.clone(), area, Arc::new(MockTimeProvider::new(1_000)))
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let pool = setup().await;
        let kv = store(&pool, AREA_SYNC);

        assert_eq!(kv.get("enabled").await.unwrap(), None);

        kv.set("enabled", json!(true)).await.unwrap();
        kv.set("enabled", json!(false)).await.unwrap();
        assert_eq!(kv.get("enabled").await.unwrap(), Some(json!(false)));

        kv.set("jobs_company_blacklist", json!(["acme", "globex"]))
            .await
            .unwrap();
        assert_eq!(
            kv.get("jobs_company_blacklist").await.unwrap(),
            Some(json!(["acme", "globex"]))
        );
    }

    #[tokio::test]
    async fn test_areas_are_isolated() {
        let pool = setup().await;
        let sync = store(&pool, AREA_SYNC);
        let local = store(&pool, AREA_LOCAL);

        sync.set("k", json!(1)).await.unwrap();
        local.set("k", json!(2)).await.unwrap();

        assert_eq!(sync.get("k").await.unwrap(), Some(json!(1)));
        assert_eq!(local.get("k").await.unwrap(), Some(json!(2)));

        local.remove("k").await.unwrap();
        assert_eq!(local.get("k").await.unwrap(), None);
        assert_eq!(sync.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_many_and_get_all() {
        let pool = setup().await;
        let kv = store(&pool, AREA_LOCAL);

        for id in ["1", "2", "3"] {
            kv.set(&format!("job_{}", id), json!({ "jobId": id }))
                .await
                .unwrap();
        }

        kv.remove_many(&["job_1".to_string(), "job_3".to_string(), "job_9".to_string()])
            .await
            .unwrap();
        kv.remove_many(&[]).await.unwrap();

        let all = kv.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all["job_2"], json!({ "jobId": "2" }));
    }

    #[tokio::test]
    async fn test_updated_at_from_time_provider() {
        let pool = setup().await;
        let kv = store(&pool, AREA_SYNC);
        kv.set("feed_hide", json!(true)).await.unwrap();

        let updated_at: i64 =
            sqlx::query_scalar("SELECT updated_at FROM kv_entries WHERE key = 'feed_hide'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(updated_at, 1_000);
    }

    #[tokio::test]
    async fn test_non_json_row_is_storage_error_on_get() {
        let pool = setup().await;
        sqlx::query("INSERT INTO kv_entries VALUES ('local', 'job_x', 'not json', 0)")
            .execute(&pool)
            .await
            .unwrap();
        let kv = store(&pool, AREA_LOCAL);

        assert!(matches!(kv.get("job_x").await, Err(AppError::Storage(_))));
        assert_eq!(kv.get_all().await.unwrap()["job_x"], json!("not json"));
    }

    #[tokio::test]
    async fn test_closed_pool_maps_to_storage_error() {
        let pool = setup().await;
        let kv = store(&pool, AREA_SYNC);
        pool.close().await;

        assert!(matches!(kv.get("enabled").await, Err(AppError::Storage(_))));
    }
}
