//! Postgres 设备实现

use crate::error::StorageError;
use crate::models::DeviceRecord;
use crate::traits::DeviceStore;
use crate::validation::ensure_device_id;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgDeviceStore {
    pub pool: PgPool,
}

impl PgDeviceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const DEVICE_COLUMNS: &str = "device_id, name, secret_key, is_active, muted_sensors, \
     (extract(epoch from mute_ends_at) * 1000)::bigint as mute_ends_at_ms, \
     (extract(epoch from created_at) * 1000)::bigint as created_at_ms";

fn device_from_row(row: &PgRow) -> Result<DeviceRecord, StorageError> {
    Ok(DeviceRecord {
        device_id: row.try_get("device_id")?,
        name: row.try_get("name")?,
        secret_key: row.try_get("secret_key")?,
        is_active: row.try_get("is_active")?,
        muted_sensors: row.try_get("muted_sensors")?,
        mute_ends_at_ms: row.try_get("mute_ends_at_ms")?,
        created_at_ms: row.try_get("created_at_ms")?,
    })
}

#[async_trait::async_trait]
impl DeviceStore for PgDeviceStore {
    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError> {
        let sql = format!("select {DEVICE_COLUMNS} from devices where device_id = $1");
        let row = sqlx::query(&sql)
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(device_from_row).transpose()
    }

    async fn create_device(&self, record: DeviceRecord) -> Result<DeviceRecord, StorageError> {
        ensure_device_id(&record.device_id)?;
        sqlx::query(
            "insert into devices \
             (device_id, name, secret_key, is_active, muted_sensors, mute_ends_at, created_at) \
             values ($1, $2, $3, $4, $5, to_timestamp($6 / 1000.0), to_timestamp($7 / 1000.0))",
        )
        .bind(&record.device_id)
        .bind(&record.name)
        .bind(&record.secret_key)
        .bind(record.is_active)
        .bind(&record.muted_sensors)
        .bind(record.mute_ends_at_ms.map(|value| value as f64))
        .bind(record.created_at_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn update_mute_state(
        &self,
        device_id: &str,
        muted_sensors: &[String],
        mute_ends_at_ms: Option<i64>,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        let sql = format!(
            "update devices set muted_sensors = $2, mute_ends_at = to_timestamp($3 / 1000.0) \
             where device_id = $1 \
             returning {DEVICE_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(device_id)
            .bind(muted_sensors)
            .bind(mute_ends_at_ms.map(|value| value as f64))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(device_from_row).transpose()
    }
}
