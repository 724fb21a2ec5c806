//! 设备内存实现
//!
//! 仅用于本地测试和占位。

use crate::error::StorageError;
use crate::models::DeviceRecord;
use crate::traits::DeviceStore;
use crate::validation::ensure_device_id;
use std::collections::HashMap;
use std::sync::RwLock;

/// 设备内存存储
pub struct InMemoryDeviceStore {
    devices: RwLock<HashMap<String, DeviceRecord>>,
}

impl InMemoryDeviceStore {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// 预置设备（测试与本地演示用）
    pub fn with_devices(records: Vec<DeviceRecord>) -> Self {
        let devices = records
            .into_iter()
            .map(|record| (record.device_id.clone(), record))
            .collect();
        Self {
            devices: RwLock::new(devices),
        }
    }
}

impl Default for InMemoryDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError> {
        let devices = self
            .devices
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(devices.get(device_id).cloned())
    }

    async fn create_device(&self, record: DeviceRecord) -> Result<DeviceRecord, StorageError> {
        ensure_device_id(&record.device_id)?;
        let mut devices = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if devices.contains_key(&record.device_id) {
            return Err(StorageError::conflict("device already exists"));
        }
        devices.insert(record.device_id.clone(), record.clone());
        Ok(record)
    }

    async fn update_mute_state(
        &self,
        device_id: &str,
        muted_sensors: &[String],
        mute_ends_at_ms: Option<i64>,
    ) -> Result<Option<DeviceRecord>, StorageError> {
        let mut devices = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(record) = devices.get_mut(device_id) else {
            return Ok(None);
        };
        record.muted_sensors = muted_sensors.to_vec();
        record.mute_ends_at_ms = mute_ends_at_ms;
        Ok(Some(record.clone()))
    }
}
