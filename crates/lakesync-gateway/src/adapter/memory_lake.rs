//! In-memory object-store adapter.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use lakesync_core::errors::{AdapterError, SyncResult};
use lakesync_core::traits::adapter::LakeAdapter;

/// A lake adapter over an ordered in-memory object map.
#[derive(Default)]
pub struct MemoryLakeAdapter {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryLakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LakeAdapter for MemoryLakeAdapter {
    async fn put_object(&self, key: &str, bytes: &[u8]) -> SyncResult<()> {
        self.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> SyncResult<Vec<u8>> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| {
                AdapterError::ObjectNotFound {
                    key: key.to_string(),
                }
                .into()
            })
    }

    async fn list_objects(&self, prefix: &str) -> SyncResult<Vec<String>> {
        Ok(self
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_object(&self, key: &str) -> SyncResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_list_delete() {
        let lake = MemoryLakeAdapter::new();
        lake.put_object("deltas/g1/100.bin", b"abc").await.unwrap();
        lake.put_object("deltas/g1/200.bin", b"def").await.unwrap();
        lake.put_object("deltas/g2/100.bin", b"ghi").await.unwrap();

        assert_eq!(lake.get_object("deltas/g1/100.bin").await.unwrap(), b"abc");
        let listed = lake.list_objects("deltas/g1/").await.unwrap();
        assert_eq!(listed, vec!["deltas/g1/100.bin", "deltas/g1/200.bin"]);

        lake.delete_object("deltas/g1/100.bin").await.unwrap();
        assert!(lake.get_object("deltas/g1/100.bin").await.is_err());
    }
}
