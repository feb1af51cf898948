//! Photo persistence: a flat key-value namespace of `"<lng>,<lat>"` keys
//! mapping to `data:` URLs. Writing an existing key overwrites it.

use tracing::warn;

use crate::config::CONFIG_STORAGE_KEY;
use crate::dataurl;
use crate::error::{StorageError, js_error_text};
use crate::model::{PhotoKey, PhotoRecord};

pub trait PhotoStore {
    fn put(&mut self, record: &PhotoRecord) -> Result<(), StorageError>;
    fn get(&self, key: &PhotoKey) -> Result<Option<PhotoRecord>, StorageError>;
    /// Every photo record, skipping keys that do not look like coordinates
    /// and values that are not decodable data urls.
    fn list(&self) -> Result<Vec<PhotoRecord>, StorageError>;
}

fn is_photo_key(key: &str) -> bool {
    key != CONFIG_STORAGE_KEY && PhotoKey(key.to_string()).lat_lng().is_some()
}

fn checked(record: PhotoRecord) -> Result<PhotoRecord, StorageError> {
    dataurl::decode(&record.data_url)
        .map_err(|e| StorageError::Corrupt(format!("{}: {}", record.key, e)))?;
    Ok(record)
}

fn keep_valid(records: &mut Vec<PhotoRecord>, record: PhotoRecord) {
    match checked(record) {
        Ok(record) => records.push(record),
        Err(e) => warn!(error = %e, "skipping unreadable photo"),
    }
}

/// Backed by `window.localStorage`.
#[derive(Debug, Clone)]
pub struct LocalStoragePhotoStore {
    storage: web_sys::Storage,
}

impl LocalStoragePhotoStore {
    pub fn open() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .ok_or(StorageError::Unavailable)?
            .local_storage()
            .map_err(|e| StorageError::Read(js_error_text(&e)))?
            .ok_or(StorageError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl PhotoStore for LocalStoragePhotoStore {
    fn put(&mut self, record: &PhotoRecord) -> Result<(), StorageError> {
        self.storage
            .set_item(record.key.as_str(), &record.data_url)
            .map_err(|e| StorageError::Write {
                key: record.key.to_string(),
                reason: js_error_text(&e),
            })
    }

    fn get(&self, key: &PhotoKey) -> Result<Option<PhotoRecord>, StorageError> {
        let value = self
            .storage
            .get_item(key.as_str())
            .map_err(|e| StorageError::Read(js_error_text(&e)))?;
        Ok(value.map(|data_url| PhotoRecord {
            key: key.clone(),
            data_url,
        }))
    }

    fn list(&self) -> Result<Vec<PhotoRecord>, StorageError> {
        let len = self
            .storage
            .length()
            .map_err(|e| StorageError::Read(js_error_text(&e)))?;
        let mut records = Vec::new();
        for i in 0..len {
            let Some(key) = self
                .storage
                .key(i)
                .map_err(|e| StorageError::Read(js_error_text(&e)))?
            else {
                continue;
            };
            if !is_photo_key(&key) {
                warn!(key = %key, "skipping non-photo storage entry");
                continue;
            }
            if let Some(record) = self.get(&PhotoKey(key))? {
                keep_valid(&mut records, record);
            }
        }
        Ok(records)
    }
}

/// Non-persistent store with an optional byte quota, used by tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct InMemoryPhotoStore {
    entries: std::collections::BTreeMap<String, String>,
    /// Rejects writes whose total payload would exceed this many bytes.
    quota: Option<usize>,
}

#[cfg(test)]
impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw insert, bypassing the quota (for seeding foreign keys).
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

#[cfg(test)]
impl PhotoStore for InMemoryPhotoStore {
    fn put(&mut self, record: &PhotoRecord) -> Result<(), StorageError> {
        let key = record.key.as_str();
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + record.data_url.len();
            if needed > quota {
                return Err(StorageError::Write {
                    key: key.to_string(),
                    reason: "QuotaExceededError".to_string(),
                });
            }
        }
        self.entries
            .insert(key.to_string(), record.data_url.clone());
        Ok(())
    }

    fn get(&self, key: &PhotoKey) -> Result<Option<PhotoRecord>, StorageError> {
        Ok(self.entries.get(key.as_str()).map(|data_url| PhotoRecord {
            key: key.clone(),
            data_url: data_url.clone(),
        }))
    }

    fn list(&self) -> Result<Vec<PhotoRecord>, StorageError> {
        let mut records = Vec::new();
        for (k, v) in self.entries.iter().filter(|(k, _)| is_photo_key(k)) {
            let record = PhotoRecord {
                key: PhotoKey(k.clone()),
                data_url: v.clone(),
            };
            keep_valid(&mut records, record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_URL: &str = "data:image/jpeg;base64,/9j/";

    fn record(key: &str, data: &str) -> PhotoRecord {
        PhotoRecord {
            key: PhotoKey(key.to_string()),
            data_url: data.to_string(),
        }
    }

    #[test]
    fn same_coordinates_overwrite() {
        let mut store = InMemoryPhotoStore::new();
        store.put(&record("9.744844,47.406653", "data:a")).unwrap();
        store.put(&record("9.744844,47.406653", "data:b")).unwrap();
        assert_eq!(store.len(), 1);
        let got = store
            .get(&PhotoKey("9.744844,47.406653".into()))
            .unwrap()
            .unwrap();
        assert_eq!(got.data_url, "data:b");
    }

    #[test]
    fn distinct_strings_are_distinct_records() {
        let mut store = InMemoryPhotoStore::new();
        store.put(&record("9.744844,47.406653", JPEG_URL)).unwrap();
        store.put(&record("9.7448440,47.406653", JPEG_URL)).unwrap();
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn list_skips_config_and_foreign_keys() {
        let mut store = InMemoryPhotoStore::new();
        store.insert_raw(CONFIG_STORAGE_KEY, "{}");
        store.insert_raw("md_research", "12");
        store.put(&record("1.5,2.5", JPEG_URL)).unwrap();
        let keys: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.key.0)
            .collect();
        assert_eq!(keys, vec!["1.5,2.5".to_string()]);
    }

    #[test]
    fn list_skips_undecodable_values() {
        let mut store = InMemoryPhotoStore::new();
        store.insert_raw("1.5,2.5", "not a data url");
        store.insert_raw("3.5,4.5", "data:image/jpeg;base64,@@@");
        store.put(&record("5.5,6.5", JPEG_URL)).unwrap();
        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.as_str(), "5.5,6.5");
    }

    #[test]
    fn corrupt_value_names_its_key() {
        let err = checked(record("1.5,2.5", "blob:abc")).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(ref msg) if msg.starts_with("1.5,2.5")));
    }

    #[test]
    fn quota_rejects_oversized_write() {
        let mut store = InMemoryPhotoStore::with_quota(16);
        let err = store
            .put(&record("1.5,2.5", "data:image/jpeg;base64,AAAA"))
            .unwrap_err();
        assert!(matches!(err, StorageError::Write { ref key, .. } if key == "1.5,2.5"));
        assert!(store.is_empty());
    }
}
