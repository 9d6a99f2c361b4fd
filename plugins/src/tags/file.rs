//! Tag store persisted as one JSON document:
//! `{tenant: {"replay#m": {"stub#s#e": {"tag_bugged": true}}}}`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use clipseek_core::api::{StoreError, TagKey, TagStore};
use clipseek_core::tags::tag_attribute;

type Attributes = BTreeMap<String, bool>;
type TagTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, Attributes>>>;

pub struct FileTagStore {
    path: PathBuf,
    table: Mutex<Option<TagTable>>,
}

impl FileTagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn key_name(&self) -> String {
        self.path.display().to_string()
    }

    async fn read_table(&self) -> Result<TagTable, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(TagTable::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                key: self.key_name(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(TagTable::new()),
            Err(source) => Err(StoreError::Io {
                key: self.key_name(),
                source,
            }),
        }
    }

    async fn write_table(&self, table: &TagTable) -> Result<(), StoreError> {
        let io = |source| StoreError::Io {
            key: self.key_name(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(table).map_err(|source| StoreError::Corrupt {
            key: self.key_name(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io)?;
        }
        let tmp = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes).await.map_err(io)?;
        if let Err(err) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io(err));
        }
        Ok(())
    }

    fn lookup(table: &TagTable, key: &TagKey, attribute: &str) -> Option<bool> {
        table
            .get(key.tenant.as_str())?
            .get(&key.partition())?
            .get(&key.sort())?
            .get(attribute)
            .copied()
    }
}

#[async_trait]
impl TagStore for FileTagStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_tag(&self, key: &TagKey, tag: &str) -> Result<Option<bool>, StoreError> {
        let mut guard = self.table.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_table().await?);
        }
        Ok(guard
            .as_ref()
            .and_then(|table| Self::lookup(table, key, &tag_attribute(tag))))
    }

    async fn set_tag(&self, key: &TagKey, tag: &str, value: bool) -> Result<bool, StoreError> {
        let mut guard = self.table.lock().await;
        let mut table = match guard.take() {
            Some(table) => table,
            None => self.read_table().await?,
        };
        let attribute = tag_attribute(tag);
        let previous = Self::lookup(&table, key, &attribute);
        table
            .entry(key.tenant.to_string())
            .or_default()
            .entry(key.partition())
            .or_default()
            .entry(key.sort())
            .or_default()
            .insert(attribute.clone(), value);

        let written = self.write_table(&table).await;
        if written.is_err() {
            // Keep memory in line with the file.
            let attrs = table
                .entry(key.tenant.to_string())
                .or_default()
                .entry(key.partition())
                .or_default()
                .entry(key.sort())
                .or_default();
            match previous {
                Some(old) => attrs.insert(attribute, old),
                None => attrs.remove(&attribute),
            };
        }
        *guard = Some(table);
        written?;
        Ok(value)
    }
}
