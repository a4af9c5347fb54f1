use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::ledger::activity::Activity;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access the activity document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode the activity document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Interface for durable load/save of the full activity collection.
/// `save` always receives the complete current collection, never a delta.
pub trait ActivityStore {
    fn load(&self) -> impl Future<Output = Result<Vec<Activity>, StoreError>> + Send;

    fn save(&self, activities: &[Activity]) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: Deref> ActivityStore for T
where
    T::Target: ActivityStore,
{
    fn load(&self) -> impl Future<Output = Result<Vec<Activity>, StoreError>> + Send {
        self.deref().load()
    }

    fn save(&self, activities: &[Activity]) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.deref().save(activities)
    }
}

/// File-backed store: the whole collection lives in one JSON document.
/// Concurrent sessions are last-write-wins at the granularity of a full save.
pub struct JsonActivityStore {
    path: PathBuf,
}

impl JsonActivityStore {
    pub const FILE_NAME: &'static str = "activities.json";

    /// Creates the data directory if needed and points the store at the
    /// activity document inside it.
    pub fn new(data_dir: &Path) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(data_dir)?;

        Ok(Self {
            path: data_dir.join(Self::FILE_NAME),
        })
    }

    async fn read_document(path: &Path) -> Result<String, std::io::Error> {
        debug!("Reading activity document {path:?}");
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut contents = String::new();
        let result = file.read_to_string(&mut contents).await;
        file.unlock_async().await?;
        result?;
        Ok(contents)
    }

    fn scratch_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    async fn write_document(file: &mut File, buffer: &[u8]) -> Result<(), std::io::Error> {
        file.write_all(buffer).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}

impl ActivityStore for JsonActivityStore {
    async fn load(&self) -> Result<Vec<Activity>, StoreError> {
        let contents = match Self::read_document(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Vec<Activity>>(&contents) {
            Ok(activities) => Ok(activities),
            Err(e) => {
                // A torn write or hand-edited file must not take the
                // application down. Start over from an empty collection.
                warn!(
                    "Activity document {:?} is malformed, starting empty: {e}",
                    self.path
                );
                Ok(vec![])
            }
        }
    }

    async fn save(&self, activities: &[Activity]) -> Result<(), StoreError> {
        let buffer = serde_json::to_vec_pretty(activities)?;

        // The new document goes to a scratch file first and is renamed over
        // the live one, so an interrupted save never leaves a truncated or
        // torn activities.json behind.
        let scratch = self.scratch_path();
        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&scratch)
            .await?;

        // Semi-safe acquire-release for the file
        file.lock_exclusive()?;
        let result = Self::write_document(&mut file, &buffer).await;
        file.unlock_async().await?;
        result?;
        drop(file);

        tokio::fs::rename(&scratch, &self.path).await?;
        Ok(())
    }
}
