use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use time::OffsetDateTime;
use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed collection {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An entity kept in a flat JSON collection.
///
/// `New` carries the caller-supplied fields of a fresh record, `Patch` a sparse
/// set of changes. The store owns ids and timestamps.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type New: Send;
    type Patch: Send;

    fn id(&self) -> i64;
    fn build(id: i64, new: Self::New, now: OffsetDateTime) -> Self;
    /// Merge `patch` into the record and stamp `updated_at`.
    fn apply(&mut self, patch: Self::Patch, now: OffsetDateTime);
}

/// Whole-file JSON collection: every call reads the full array, and every
/// mutation rewrites it.
///
/// One mutex per file serializes read-modify-write cycles. It also holds the
/// highest id handed out so far, which is mirrored to a `.seq` sidecar file so
/// an id freed by deleting the newest record is not assigned again, across
/// restarts too.
pub struct JsonStore<T> {
    path: PathBuf,
    seq_path: PathBuf,
    high_water: Arc<Mutex<i64>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            seq_path: self.seq_path.clone(),
            high_water: Arc::clone(&self.high_water),
            _record: PhantomData,
        }
    }
}

impl<T: Record> JsonStore<T> {
    /// Open the collection at `path`, creating the parent directory and an
    /// empty array file when they are missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| write_error(dir, source))?;
        }
        let exists = fs::try_exists(&path)
            .await
            .map_err(|source| read_error(&path, source))?;
        if !exists {
            fs::write(&path, "[]")
                .await
                .map_err(|source| write_error(&path, source))?;
            debug!(path = %path.display(), "created empty collection");
        }

        let seq_path = path.with_extension("seq");
        let highest = read_collection::<T>(&path)
            .await?
            .iter()
            .map(Record::id)
            .max()
            .unwrap_or(0)
            .max(read_seq(&seq_path).await?);

        Ok(Self {
            path,
            seq_path,
            high_water: Arc::new(Mutex::new(highest)),
            _record: PhantomData,
        })
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn find_all(&self) -> Result<Vec<T>, StoreError> {
        let _guard = self.high_water.lock().await;
        read_collection(&self.path).await
    }

    pub async fn find_one(&self, id: i64) -> Result<Option<T>, StoreError> {
        self.find_first(|r| r.id() == id).await
    }

    /// First record in storage order matching `pred`.
    pub async fn find_first<F>(&self, pred: F) -> Result<Option<T>, StoreError>
    where
        F: Fn(&T) -> bool,
    {
        Ok(self.find_all().await?.into_iter().find(|r| pred(r)))
    }

    pub async fn create(&self, new: T::New) -> Result<T, StoreError> {
        let mut high_water = self.high_water.lock().await;
        let mut records = read_collection::<T>(&self.path).await?;

        let id = records
            .iter()
            .map(Record::id)
            .max()
            .unwrap_or(0)
            .max(*high_water)
            + 1;
        let record = T::build(id, new, OffsetDateTime::now_utc());
        records.push(record.clone());
        write_collection(&self.path, &records).await?;
        write_seq(&self.seq_path, id).await?;
        *high_water = id;

        debug!(path = %self.path.display(), id, "record created");
        Ok(record)
    }

    /// Returns `None` when no record has `id`; the file is left untouched.
    pub async fn update(&self, id: i64, patch: T::Patch) -> Result<Option<T>, StoreError> {
        let _guard = self.high_water.lock().await;
        let mut records = read_collection::<T>(&self.path).await?;

        let Some(record) = records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        record.apply(patch, OffsetDateTime::now_utc());
        let updated = record.clone();
        write_collection(&self.path, &records).await?;

        debug!(path = %self.path.display(), id, "record updated");
        Ok(Some(updated))
    }

    pub async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let _guard = self.high_water.lock().await;
        let mut records = read_collection::<T>(&self.path).await?;

        let Some(idx) = records.iter().position(|r| r.id() == id) else {
            return Ok(false);
        };
        records.remove(idx);
        write_collection(&self.path, &records).await?;

        debug!(path = %self.path.display(), id, "record removed");
        Ok(true)
    }
}

async fn read_collection<T: Record>(path: &Path) -> Result<Vec<T>, StoreError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "collection file missing; treating as empty");
            return Ok(Vec::new());
        }
        Err(source) => return Err(read_error(path, source)),
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_collection<T: Record>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let body = serde_json::to_string_pretty(records).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, body)
        .await
        .map_err(|source| write_error(path, source))
}

/// Highest id ever assigned; a missing sidecar means none recorded yet.
async fn read_seq(path: &Path) -> Result<i64, StoreError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(source) => return Err(read_error(path, source)),
    };
    if raw.trim().is_empty() {
        return Ok(0);
    }
    serde_json::from_str(raw.trim()).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_seq(path: &Path, id: i64) -> Result<(), StoreError> {
    fs::write(path, id.to_string())
        .await
        .map_err(|source| write_error(path, source))
}

fn read_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Write {
        path: path.to_path_buf(),
        source,
    }
}
