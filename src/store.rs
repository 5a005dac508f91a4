use crate::diff::Snapshot;
use crate::domain::{ChannelId, PortalUrl, UserId};
use crate::error::PersistenceError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const DEFAULT_URL: &str = "https://www.usherbrooke.ca/genote/application/etudiant/cours.php";
const DEFAULT_FORM_ID: &str = "authentification";
const DEFAULT_LOOP_TIME: u64 = 180;
const DEFAULT_ANNOUNCEMENT_CHANNEL: &str = "355384548671881220";

/// Everything the watcher persists: portal access, schedule, delivery targets
/// and the last snapshot. Always written as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub url: PortalUrl,
    pub form_id: String,
    pub login: String,
    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub password: SecretString,
    pub last_save: Snapshot,
    /// Seconds between two cycles, before jitter.
    pub loop_time: u64,
    pub announcement_channel: ChannelId,
    /// Users that opted into direct messages.
    pub notifs: BTreeSet<UserId>,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            url: PortalUrl::new(DEFAULT_URL).expect("default portal url is valid"),
            form_id: DEFAULT_FORM_ID.to_string(),
            login: String::new(),
            password: SecretString::from(String::new()),
            last_save: Snapshot::default(),
            loop_time: DEFAULT_LOOP_TIME,
            announcement_channel: ChannelId::new(DEFAULT_ANNOUNCEMENT_CHANNEL)
                .expect("default channel id is valid"),
            notifs: BTreeSet::new(),
        }
    }
}

fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(SecretString::from(s))
}

/// Owner of the persisted [`Record`].
///
/// Reads hand out clones. Every mutation goes through [`ConfigStore::update`],
/// which applies the change to a copy, overwrites the whole file, and only
/// then publishes the copy. A failed write leaves both memory and disk on the
/// previous record.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    record: Mutex<Record>,
}

impl ConfigStore {
    /// Opens the record at `path`, writing the default record first when the
    /// file is missing or unreadable.
    pub async fn load_or_init(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let record = match read_record(&path).await {
            Ok(record) => {
                info!(path = %path.display(), "loaded configuration record");
                record
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "no usable configuration, writing default");
                let record = Record::default();
                write_record(&path, &record).await?;
                record
            }
        };
        Ok(Self {
            path,
            record: Mutex::new(record),
        })
    }

    /// In-memory store for tests and dry runs; `update` still writes to `path`.
    pub fn with_record(path: impl AsRef<Path>, record: Record) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            record: Mutex::new(record),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn current(&self) -> Record {
        self.record.lock().await.clone()
    }

    /// Full-record read-modify-write.
    pub async fn update<F, T>(&self, mutate: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut Record) -> T,
    {
        let mut guard = self.record.lock().await;
        let mut next = guard.clone();
        let output = mutate(&mut next);
        write_record(&self.path, &next).await?;
        *guard = next;
        Ok(output)
    }
}

pub async fn read_record(path: &Path) -> Result<Record, PersistenceError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PersistenceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes next to the target, then renames over it, so readers never see a
/// half-written record.
pub async fn write_record(path: &Path, record: &Record) -> Result<(), PersistenceError> {
    let bytes = serde_json::to_vec_pretty(record).map_err(PersistenceError::Encode)?;
    let write_error = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await.map_err(write_error)?;
    tokio::fs::rename(&tmp, path).await.map_err(write_error)?;
    debug!(path = %path.display(), bytes = bytes.len(), "record persisted");
    Ok(())
}
