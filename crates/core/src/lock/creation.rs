use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use rand::Rng;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LockConfig;
use crate::metrics;

use super::{LockError, LOCK_FILE_NAME};

/// Tunables for lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSettings {
    /// Tokens older than this are considered abandoned.
    pub stale_after: Duration,
    pub max_attempts: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self::from(&LockConfig::default())
    }
}

impl From<&LockConfig> for LockSettings {
    fn from(config: &LockConfig) -> Self {
        Self {
            stale_after: Duration::from_millis(config.stale_after_ms),
            max_attempts: config.max_attempts,
            backoff_min: Duration::from_millis(config.backoff_min_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }
}

/// Proof of a successful acquisition. Pass it back to [`CreationLock::release`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    owner: String,
    payload: String,
}

impl LockToken {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Current holder of the lock file, as far as it can be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolder {
    /// `None` when the payload is unreadable (e.g. mid-write).
    pub owner: Option<String>,
    pub age: Duration,
}

/// File-based mutual exclusion for ticket creation across processes.
pub struct CreationLock {
    path: PathBuf,
    settings: LockSettings,
}

impl CreationLock {
    pub fn new(path: impl Into<PathBuf>, settings: LockSettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    /// Lock at `<data_dir>/ticket_creation.lock`.
    pub fn in_data_dir(data_dir: &Path, settings: LockSettings) -> Self {
        Self::new(data_dir.join(LOCK_FILE_NAME), settings)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &LockSettings {
        &self.settings
    }

    /// Acquire the lock for `owner`.
    ///
    /// Makes at most `max_attempts` attempts. A stale token is reclaimed and
    /// the next attempt follows immediately; a live one is waited out with
    /// a random backoff.
    pub async fn acquire(&self, owner: &str) -> Result<LockToken, LockError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let max_attempts = self.settings.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match self.try_create(owner).await {
                Ok(token) => {
                    debug!(owner = %owner, attempt, "Creation lock acquired");
                    metrics::LOCK_ACQUISITIONS
                        .with_label_values(&["acquired"])
                        .inc();
                    return Ok(token);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(LockError::Io(e)),
            }

            match self.observe().await? {
                // released between our create and our read
                None => continue,
                Some(seen) if seen.holder.age > self.settings.stale_after => {
                    match self.reclaim(&seen).await? {
                        Reclaim::Removed => {
                            info!(
                                holder = ?seen.holder.owner,
                                age_ms = seen.holder.age.as_millis() as u64,
                                "Reclaimed stale creation lock"
                            );
                            metrics::LOCK_ACQUISITIONS
                                .with_label_values(&["reclaimed"])
                                .inc();
                            continue;
                        }
                        // another acquirer moved it first
                        Reclaim::Vanished => continue,
                        Reclaim::Lost => {
                            debug!(
                                owner = %owner,
                                "Stale creation lock was replaced before reclaim"
                            );
                        }
                    }
                }
                Some(_) => {}
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.backoff()).await;
            }
        }

        warn!(owner = %owner, attempts = max_attempts, "Creation lock busy");
        metrics::LOCK_ACQUISITIONS.with_label_values(&["busy"]).inc();
        Err(LockError::Busy {
            attempts: max_attempts,
        })
    }

    /// Release a token obtained from [`acquire`](Self::acquire).
    ///
    /// The file is only removed while it still carries this token's payload;
    /// a token reclaimed and re-acquired by someone else is left alone. A
    /// missing file is not an error.
    pub async fn release(&self, token: &LockToken) -> Result<(), LockError> {
        let current = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(LockError::Io(e)),
        };

        if current.trim() != token.payload {
            warn!(
                owner = %token.owner,
                "Creation lock now belongs to another holder; not releasing"
            );
            return Ok(());
        }

        remove_if_present(&self.path).await?;
        debug!(owner = %token.owner, "Creation lock released");
        Ok(())
    }

    /// Describe the current holder, or `None` when the lock is free.
    pub async fn inspect(&self) -> Result<Option<LockHolder>, LockError> {
        Ok(self.observe().await?.map(|seen| seen.holder))
    }

    async fn observe(&self) -> Result<Option<Observed>, LockError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(LockError::Io(e)),
        };
        Ok(holder_of(&content, &self.path)
            .await?
            .map(|holder| Observed { content, holder }))
    }

    /// Take a stale token out of the way without touching a fresh one.
    ///
    /// The lock file is renamed to a private sibling first, so at most one
    /// reclaimer ends up with it. The sibling is deleted only when it is
    /// still the stale token `seen` described; anything else is put back.
    async fn reclaim(&self, seen: &Observed) -> Result<Reclaim, LockError> {
        let sibling = self.reclaim_path();
        match fs::rename(&self.path, &sibling).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Reclaim::Vanished),
            Err(e) => return Err(LockError::Io(e)),
        }

        let content = match fs::read_to_string(&sibling).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Reclaim::Vanished),
            Err(e) => return Err(LockError::Io(e)),
        };
        let still_stale = match holder_of(&content, &sibling).await? {
            Some(holder) => holder.age > self.settings.stale_after,
            None => false,
        };
        if content == seen.content && still_stale {
            remove_if_present(&sibling).await?;
            return Ok(Reclaim::Removed);
        }

        self.restore(&sibling).await?;
        Ok(Reclaim::Lost)
    }

    /// Put a token taken by a lost reclaim back in place.
    async fn restore(&self, sibling: &Path) -> Result<(), LockError> {
        // hard_link refuses to replace an existing lock file
        match fs::hard_link(sibling, &self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(
                    path = %self.path.display(),
                    "Creation lock re-acquired while restoring a live token"
                );
            }
            Err(_) => {
                fs::rename(sibling, &self.path).await?;
                return Ok(());
            }
        }
        remove_if_present(sibling).await
    }

    fn reclaim_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(LOCK_FILE_NAME);
        self.path
            .with_file_name(format!("{}.{}", name, Uuid::new_v4().simple()))
    }

    async fn try_create(&self, owner: &str) -> std::io::Result<LockToken> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await?;

        let payload = format!("{}:{}", owner, Utc::now().timestamp_millis());
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;

        Ok(LockToken {
            owner: owner.to_string(),
            payload,
        })
    }

    fn backoff(&self) -> Duration {
        let min = self.settings.backoff_min.as_millis() as u64;
        let max = (self.settings.backoff_max.as_millis() as u64).max(min);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

/// Lock file content together with what it says about the holder.
struct Observed {
    content: String,
    holder: LockHolder,
}

enum Reclaim {
    Removed,
    Vanished,
    Lost,
}

/// Holder described by `content`, read from the file at `path`.
async fn holder_of(content: &str, path: &Path) -> Result<Option<LockHolder>, LockError> {
    if let Some((owner, acquired_ms)) = parse_payload(content) {
        let now_ms = Utc::now().timestamp_millis();
        let age = Duration::from_millis(now_ms.saturating_sub(acquired_ms).max(0) as u64);
        return Ok(Some(LockHolder {
            owner: Some(owner.to_string()),
            age,
        }));
    }

    // payload not written yet or garbage: fall back to the file's mtime
    let age = match fs::metadata(path).await {
        Ok(meta) => meta
            .modified()
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default(),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(LockError::Io(e)),
    };
    Ok(Some(LockHolder { owner: None, age }))
}

fn parse_payload(content: &str) -> Option<(&str, i64)> {
    let (owner, millis) = content.trim().rsplit_once(':')?;
    let millis = millis.parse().ok()?;
    Some((owner, millis))
}

async fn remove_if_present(path: &Path) -> Result<(), LockError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LockError::Io(e)),
    }
}
