//! Whole-document storage for the ticket index.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{IndexError, TicketRecord};

/// Durable storage for the full ordered set of ticket records.
///
/// There is no partial update at this layer; callers go through the
/// mutation queue for read-modify-write cycles.
pub trait IndexStore: Send + Sync {
    /// Read every record. An index that was never written reads as empty.
    fn read(&self) -> Result<Vec<TicketRecord>, IndexError>;

    /// Replace the whole index with `records`.
    fn write(&self, records: &[TicketRecord]) -> Result<(), IndexError>;
}

/// JSON file index at `<data_dir>/tickets/index.json`.
pub struct JsonIndexStore {
    path: PathBuf,
}

impl JsonIndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the conventional location under `data_dir`.
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("tickets").join("index.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path
            .with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()))
    }
}

impl IndexStore for JsonIndexStore {
    fn read(&self) -> Result<Vec<TicketRecord>, IndexError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&data)?)
    }

    fn write(&self, records: &[TicketRecord]) -> Result<(), IndexError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(records)?;

        // temp file + rename: readers in other processes never see a torn
        // document, and each writer renames only its own temp file
        let temp_path = self.temp_path();
        let written =
            write_synced(&temp_path, &data).and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
