use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use super::{PanelConfig, PanelError};

/// Dynamic panels, one pretty-printed JSON file per panel.
#[derive(Debug, Clone)]
pub struct PanelStore {
    dir: PathBuf,
}

impl PanelStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: data_dir.as_ref().join("panels"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// All stored panels, ordered by id. Unreadable files are skipped.
    pub async fn list(&self) -> Result<Vec<PanelConfig>, PanelError> {
        fs::create_dir_all(&self.dir).await?;

        let mut panels = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_panel(&path).await {
                Ok(panel) => panels.push(panel),
                Err(e) => warn!("Skipping panel file {}: {}", path.display(), e),
            }
        }

        panels.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(panels)
    }

    pub async fn get(&self, id: &str) -> Result<Option<PanelConfig>, PanelError> {
        let path = self.path_for(id)?;
        match read_panel(&path).await {
            Ok(panel) => Ok(Some(panel)),
            Err(PanelError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create or replace a panel.
    pub async fn save(&self, panel: &PanelConfig) -> Result<(), PanelError> {
        let path = self.path_for(&panel.id)?;
        fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_string_pretty(panel)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        debug!(panel_id = %panel.id, "Panel saved");
        Ok(())
    }

    /// Delete a panel. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> Result<bool, PanelError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, PanelError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PanelError::InvalidId(id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

async fn read_panel(path: &Path) -> Result<PanelConfig, PanelError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn panel(id: &str) -> PanelConfig {
        PanelConfig {
            id: id.to_string(),
            theme: None,
            buttons: Vec::new(),
            selects: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_save_get_list_remove() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::new(dir.path());

        store.save(&panel("b")).await.unwrap();
        store.save(&panel("a")).await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), Some(panel("a")));
        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(store.remove("a").await.unwrap());
        assert!(!store.remove("a").await.unwrap());
        assert!(store.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_on_fresh_dir_is_empty_and_skips_garbage() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::new(dir.path());
        assert!(store.list().await.unwrap().is_empty());

        std::fs::write(store.dir().join("broken.json"), "{").unwrap();
        std::fs::write(store.dir().join("notes.txt"), "ignored").unwrap();
        store.save(&panel("ok")).await.unwrap();

        let panels = store.list().await.unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].id, "ok");
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::new(dir.path());

        assert!(matches!(
            store.save(&panel("../escape")).await,
            Err(PanelError::InvalidId(_))
        ));
        assert!(matches!(store.get("").await, Err(PanelError::InvalidId(_))));
    }
}
