use std::path::{Path, PathBuf};

use packhub_types::Pack;
use tracing::warn;

use crate::ClientError;

/// Local pack storage: one JSON file per pack under `<root>/packs`, plus an
/// installed-ids list at `<root>/installed.json`.
pub struct LocalStore {
    packs_dir: PathBuf,
    installed_path: PathBuf,
}

impl LocalStore {
    pub fn open(root: &Path) -> Result<Self, ClientError> {
        let packs_dir = root.join("packs");
        std::fs::create_dir_all(&packs_dir)?;
        Ok(Self {
            packs_dir,
            installed_path: root.join("installed.json"),
        })
    }

    /// All locally saved packs, most-recently-updated first. Unreadable or
    /// unparseable files are skipped.
    pub fn load_packs(&self) -> Vec<Pack> {
        let mut packs = Vec::new();
        let entries = match std::fs::read_dir(&self.packs_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read packs dir: {e}");
                return packs;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            match std::fs::read_to_string(&path)
                .map_err(ClientError::from)
                .and_then(|json| Ok(serde_json::from_str::<Pack>(&json)?))
            {
                Ok(pack) => packs.push(pack),
                Err(e) => warn!("Skipping {}: {e}", path.display()),
            }
        }
        packs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        packs
    }

    pub fn save_pack(&self, pack: &Pack) -> Result<(), ClientError> {
        let path = self.packs_dir.join(format!("{}.json", pack.id));
        std::fs::write(path, serde_json::to_string_pretty(pack)?)?;
        Ok(())
    }

    /// Returns whether a file was actually removed.
    pub fn delete_pack(&self, id: &str) -> Result<bool, ClientError> {
        let path = self.packs_dir.join(format!("{id}.json"));
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    pub fn load_installed(&self) -> Vec<String> {
        if !self.installed_path.exists() {
            return Vec::new();
        }
        std::fs::read_to_string(&self.installed_path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save_installed(&self, ids: &[String]) -> Result<(), ClientError> {
        std::fs::write(&self.installed_path, serde_json::to_string_pretty(&ids)?)?;
        Ok(())
    }
}

/// Pretty-printed JSON for sharing a pack outside the store.
pub fn export_pack(pack: &Pack) -> Result<String, ClientError> {
    Ok(serde_json::to_string_pretty(pack)?)
}

pub fn import_pack(json: &str) -> Result<Pack, ClientError> {
    Ok(serde_json::from_str(json)?)
}
