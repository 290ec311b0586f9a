//! Snapshot persistence for `TokenState`
//!
//! The file is rewritten whole after each accepted mutation: written to a
//! sibling temp file, then renamed over the old snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use fx1_core::{Error, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::token::TokenState;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    version: u32,
    saved_at: Timestamp,
    state: TokenState,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last snapshot, or `None` if nothing has been saved yet
    pub fn load(&self) -> Result<Option<TokenState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| self.store_error(e))?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(self.store_error(format!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        tracing::debug!(
            "Loaded ledger snapshot from {} (saved at {})",
            self.path.display(),
            snapshot.saved_at
        );
        Ok(Some(snapshot.state))
    }

    pub fn save(&self, state: &TokenState, now: Timestamp) -> Result<()> {
        let snapshot = SnapshotOut {
            version: SNAPSHOT_VERSION,
            saved_at: now,
            state,
        };
        let encoded = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.store_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).map_err(|e| self.store_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.store_error(e))?;
        Ok(())
    }

    fn store_error(&self, message: impl ToString) -> Error {
        Error::Store {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }
}

/// Borrowing twin of `Snapshot` so saving does not clone the state
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotOut<'a> {
    version: u32,
    saved_at: Timestamp,
    state: &'a TokenState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ids, launched, tokens};

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("fx1-store-{}-{}", std::process::id(), name))
            .join("ledger.json")
    }

    #[test]
    fn test_missing_file_loads_none() {
        let store = SnapshotStore::new(scratch("missing"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let path = scratch("roundtrip");
        let store = SnapshotStore::new(&path);

        let mut token = launched();
        token.transfer(ids::ADMIN, ids::user(1), tokens(100)).unwrap();
        token.transfer(ids::user(1), ids::PAIR, tokens(40)).unwrap();
        token.approve(ids::user(1), ids::user(2), tokens(7)).unwrap();
        store.save(token.state(), 42).unwrap();

        let state = store.load().unwrap().unwrap();
        assert_eq!(state.token_address, ids::TOKEN);
        assert_eq!(state.ledger.balance_of(&ids::user(1)), tokens(60));
        assert_eq!(state.ledger.balance_of(&ids::TOKEN), tokens(2));
        assert_eq!(state.ledger.allowance(&ids::user(1), &ids::user(2)), tokens(7));
        assert_eq!(state.policy.config(), token.policy());
        assert_eq!(state.policy.flags(&ids::PAIR), token.flags(&ids::PAIR));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let path = scratch("version");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let token = launched();
        let mut doc = serde_json::to_string(&SnapshotOut {
            version: SNAPSHOT_VERSION,
            saved_at: 1,
            state: token.state(),
        })
        .unwrap();
        doc = doc.replacen("\"version\":1", "\"version\":9", 1);
        fs::write(&path, doc).unwrap();

        let err = SnapshotStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Store { .. }));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
