//! Document store
//!
//! Persists the working session (document text plus configuration) across
//! runs, and named documents under opaque keys. Everything is best-effort
//! JSON on disk: a failed save degrades to a notice, never to a corrupted
//! session. Writes go through an advisory file lock and a tmp-rename so a
//! concurrent second instance cannot interleave partial files.

use crate::session::SessionSnapshot;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SESSION_FILE: &str = "session.json";
const DOCUMENTS_DIR: &str = "documents";
const LOCK_TIMEOUT_SECS: u64 = 5;
const LOCK_RETRY_MS: u64 = 50;

/// A named document persisted under an opaque key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub text: String,
    pub saved_at: DateTime<Utc>,
}

pub struct DocumentStore {
    root: PathBuf,
}

struct StoreLock {
    file: std::fs::File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl DocumentStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Store under the platform data directory
    pub fn open_default() -> Option<Self> {
        dirs::data_dir().map(|p| Self::new(p.join("versecraft")))
    }

    fn ensure_dir(&self) -> anyhow::Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    fn lock(&self, exclusive: bool) -> anyhow::Result<StoreLock> {
        if exclusive {
            self.ensure_dir()?;
        } else if !self.root.exists() {
            return Err(anyhow::anyhow!("store directory missing"));
        }

        let lock_path = self.root.join(".lock");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false) // only the lock matters, not the content
            .open(&lock_path)?;

        let start = Instant::now();
        loop {
            let result = if exclusive {
                FileExt::try_lock_exclusive(&file)
            } else {
                FileExt::try_lock_shared(&file)
            };
            match result {
                Ok(()) => break,
                Err(err) => {
                    if err.kind() != ErrorKind::WouldBlock {
                        return Err(err.into());
                    }
                    if start.elapsed() >= Duration::from_secs(LOCK_TIMEOUT_SECS) {
                        return Err(anyhow::anyhow!(
                            "Timed out waiting for store lock ({}s)",
                            LOCK_TIMEOUT_SECS
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(LOCK_RETRY_MS));
                }
            }
        }

        Ok(StoreLock { file })
    }

    /// Save the working session for the next run
    pub fn save_session(&self, snapshot: &SessionSnapshot) -> anyhow::Result<()> {
        let _lock = self.lock(true)?;
        let content = serde_json::to_string_pretty(snapshot)?;
        write_atomic(&self.root.join(SESSION_FILE), &content)
    }

    /// Load the last working session, if one was saved
    pub fn load_session(&self) -> Option<SessionSnapshot> {
        let path = self.root.join(SESSION_FILE);
        if !path.exists() {
            return None;
        }
        let _lock = self.lock(false).ok()?;
        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Save a named document under an opaque key
    pub fn save_document(&self, key: &str, text: &str) -> anyhow::Result<()> {
        let _lock = self.lock(true)?;
        let dir = self.root.join(DOCUMENTS_DIR);
        fs::create_dir_all(&dir)?;
        let doc = StoredDocument {
            text: text.to_string(),
            saved_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&doc)?;
        write_atomic(&dir.join(file_name_for(key)), &content)
    }

    /// Load a named document. `None` means the key was never saved.
    pub fn load_document(&self, key: &str) -> Option<StoredDocument> {
        let path = self.root.join(DOCUMENTS_DIR).join(file_name_for(key));
        if !path.exists() {
            return None;
        }
        let _lock = self.lock(false).ok()?;
        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Keys of every saved document
    pub fn list_documents(&self) -> Vec<String> {
        let dir = self.root.join(DOCUMENTS_DIR);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut keys: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().into_string().ok()?;
                name.strip_suffix(".json").map(str::to_string)
            })
            .collect();
        keys.sort();
        keys
    }
}

/// Keys are opaque; keep the file name tame regardless of what they contain
fn file_name_for(key: &str) -> String {
    let safe: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.json", safe)
}

fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, content)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionConfig;

    fn store() -> (tempfile::TempDir, DocumentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("store"));
        (dir, store)
    }

    #[test]
    fn test_session_round_trip() {
        let (_dir, store) = store();
        let snapshot = SessionSnapshot {
            document: "meu poema".to_string(),
            config: SessionConfig {
                tone: "Melancholic".to_string(),
                ..SessionConfig::default()
            },
        };
        store.save_session(&snapshot).unwrap();
        let loaded = store.load_session().unwrap();
        assert_eq!(loaded.document, "meu poema");
        assert_eq!(loaded.config.tone, "Melancholic");
    }

    #[test]
    fn test_load_session_absent() {
        let (_dir, store) = store();
        assert!(store.load_session().is_none());
    }

    #[test]
    fn test_named_documents() {
        let (_dir, store) = store();
        store.save_document("draft-one", "first").unwrap();
        store.save_document("draft two!", "second").unwrap();

        assert_eq!(store.load_document("draft-one").unwrap().text, "first");
        // keys are opaque: odd characters are tolerated
        assert_eq!(store.load_document("draft two!").unwrap().text, "second");
        assert!(store.load_document("missing").is_none());

        let keys = store.list_documents();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_save_overwrites() {
        let (_dir, store) = store();
        store.save_document("draft", "v1").unwrap();
        store.save_document("draft", "v2").unwrap();
        assert_eq!(store.load_document("draft").unwrap().text, "v2");
    }
}
