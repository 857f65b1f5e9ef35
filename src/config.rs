//! Application configuration
//!
//! Settings live in ~/.config/versecraft/config.json; the OpenRouter API key
//! lives in the system keychain (environment variable takes precedence).

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const KEYRING_SERVICE: &str = "versecraft";
const KEYRING_USERNAME: &str = "openrouter_api_key";
const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default tone label applied to new sessions
    pub default_tone: Option<String>,
    /// Debounce window for continuous-typing review, in milliseconds
    pub debounce_ms: Option<u64>,
}

fn keyring_entry() -> Result<Entry, keyring::Error> {
    Entry::new(KEYRING_SERVICE, KEYRING_USERNAME)
}

fn read_keyring_key() -> Result<Option<String>, keyring::Error> {
    let entry = keyring_entry()?;
    match entry.get_password() {
        Ok(key) => Ok(Some(key)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(err),
    }
}

fn write_keyring_key(key: &str) -> Result<(), keyring::Error> {
    keyring_entry()?.set_password(key)
}

impl Config {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("versecraft"))
    }

    fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.json"))
    }

    /// Load config from disk, or return defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if let Ok(content) = fs::read_to_string(&path) {
                match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => {
                        preserve_corrupt_config(&path, &content);
                        eprintln!(
                            "  Warning: Config file was corrupted ({}). A backup was saved and defaults were loaded.",
                            err
                        );
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        fs::create_dir_all(&dir)?;

        let path = dir.join("config.json");
        let content = serde_json::to_string_pretty(self)?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, content)?;
        if let Err(err) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }
        Ok(())
    }

    /// Get the OpenRouter API key (from environment or keychain)
    pub fn get_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            return Some(key);
        }
        match read_keyring_key() {
            Ok(key) => key,
            Err(err) => {
                eprintln!(
                    "  Warning: Failed to read API key from system keychain: {}",
                    err
                );
                eprintln!(
                    "  Tip: Set the {} environment variable as a workaround.",
                    API_KEY_ENV
                );
                None
            }
        }
    }

    /// Store the API key in the keychain and verify it reads back
    pub fn set_api_key(&self, key: &str) -> anyhow::Result<()> {
        write_keyring_key(key).map_err(|err| {
            anyhow::anyhow!(
                "Failed to store API key in system keychain: {}. \
                 You can set the {} environment variable instead.",
                err,
                API_KEY_ENV
            )
        })?;

        match read_keyring_key() {
            Ok(Some(stored)) if stored == key => Ok(()),
            Ok(_) => Err(anyhow::anyhow!(
                "API key verification failed: key was not persisted to keychain."
            )),
            Err(err) => Err(anyhow::anyhow!(
                "API key verification failed: couldn't read back from keychain ({}).",
                err
            )),
        }
    }

    pub fn has_api_key(&self) -> bool {
        if std::env::var(API_KEY_ENV).is_ok() {
            return true;
        }
        matches!(read_keyring_key(), Ok(Some(_)))
    }

    /// OpenRouter keys start with sk-
    pub fn validate_api_key_format(key: &str) -> bool {
        key.starts_with("sk-")
    }

    pub fn config_location() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/versecraft/config.json".to_string())
    }
}

/// Interactive prompt to set up the API key
pub fn setup_api_key_interactive() -> anyhow::Result<String> {
    use std::io::{self, Write};

    println!();
    println!("  Versecraft uses OpenRouter for suggestions.");
    println!("  1. Get an API key at: https://openrouter.ai/keys");
    println!("  2. Paste it below (saved in your system keychain)");
    println!();
    print!("  API Key: ");
    io::stdout().flush()?;

    let mut key = String::new();
    io::stdin().read_line(&mut key)?;
    let key = key.trim().to_string();

    if key.is_empty() {
        return Err(anyhow::anyhow!("No API key provided"));
    }

    if !Config::validate_api_key_format(&key) {
        println!();
        println!("  Warning: Key doesn't look like an OpenRouter key (should start with sk-)");
        println!("  Saving anyway...");
    }

    Config::load().set_api_key(&key)?;

    println!();
    println!("  + API key saved");
    println!();

    Ok(key)
}

fn preserve_corrupt_config(path: &std::path::Path, content: &str) {
    let corrupt_path = path.with_extension("json.corrupt");
    if fs::rename(path, &corrupt_path).is_err() {
        let _ = fs::write(&corrupt_path, content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.default_tone.is_none());
        assert!(config.debounce_ms.is_none());
    }

    #[test]
    fn test_api_key_format() {
        assert!(Config::validate_api_key_format("sk-or-v1-abc"));
        assert!(!Config::validate_api_key_format("not-a-key"));
    }
}
