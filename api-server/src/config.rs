//! Server configuration read from the environment

use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = ".tasklist-data";
const DEFAULT_PORT: u16 = 8081;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Holds the fallback blob and, by default, the SQLite database
    pub data_dir: PathBuf,
    pub sqlite_path: PathBuf,
    /// When off, the host bridge is treated as absent
    pub structured_backend: bool,
    pub seed: bool,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("TASKLIST_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let sqlite_path = std::env::var("TASKLIST_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("todos.db"));
        let port = std::env::var("TASKLIST_PORT")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            data_dir,
            sqlite_path,
            structured_backend: env_flag("TASKLIST_STRUCTURED_BACKEND", true),
            seed: env_flag("TASKLIST_SEED", true),
            port,
        }
    }

    /// Location of the fallback blob
    pub fn blob_path(&self) -> PathBuf {
        self.data_dir.join("todos.json")
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => parse_flag(&raw).unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
