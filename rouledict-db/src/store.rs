use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;

use crate::db::{get_value, migrate, open_db, put_value};

/// Capacité de lecture/écriture d'un blob opaque par clé.
pub trait StateStore: Send {
    fn name(&self) -> &str;
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_db(path)?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        migrate(&conn)?;
        Ok(Self { conn })
    }
}

impl StateStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn load(&self, key: &str) -> Result<Option<String>> {
        get_value(&self.conn, key)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        put_value(&self.conn, key, value)
    }
}

/// Un fichier `<clé>.json` par clé dans un répertoire.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.file_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Impossible de lire {:?}", path))?;
        Ok(Some(json))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", self.dir))?;
        let path = self.file_for(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        Ok(())
    }
}

/// Stockage en mémoire ; les clones partagent la même table.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}

impl StateStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("Verrou du stockage empoisonné"))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("Verrou du stockage empoisonné"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
