use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::Result;
use crate::local_storage::LocalStorage;
use crate::migration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One SQLite file holding the client's durable state.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migration::apply(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn local_storage(&mut self) -> LocalStorage<'_> {
        LocalStorage {
            conn: &mut self.conn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("forge.sqlite3");

        let mut store = Store::open(&path).expect("open");
        store.local_storage().set("k", "v").expect("set");
        drop(store);

        let mut reopened = Store::open(&path).expect("reopen");
        assert_eq!(
            reopened.local_storage().get("k").expect("get").as_deref(),
            Some("v")
        );
    }
}
