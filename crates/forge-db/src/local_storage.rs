//! Durable string key/value storage, the desktop stand-in for a browser's
//! `localStorage`.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;

pub struct LocalStorage<'db> {
    pub(crate) conn: &'db mut Connection,
}

impl LocalStorage<'_> {
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT storage_value
                 FROM local_storage
                 WHERE storage_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let now = now_ms();
        self.conn.execute(
            "INSERT INTO local_storage (
                storage_key, storage_value, created_at_ms, updated_at_ms
             ) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(storage_key) DO UPDATE SET
                storage_value = excluded.storage_value,
                updated_at_ms = excluded.updated_at_ms",
            params![key, value, now, now],
        )?;
        Ok(())
    }

    /// Returns whether an entry was removed.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM local_storage WHERE storage_key = ?1",
            params![key],
        )?;
        Ok(removed > 0)
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use crate::Store;

    #[test]
    fn set_get_remove_round() {
        let mut store = Store::open_in_memory().expect("open store");

        assert_eq!(store.local_storage().get("currentUser").expect("get"), None);

        store
            .local_storage()
            .set("currentUser", "first")
            .expect("set");
        store
            .local_storage()
            .set("currentUser", "second")
            .expect("overwrite");

        assert_eq!(
            store.local_storage().get("currentUser").expect("get").as_deref(),
            Some("second")
        );

        assert!(store.local_storage().remove("currentUser").expect("remove"));
        assert!(!store.local_storage().remove("currentUser").expect("remove again"));
        assert_eq!(store.local_storage().get("currentUser").expect("get"), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/forge.sqlite3");

        {
            let mut store = Store::open(&path).expect("open store");
            store.local_storage().set("k", "v").expect("set");
        }

        let mut store = Store::open(&path).expect("reopen store");
        assert_eq!(
            store.local_storage().get("k").expect("get").as_deref(),
            Some("v")
        );
    }
}
