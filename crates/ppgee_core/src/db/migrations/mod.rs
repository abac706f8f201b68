//! Ordered schema scripts for the document table.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(version, name, script)`; versions are strictly increasing.
const MIGRATIONS: &[(u32, &str, &str)] = &[(
    1,
    "documents",
    include_str!("0001_documents.sql"),
)];

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _, _)| *version)
}

/// Schema version recorded in the open database.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings `conn` up to `latest_version()` inside one transaction.
/// Returns the number of scripts applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _, _)| *version > found)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for &&(version, name, sql) in &pending {
        tx.execute_batch(sql)
            .and_then(|()| tx.pragma_update(None, "user_version", version))
            .map_err(|source| DbError::Migration {
                version,
                name,
                source,
            })?;
        info!("event=db_migrate module=db status=ok version={version} name={name}");
    }
    tx.commit()?;
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, schema_version};
    use rusqlite::Connection;

    #[test]
    fn applies_pending_scripts_once() {
        let mut conn = Connection::open_in_memory().unwrap();

        assert_eq!(apply_migrations(&mut conn).unwrap(), latest_version() as usize);
        assert_eq!(schema_version(&conn).unwrap(), latest_version());
        assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
    }
}
