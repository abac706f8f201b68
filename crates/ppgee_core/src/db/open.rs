use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (creating if needed) a database file in WAL mode and migrates it.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    bootstrap("file", || {
        let conn = Connection::open(path)?;
        // journal_mode answers with a row.
        conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
        Ok(conn)
    })
}

/// Private in-memory database, migrated.
pub fn open_db_in_memory() -> DbResult<Connection> {
    bootstrap("memory", || Ok(Connection::open_in_memory()?))
}

fn bootstrap(mode: &str, connect: impl FnOnce() -> DbResult<Connection>) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = connect().and_then(|mut conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let applied = apply_migrations(&mut conn)?;
        Ok((conn, applied))
    });

    match result {
        Ok((conn, applied)) => {
            info!(
                "event=db_open module=db status=ok mode={mode} migrations_applied={applied} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}
