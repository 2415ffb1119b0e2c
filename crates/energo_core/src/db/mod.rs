use std::collections::HashSet;
use std::path::Path;

use rusqlite::Connection;

use crate::error::AppError;

struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// Applied in slice order; names are never reused.
const MIGRATIONS: &[Migration] = &[Migration {
    name: "0001_init.sql",
    sql: include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../migrations/0001_init.sql"
    )),
}];

/// Any failure while opening or migrating means the store is unusable for the session.
fn unavailable(code: &'static str, message: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> AppError {
    let message = message.into();
    move |e| AppError::unavailable(code, message).with_details(e.to_string())
}

pub fn open(path: &Path) -> Result<Connection, AppError> {
    Connection::open(path).map_err(unavailable("DB_OPEN_FAILED", "Failed to open SQLite database"))
}

pub fn open_in_memory() -> Result<Connection, AppError> {
    Connection::open_in_memory().map_err(unavailable(
        "DB_OPEN_FAILED",
        "Failed to open in-memory SQLite database",
    ))
}

fn applied_migrations(conn: &Connection) -> Result<HashSet<String>, AppError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
           name TEXT PRIMARY KEY NOT NULL,
           applied_at TEXT NOT NULL
         );",
    )
    .map_err(unavailable(
        "DB_MIGRATIONS_TABLE_FAILED",
        "Failed to ensure migrations table exists",
    ))?;

    let mut stmt = conn
        .prepare("SELECT name FROM _migrations")
        .map_err(unavailable("DB_MIGRATIONS_QUERY_FAILED", "Failed to query applied migrations"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(unavailable("DB_MIGRATIONS_QUERY_FAILED", "Failed to read applied migrations"))?
        .collect::<Result<HashSet<_>, _>>()
        .map_err(unavailable("DB_MIGRATIONS_QUERY_FAILED", "Failed to decode applied migration"))?;
    Ok(names)
}

fn apply(conn: &mut Connection, migration: &Migration) -> Result<(), AppError> {
    let name = migration.name;
    let tx = conn
        .transaction()
        .map_err(unavailable("DB_TX_FAILED", "Failed to start migration transaction"))?;

    tx.execute_batch(migration.sql)
        .map_err(unavailable("DB_MIGRATION_FAILED", format!("Migration {name} failed")))?;
    tx.execute(
        "INSERT INTO _migrations(name, applied_at)
         VALUES (?1, strftime('%Y-%m-%d %H:%M:%S', 'now', 'localtime'))",
        [name],
    )
    .map_err(unavailable("DB_MIGRATION_FAILED", format!("Failed to record migration {name}")))?;

    tx.commit()
        .map_err(unavailable("DB_TX_FAILED", "Failed to commit migration transaction"))
}

/// Bring the schema up to date. Each pending migration runs in its own transaction.
pub fn migrate(conn: &mut Connection) -> Result<(), AppError> {
    let applied = applied_migrations(conn)?;
    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(m.name)) {
        apply(conn, migration)?;
        log::info!("Applied migration {}", migration.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_create_expected_tables() {
        let mut conn = open_in_memory().expect("open");
        migrate(&mut conn).expect("migrate");

        let mut tables = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        tables.retain(|t| t != "sqlite_sequence");
        assert_eq!(tables, vec!["_migrations", "brigades", "equipment", "incidents"]);
    }

    #[test]
    fn migrate_is_idempotent() {
        let mut conn = open_in_memory().expect("open");
        migrate(&mut conn).expect("first");
        migrate(&mut conn).expect("second");

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, MIGRATIONS.len() as i64);
    }

    #[test]
    fn serial_number_unique_index_exists() {
        let mut conn = open_in_memory().expect("open");
        migrate(&mut conn).expect("migrate");
        conn.execute(
            "INSERT INTO equipment(name, type, serial_number) VALUES ('T1', 'Transformer', 'SN')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO equipment(name, type, serial_number) VALUES ('T2', 'Transformer', 'SN')",
            [],
        );
        assert!(dup.is_err());
    }
}
