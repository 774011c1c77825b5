use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub const DB_FILE: &str = "schoold.sqlite3";

/// How long a writer waits for another process holding the workspace lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tables backing the record API, one per wire table name.
pub const RECORD_TABLES: [&str; 7] = [
    "student",
    "class",
    "attendance",
    "assignment",
    "grade",
    "announcement",
    "schedule",
];

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// In-memory database with the record schema, for tests.
#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    // Rows hold the wire record (without Id) as a JSON object.
    for table in RECORD_TABLES {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table}(
                    id INTEGER PRIMARY KEY,
                    data TEXT NOT NULL
                )"
            ),
            [],
        )?;
    }
    Ok(())
}

/// Maps a caller-supplied table name onto the fixed schema so it can be
/// spliced into SQL.
pub fn record_table(name: &str) -> anyhow::Result<&'static str> {
    RECORD_TABLES
        .iter()
        .copied()
        .find(|t| *t == name)
        .ok_or_else(|| anyhow::anyhow!("unknown record table: {name}"))
}
