use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::error;

use crate::index::RecordIndex;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS problems (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT,
            updated_at TEXT,
            deleted_at TEXT,
            name       TEXT,
            content    TEXT,
            result     TEXT,
            link       TEXT,
            type       TEXT,
            sub_type   TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_problems_deleted_at ON problems(deleted_at);

        -- Account tables are created here but filled elsewhere
        CREATE TABLE IF NOT EXISTS users (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT,
            updated_at TEXT,
            deleted_at TEXT,
            name       TEXT,
            email      TEXT,
            phone      TEXT,
            password   TEXT,
            role       TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users(deleted_at);

        CREATE TABLE IF NOT EXISTS user_problems (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at  TEXT,
            updated_at  TEXT,
            deleted_at  TEXT,
            user_id     INTEGER,
            problem_id  INTEGER,
            pick_time   TEXT,
            finished    BOOLEAN,
            should_redo BOOLEAN,
            times       INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_user_problems_deleted_at ON user_problems(deleted_at);
        ",
    )?;
    Ok(())
}

/// Insert stats returned after completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Insert every record, one autocommitted row at a time. A failed row is
/// logged and skipped; rows already written stay written.
pub fn insert_problems(conn: &Connection, index: &RecordIndex) -> Result<InsertStats> {
    let pb = ProgressBar::new(index.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")?
            .progress_chars("=> "),
    );

    let mut stmt = conn.prepare(
        "INSERT INTO problems
         (created_at, updated_at, name, content, result, link, type, sub_type)
         VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    let mut ok = 0usize;
    let mut errors = 0usize;
    for p in index.values() {
        let now = chrono::Utc::now().to_rfc3339();
        match stmt.execute(rusqlite::params![
            now, p.name, p.content, p.result, p.link, p.kind, p.subtype,
        ]) {
            Ok(_) => ok += 1,
            Err(e) => {
                error!(name = %p.name, "create error: {}", e);
                errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(InsertStats {
        total: index.len(),
        ok,
        errors,
    })
}

pub fn count_problems(conn: &Connection) -> Result<usize> {
    let n: usize = conn.query_row("SELECT COUNT(*) FROM problems", [], |r| r.get(0))?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ProblemRecord;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn index_of(names: &[&str]) -> RecordIndex {
        names
            .iter()
            .map(|n| (n.to_string(), ProblemRecord::new(n, "tree")))
            .collect()
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = memory_db();
        init_schema(&conn).unwrap();
        for table in ["problems", "users", "user_problems"] {
            let n: usize = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(n, 1, "{table} missing");
        }
    }

    #[test]
    fn inserts_all_columns() {
        let conn = memory_db();
        let mut index = index_of(&["Foo"]);
        if let Some(rec) = index.get_mut("Foo") {
            rec.link = "http://x".into();
            rec.content = "body\n".into();
            rec.result = "answer\n".into();
        }

        let stats = insert_problems(&conn, &index).unwrap();
        assert_eq!(stats, InsertStats { total: 1, ok: 1, errors: 0 });

        let row: (String, String, String, String, String, String, Option<String>) = conn
            .query_row(
                "SELECT name, content, result, link, type, sub_type, created_at FROM problems",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?, r.get(6)?)),
            )
            .unwrap();
        assert_eq!(row.0, "Foo");
        assert_eq!(row.1, "body\n");
        assert_eq!(row.2, "answer\n");
        assert_eq!(row.3, "http://x");
        assert_eq!(row.4, "algorithm");
        assert_eq!(row.5, "tree");
        assert!(row.6.is_some());
    }

    #[test]
    fn failed_insert_does_not_stop_batch() {
        let conn = memory_db();
        conn.execute_batch(
            "CREATE TRIGGER reject_broken BEFORE INSERT ON problems
             WHEN NEW.name = 'Broken'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();

        let index = index_of(&["Alpha", "Broken", "Zeta"]);
        let stats = insert_problems(&conn, &index).unwrap();
        assert_eq!(stats, InsertStats { total: 3, ok: 2, errors: 1 });
        assert_eq!(count_problems(&conn).unwrap(), 2);
    }

    #[test]
    fn empty_index_inserts_nothing() {
        let conn = memory_db();
        let stats = insert_problems(&conn, &RecordIndex::new()).unwrap();
        assert_eq!(stats.total, 0);
        assert_eq!(count_problems(&conn).unwrap(), 0);
    }
}
