use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rusqlite::Connection;

/// Applies every `*.sql` file in `dir` that has not been applied yet, in file
/// name order. Each file runs in its own transaction together with its
/// bookkeeping row.
pub fn run_migrations(conn: &mut Connection, dir: &Path) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "no migrations directory, schema left as is");
        return Ok(());
    }

    let applied = applied_names(conn)?;
    for (name, path) in sql_files(dir)? {
        if applied.contains(&name) {
            continue;
        }
        let sql = fs::read_to_string(&path)
            .with_context(|| format!("failed to read migration {name}"))?;

        let tx = conn.transaction()?;
        tx.execute_batch(&sql)
            .with_context(|| format!("migration {name} failed"))?;
        tx.execute("INSERT INTO _migrations (name) VALUES (?1)", [&name])?;
        tx.commit()?;

        tracing::info!(migration = %name, "migration applied");
    }

    Ok(())
}

fn applied_names(conn: &Connection) -> anyhow::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM _migrations")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}

/// `(file name, path)` of each `.sql` file, sorted by name.
fn sql_files(dir: &Path) -> anyhow::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to list migrations in {}", dir.display()))?
    {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "sql") {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push((name.to_string(), path.clone()));
            }
        }
    }
    files.sort();
    Ok(files)
}
