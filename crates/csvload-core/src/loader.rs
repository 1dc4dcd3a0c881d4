use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgConnection;
use tracing::info;

use crate::replication::{self, SessionRole};
use crate::rewrite;

/// Receipt for one loaded file.
#[derive(Debug, Clone, Serialize)]
pub struct FileLoad {
    pub path: String,
    pub table: String,
    pub rows: u64,
}

/// Receipt for a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub files: Vec<FileLoad>,
    pub total_rows: u64,
}

/// Every entry in `dir`, sorted by filename.
///
/// No extension filtering: anything that is not CSV fails later, at parse
/// time.
pub fn discover_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read data directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        files.push(entry.path());
    }
    files.sort();

    Ok(files)
}

/// Stream one file into the table named after its base name.
///
/// The COPY runs outside an explicit transaction, so it commits on its own
/// when the stream finishes.
pub async fn load_file(conn: &mut PgConnection, path: &Path) -> Result<FileLoad> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let table = rewrite::table_name(&file_name).to_string();

    let payload = rewrite::rewrite_file(path)
        .with_context(|| format!("failed to rewrite {}", path.display()))?;

    let statement = format!("COPY {} FROM STDIN WITH (FORMAT csv)", quote_ident(&table));
    let mut copy = conn
        .copy_in_raw(&statement)
        .await
        .with_context(|| format!("failed to begin COPY into {table}"))?;
    copy.send(payload.data.as_slice())
        .await
        .with_context(|| format!("failed to stream {} into {table}", path.display()))?;
    let rows = copy
        .finish()
        .await
        .with_context(|| format!("failed to finish COPY into {table}"))?;

    info!(table = %table, rows, path = %path.display(), "Loaded file");

    Ok(FileLoad {
        path: path.display().to_string(),
        table,
        rows,
    })
}

/// Run the whole load: suspend trigger and foreign-key enforcement,
/// stream every file in `dir`, restore enforcement.
///
/// Role restoration happens only after the loop completes, so a failed run
/// leaves its session in `replica` until the connection drops. Each file
/// commits independently; earlier files stay loaded when a later one
/// fails.
pub async fn run(conn: &mut PgConnection, dir: &Path) -> Result<LoadReport> {
    let files = discover_files(dir)?;

    replication::set_session_role(conn, SessionRole::Replica).await?;

    let mut loads = Vec::with_capacity(files.len());
    for path in &files {
        loads.push(load_file(conn, path).await?);
    }

    replication::set_session_role(conn, SessionRole::Origin).await?;

    let total_rows = loads.iter().map(|load| load.rows).sum();
    Ok(LoadReport {
        files: loads,
        total_rows,
    })
}

// COPY cannot take the table as a bind parameter; the identifier is
// interpolated quoted, with embedded quotes doubled.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_ident_wraps_and_escapes() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn discover_files_sorts_by_filename() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["b.csv", "a.csv", "c.csv"] {
            std::fs::write(dir.path().join(name), "x\n1\n").expect("write fixture");
        }

        let files = discover_files(dir.path()).expect("discover");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.csv", "b.csv", "c.csv"]);
    }

    #[test]
    fn discover_files_is_empty_for_an_empty_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let files = discover_files(dir.path()).expect("discover");
        assert!(files.is_empty());
    }

    #[test]
    fn discover_files_fails_for_a_missing_directory() {
        let err = discover_files(Path::new("no/such/dir")).expect_err("missing dir");
        assert!(err.to_string().contains("data directory"));
    }
}
