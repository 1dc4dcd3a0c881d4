use anyhow::{Context, Result};
use sqlx::{Connection, PgConnection};

/// Open the single database session the loader runs on.
///
/// This is one connection, not a pool: `session_replication_role` is
/// session-scoped state, and every subsequent COPY has to observe it.
pub async fn connect(database_url: &str) -> Result<PgConnection> {
    PgConnection::connect(database_url)
        .await
        .with_context(|| "failed to connect to Postgres")
}

/// Close the session cleanly at the end of a run.
pub async fn close(conn: PgConnection) -> Result<()> {
    conn.close()
        .await
        .with_context(|| "failed to close the database session")
}
