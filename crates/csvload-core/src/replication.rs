use anyhow::{Context, Result};
use sqlx::PgConnection;
use tracing::info;

/// PostgreSQL session replication role.
///
/// `Replica` suppresses trigger and foreign-key enforcement for writes in
/// the session; `Origin` restores normal enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    Replica,
    Origin,
}

impl SessionRole {
    // SET takes no bind parameters, so the whole statement is a fixed literal.
    fn statement(self) -> &'static str {
        match self {
            SessionRole::Replica => "SET session_replication_role = 'replica'",
            SessionRole::Origin => "SET session_replication_role = 'origin'",
        }
    }
}

/// Apply the role to the current session.
///
/// Runs outside any explicit transaction and takes effect immediately for
/// every later statement on the same connection.
pub async fn set_session_role(conn: &mut PgConnection, role: SessionRole) -> Result<()> {
    sqlx::query(role.statement())
        .execute(&mut *conn)
        .await
        .with_context(|| format!("failed to set session replication role to {role:?}"))?;

    info!(?role, "Session replication role changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_use_the_exact_role_literals() {
        assert_eq!(
            SessionRole::Replica.statement(),
            "SET session_replication_role = 'replica'"
        );
        assert_eq!(
            SessionRole::Origin.statement(),
            "SET session_replication_role = 'origin'"
        );
    }
}
