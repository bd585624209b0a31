//! Lookups against the CRM `users` table.

use hirelane_gateway::SqlParam;
use serde::Serialize;

use crate::{DbContext, RepoError};

const USERS_TABLE: &str = "users";

/// One staff user, as served to the form's manager/team-leader dropdowns.
#[derive(Debug, Clone, Serialize)]
pub struct StaffUser {
    pub user_id: i64,
    pub fullname: String,
}

/// Resolves a user's display name (first + last, trimmed).
///
/// Returns `None` for a non-positive id or an unknown user.
///
/// # Errors
///
/// Returns [`RepoError::Gateway`] if the lookup fails.
pub async fn full_name(ctx: &DbContext, user_id: i64) -> Result<Option<String>, RepoError> {
    if user_id <= 0 {
        return Ok(None);
    }

    let result = ctx
        .gateway()
        .query(
            "SELECT first_name, last_name FROM users WHERE user_id = ? LIMIT 1",
            &[SqlParam::Int(user_id)],
        )
        .await?;

    Ok(result.first().and_then(|row| {
        join_name(
            row.str_field(USERS_TABLE, "first_name"),
            row.str_field(USERS_TABLE, "last_name"),
        )
    }))
}

/// Best-effort variant for callers that degrade gracefully when the user
/// cannot be resolved (requirement filtering, assignee enrichment).
pub async fn full_name_best_effort(ctx: &DbContext, user_id: i64) -> Option<String> {
    match full_name(ctx, user_id).await {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "user name lookup failed; continuing without it");
            None
        }
    }
}

/// Lists active staff users (`role = 5`), used for both the manager and the
/// team-leader dropdowns — the CRM does not distinguish the two roles.
///
/// # Errors
///
/// Returns [`RepoError::Gateway`] if the query fails.
pub async fn list_staff(ctx: &DbContext) -> Result<Vec<StaffUser>, RepoError> {
    let result = ctx
        .gateway()
        .query(
            "SELECT user_id, CONCAT_WS(' ', first_name, last_name) AS fullname \
             FROM users \
             WHERE role = ? AND status = ? \
             ORDER BY fullname ASC",
            &[SqlParam::Int(5), SqlParam::Text("1".to_string())],
        )
        .await?;

    Ok(result
        .iter()
        .filter_map(|row| {
            let user_id = row.i64_field(USERS_TABLE, "user_id")?;
            let fullname = row.str_field(USERS_TABLE, "fullname")?;
            Some(StaffUser { user_id, fullname })
        })
        .collect())
}

fn join_name(first: Option<String>, last: Option<String>) -> Option<String> {
    let joined = format!(
        "{} {}",
        first.unwrap_or_default().trim(),
        last.unwrap_or_default().trim()
    );
    let joined = joined.trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeGateway;
    use hirelane_store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx(gateway: FakeGateway) -> DbContext {
        DbContext::new(Arc::new(gateway), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn full_name_joins_and_trims_name_parts() {
        let ctx = ctx(FakeGateway::new().on(
            "FROM users WHERE user_id = ?",
            json!({"status": "success", "data": [
                {"users": {"first_name": " Priya ", "last_name": "Sharma"}},
            ]}),
        ));
        let name = full_name(&ctx, 3).await.expect("lookup");
        assert_eq!(name.as_deref(), Some("Priya Sharma"));
    }

    #[tokio::test]
    async fn full_name_handles_missing_last_name_and_flat_rows() {
        let ctx = ctx(FakeGateway::new().on(
            "FROM users WHERE user_id = ?",
            json!([{"first_name": "Madonna"}]),
        ));
        let name = full_name(&ctx, 3).await.expect("lookup");
        assert_eq!(name.as_deref(), Some("Madonna"));
    }

    #[tokio::test]
    async fn full_name_is_none_for_invalid_or_unknown_user() {
        let ctx = ctx(FakeGateway::new());
        assert_eq!(full_name(&ctx, 0).await.expect("lookup"), None);
        assert_eq!(full_name(&ctx, -2).await.expect("lookup"), None);
        assert_eq!(full_name(&ctx, 99).await.expect("lookup"), None);
    }

    #[tokio::test]
    async fn best_effort_swallows_gateway_errors() {
        let ctx = ctx(FakeGateway::new().on_err("FROM users"));
        assert_eq!(full_name_best_effort(&ctx, 3).await, None);
    }

    #[tokio::test]
    async fn list_staff_reads_computed_fullname_column() {
        let ctx = ctx(FakeGateway::new().on(
            "WHERE role = ?",
            json!({"status": "success", "data": [
                {"users": {"user_id": 4}, "0": {"fullname": "Asha Rao"}},
                {"user_id": "7", "fullname": "Ben Okafor"},
            ]}),
        ));
        let staff = list_staff(&ctx).await.expect("list");
        assert_eq!(staff.len(), 2);
        assert_eq!(staff[0].user_id, 4);
        assert_eq!(staff[0].fullname, "Asha Rao");
        assert_eq!(staff[1].user_id, 7);
        assert_eq!(staff[1].fullname, "Ben Okafor");
    }
}
