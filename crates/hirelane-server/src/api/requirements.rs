//! Handlers for the requirement form: dropdown data, submission, and the
//! assignee name lookup.

use hirelane_db::{requirements, users, DbContext, RepoError};
use serde_json::{json, Value};

use super::i64_param;

const STORED_MESSAGE: &str =
    "Your requirement is stored in CRM successfully. Please click on OK to create the campaign.";

pub(super) async fn get_clients(ctx: &DbContext) -> Result<Value, RepoError> {
    let clients = requirements::list_clients(ctx).await?;
    Ok(json!({"success": true, "clients": clients}))
}

pub(super) async fn get_requirements(ctx: &DbContext, params: &Value) -> Result<Value, RepoError> {
    let user_id = i64_param(params, &["user_id", "userId"]);
    let rows = requirements::list_open_for_user(ctx, user_id).await?;
    Ok(json!({"success": true, "requirements": rows}))
}

/// Serves both `get_managers` and `get_team_leaders`; the CRM keeps one
/// staff role for both dropdowns.
pub(super) async fn get_staff(ctx: &DbContext) -> Result<Value, RepoError> {
    let staff = users::list_staff(ctx).await?;
    Ok(json!({"success": true, "users": staff}))
}

pub(super) async fn add_requirement(ctx: &DbContext, params: &Value) -> Result<Value, RepoError> {
    let form: requirements::NewRequirement =
        serde_json::from_value(params.clone()).unwrap_or_default();
    let user_id = i64_param(params, &["user_id", "userId"]);

    let inserted = requirements::insert(ctx, &form, user_id).await?;
    Ok(json!({
        "success": true,
        "message": STORED_MESSAGE,
        "bi_primary_id": inserted.bi_primary_id,
    }))
}

pub(super) async fn get_user_name(ctx: &DbContext, params: &Value) -> Result<Value, RepoError> {
    let user_id = i64_param(params, &["user_id", "userId"]);
    if user_id <= 0 {
        return Err(RepoError::InvalidUserId);
    }
    match users::full_name(ctx, user_id).await? {
        Some(full_name) => Ok(json!({"success": true, "full_name": full_name})),
        None => Err(RepoError::UserNotFound),
    }
}
