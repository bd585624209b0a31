//! Handlers for campaign status, creation, and the feature/profile report.

use hirelane_core::catalog::CampaignFlags;
use hirelane_db::{campaigns, features, DbContext, RepoError};
use serde_json::{json, Value};

use super::i64_param;

pub(super) async fn get_campaign_status(
    ctx: &DbContext,
    params: &Value,
) -> Result<Value, RepoError> {
    let requirement_id = i64_param(params, &["requirement_id", "requirementId"]);
    let status = campaigns::status(ctx, requirement_id).await?;
    Ok(json!({
        "success": true,
        "campaign_exists": status.campaign_exists,
        "campaign_id": status.campaign_id,
        "selected_options": status.selected_options,
    }))
}

pub(super) async fn create_campaign(ctx: &DbContext, params: &Value) -> Result<Value, RepoError> {
    let requirement_id = i64_param(params, &["requirement_id", "requirementId"]);
    let flags: CampaignFlags = serde_json::from_value(params.clone()).unwrap_or_default();

    let created = campaigns::create(ctx, requirement_id, &flags).await?;
    Ok(json!({
        "success": true,
        "message": "Campaign created successfully",
        "campaign_id": created.campaign_id,
        "workflows": created.workflows,
    }))
}

pub(super) async fn get_campaign_features(
    ctx: &DbContext,
    params: &Value,
    debug: bool,
) -> Result<Value, RepoError> {
    let requirement_id = i64_param(params, &["requirement_id", "requirementId"]);
    let report = features::features(ctx, requirement_id, debug).await?;

    let mut body = serde_json::to_value(&report).unwrap_or_else(|_| json!({}));
    body["success"] = json!(true);
    Ok(body)
}
