//! Campaign orchestration: at most one campaign per requirement, each owning
//! a batch of workflow registry rows drawn from the fixed catalog.
//!
//! The only state transition is NoCampaign -> Active; nothing in this layer
//! pauses, completes or cancels a campaign.

use hirelane_core::catalog::{
    self, CampaignFlags, INTERVAL_MINUTES, PRIORITY,
};
use hirelane_gateway::{Row, SqlParam};
use serde::Serialize;
use serde_json::Value;

use crate::{requirements, DbContext, RepoError};

const CAMPAIGNS_TABLE: &str = "workflow_campaigns";
const REGISTRY_TABLE: &str = "workflow_registry";

/// Campaigns always reference the requirement table under its canonical
/// name, regardless of what the resolver discovered for queries.
const REF_TABLE_NAME: &str = "bi_t14s";

#[derive(Debug, Clone, Serialize)]
pub struct CampaignStatus {
    pub campaign_exists: bool,
    pub campaign_id: Option<i64>,
    pub selected_options: CampaignFlags,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedCampaign {
    pub campaign_id: i64,
    pub workflows: Vec<String>,
}

/// Whether a campaign exists for this requirement, and which options it was
/// created with (reconstructed from its workflow registry rows).
///
/// # Errors
///
/// Returns [`RepoError::InvalidRequirementId`] for a non-positive id, or
/// [`RepoError::Gateway`] if a query fails.
pub async fn status(ctx: &DbContext, requirement_id: i64) -> Result<CampaignStatus, RepoError> {
    if requirement_id <= 0 {
        return Err(RepoError::InvalidRequirementId);
    }

    let result = ctx
        .gateway()
        .query(
            "SELECT id FROM workflow_campaigns WHERE ref_table_id = ? LIMIT 1",
            &[SqlParam::Int(requirement_id)],
        )
        .await?;
    let Some(row) = result.first() else {
        return Ok(CampaignStatus {
            campaign_exists: false,
            campaign_id: None,
            selected_options: CampaignFlags::default(),
        });
    };

    // Any returned row counts as an existing campaign, even one whose id
    // cannot be read; it still blocks creating a second campaign, but its
    // selected options cannot be reconstructed.
    let Some(campaign_id) = row.i64_field(CAMPAIGNS_TABLE, "id") else {
        return Ok(CampaignStatus {
            campaign_exists: true,
            campaign_id: None,
            selected_options: CampaignFlags::default(),
        });
    };

    let workflows = ctx
        .gateway()
        .query(
            "SELECT workflow_name, params FROM workflow_registry WHERE campaign_id = ?",
            &[SqlParam::Int(campaign_id)],
        )
        .await?;
    let rows: Vec<(String, Option<String>)> = workflows
        .iter()
        .filter_map(|row| {
            let name = row.str_field(REGISTRY_TABLE, "workflow_name")?;
            Some((name, params_blob(row)))
        })
        .collect();

    Ok(CampaignStatus {
        campaign_exists: true,
        campaign_id: Some(campaign_id),
        selected_options: catalog::flags_from_workflows(&rows),
    })
}

/// Creates the campaign and its workflow registry batch.
///
/// The existence re-check and the inserts are separate statements with no
/// transaction around them: concurrent calls for one requirement can race
/// past the check and both create a campaign, and a failure mid-batch
/// leaves the rows already written. Both are accepted at this layer; fixing
/// them needs constraints in the CRM's storage.
///
/// # Errors
///
/// - [`RepoError::InvalidRequirementId`] for a non-positive id.
/// - [`RepoError::RequirementNotFound`] if the requirement has no name.
/// - [`RepoError::CampaignAlreadyExists`] if a campaign exists.
/// - [`RepoError::NoOptionsSelected`] if every flag is off.
/// - [`RepoError::CampaignIdMissing`] if the created campaign's id cannot
///   be recovered.
/// - [`RepoError::Gateway`] if any statement fails.
pub async fn create(
    ctx: &DbContext,
    requirement_id: i64,
    flags: &CampaignFlags,
) -> Result<CreatedCampaign, RepoError> {
    if requirement_id <= 0 {
        return Err(RepoError::InvalidRequirementId);
    }

    let requirement_name = requirements::get_name(ctx, requirement_id)
        .await?
        .ok_or(RepoError::RequirementNotFound)?;

    let existing = status(ctx, requirement_id).await?;
    if existing.campaign_exists {
        return Err(RepoError::CampaignAlreadyExists);
    }

    if flags.is_empty() {
        return Err(RepoError::NoOptionsSelected);
    }

    ctx.gateway()
        .query(
            "INSERT INTO workflow_campaigns \
                 (campaign_name, ref_table_id, ref_table_name, status, start_date, created_at) \
             VALUES (?, ?, ?, 'active', CURDATE(), NOW())",
            &[
                requirement_name.into(),
                SqlParam::Int(requirement_id),
                REF_TABLE_NAME.into(),
            ],
        )
        .await?;

    // Same id-recovery pattern as the requirement insert: the gateway does
    // not return generated ids.
    let id_result = ctx
        .gateway()
        .query(
            "SELECT id FROM workflow_campaigns WHERE ref_table_id = ? \
             ORDER BY id DESC LIMIT 1",
            &[SqlParam::Int(requirement_id)],
        )
        .await?;
    let campaign_id = id_result
        .first()
        .and_then(|row| row.i64_field(CAMPAIGNS_TABLE, "id"))
        .ok_or(RepoError::CampaignIdMissing)?;

    let mut workflows = Vec::new();
    for entry in catalog::workflow_entries(flags) {
        ctx.gateway()
            .query(
                "INSERT INTO workflow_registry \
                     (campaign_id, workflow_name, webhook_url, connector_name, params, \
                      last_page_fetched, depth_limit, interval_minutes, next_run_at, \
                      last_executed_at, is_active, priority, retry_count, created_at) \
                 VALUES (?, ?, ?, ?, ?, 0, ?, ?, DATE_ADD(NOW(), INTERVAL 1 DAY), \
                         DATE_SUB(NOW(), INTERVAL 1 DAY), 1, ?, 0, NOW())",
                &[
                    SqlParam::Int(campaign_id),
                    entry.workflow_name.into(),
                    entry.webhook_url.clone().into(),
                    entry.connector_name.into(),
                    SqlParam::opt_text(entry.params.as_deref()),
                    SqlParam::Int(entry.depth_limit),
                    SqlParam::Int(INTERVAL_MINUTES),
                    SqlParam::Int(PRIORITY),
                ],
            )
            .await?;
        workflows.push(entry.workflow_name.to_string());
    }

    tracing::info!(requirement_id, campaign_id, ?workflows, "campaign created");
    Ok(CreatedCampaign {
        campaign_id,
        workflows,
    })
}

/// The registry's params column comes back as either a JSON string or an
/// already-decoded object; normalize to the string blob.
fn params_blob(row: Row<'_>) -> Option<String> {
    match row.field(REGISTRY_TABLE, "params")? {
        Value::String(s) => Some(s.clone()),
        value @ Value::Object(_) => serde_json::to_string(value).ok(),
        _ => None,
    }
}
