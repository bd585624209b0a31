//! Per-campaign feature report: which scraping/messaging workflows run for
//! a requirement's campaign, and how many profiles each has collected.

use hirelane_core::{catalog, matching};
use hirelane_gateway::SqlParam;
use serde::Serialize;
use serde_json::Value;

use crate::{campaigns, resolver::LogicalTable, DbContext, RepoError};

const REGISTRY_TABLE: &str = "workflow_registry";

#[derive(Debug, Clone, Serialize)]
pub struct FeatureCount {
    pub feature: String,
    pub profiles: i64,
}

/// Raw intermediate values, surfaced only when the caller asks for them.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureDebug {
    pub profile_table: String,
    pub profile_sql: String,
    pub profile_result_raw: Value,
    pub feature_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub campaign_id: i64,
    pub features: Vec<FeatureCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<FeatureDebug>,
}

/// Builds the feature report for the campaign attached to `requirement_id`.
///
/// The social posting workflow is excluded: it collects no profiles. Counts
/// come from the profile table grouped by `source`; a feature with no
/// matching source reports zero.
///
/// # Errors
///
/// - [`RepoError::InvalidRequirementId`] for a non-positive id.
/// - [`RepoError::CampaignNotFound`] if no campaign exists for it.
/// - [`RepoError::Gateway`] if a query fails.
pub async fn features(
    ctx: &DbContext,
    requirement_id: i64,
    debug: bool,
) -> Result<FeatureReport, RepoError> {
    let status = campaigns::status(ctx, requirement_id).await?;
    let Some(campaign_id) = status.campaign_id else {
        return Err(RepoError::CampaignNotFound);
    };

    let names_result = ctx
        .gateway()
        .query(
            "SELECT workflow_name FROM workflow_registry \
             WHERE campaign_id = ? AND workflow_name != ?",
            &[
                SqlParam::Int(campaign_id),
                catalog::WORKFLOW_SOCIAL_POST.into(),
            ],
        )
        .await?;
    let feature_names: Vec<String> = names_result
        .iter()
        .filter_map(|row| row.str_field(REGISTRY_TABLE, "workflow_name"))
        .collect();

    let profile_table = ctx.resolver().resolve(LogicalTable::Profile).await;
    // Scraped profiles carry the requirement id in their campaign_id column,
    // not the workflow_campaigns id.
    let profile_sql = format!(
        "SELECT source, COUNT(bi_primary_id) AS profiles \
         FROM {profile_table} WHERE campaign_id = ? GROUP BY source"
    );
    let counts_result = ctx
        .gateway()
        .query(&profile_sql, &[SqlParam::Int(requirement_id)])
        .await?;

    let counts: Vec<(String, i64)> = counts_result
        .iter()
        .filter_map(|row| {
            let source = row.str_field(&profile_table, "source")?;
            let profiles = row.i64_field(&profile_table, "profiles")?;
            Some((source, profiles))
        })
        .collect();
    let by_source = matching::normalize_counts(counts);

    let features = feature_names
        .iter()
        .map(|name| FeatureCount {
            feature: name.clone(),
            profiles: matching::profiles_for_feature(name, &by_source),
        })
        .collect();

    let debug = debug.then(|| FeatureDebug {
        profile_table: profile_table.clone(),
        profile_sql,
        profile_result_raw: counts_result.raw(),
        feature_names: feature_names.clone(),
    });

    Ok(FeatureReport {
        campaign_id,
        features,
        debug,
    })
}
