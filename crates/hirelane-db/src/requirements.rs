//! The requirement repository: existence checks, inserts with derived-field
//! enrichment, and the per-user open-requirement listing.

use hirelane_gateway::SqlParam;
use serde::{Deserialize, Deserializer, Serialize};

use crate::resolver::LogicalTable;
use crate::{users, DbContext, RepoError};

/// The full form payload for a new requirement. Everything except the job
/// title, client and positions count is opaque pass-through data; empty
/// strings are persisted as SQL NULL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewRequirement {
    pub job_title: Option<String>,
    pub client_name: Option<String>,
    pub requirement_received_date: Option<String>,
    pub due_date: Option<String>,
    pub lead_ref_number: Option<String>,
    pub date_of_allocation: Option<String>,
    pub team_leader: Option<String>,
    pub location: Option<String>,
    pub past_company: Option<String>,
    pub type_of_position: Option<String>,
    pub experience_level: Option<String>,
    pub relevant_exp: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub positions: Option<i64>,
    pub qualification: Option<String>,
    pub salary_bracket: Option<String>,
    pub shift: Option<String>,
    pub on_site_opportunity: Option<String>,
    pub involve_traveling: Option<String>,
    pub specific_gender_requirement: Option<String>,
    pub process_of_interview: Option<String>,
    pub requirement_open_since: Option<String>,
    pub requirement_close_date: Option<String>,
    pub new_project: Option<String>,
    pub requirement_status: Option<String>,
    pub jd_received: Option<String>,
    pub manager: Option<String>,
    pub mark_complete_once_all_fulfilled: Option<String>,
    pub skills: Option<String>,
    pub job_description: Option<String>,
    pub additional_notes: Option<String>,
}

/// The form posts `positions` as either a number or a numeric string.
fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct InsertedRequirement {
    pub bi_primary_id: Option<i64>,
}

/// One row of the open-requirements listing, wire-compatible with the form.
#[derive(Debug, Clone, Serialize)]
pub struct RequirementSummary {
    pub bi_primary_id: Option<i64>,
    pub requirement_name: Option<String>,
    pub client_name: Option<String>,
    pub requirement_received_date: Option<String>,
    pub job_location: Option<String>,
    pub requirement_status: Option<String>,
}

/// Exact-match uniqueness guard for requirement names.
///
/// Fails open: a gateway failure reports "does not exist" so an outage never
/// blocks posting a requirement, at the cost of a possible duplicate.
pub async fn exists(ctx: &DbContext, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    let table = ctx.resolver().resolve(LogicalTable::Requirement).await;
    let sql = format!(
        "SELECT bi_primary_id, requirement_name FROM {table} \
         WHERE requirement_name = ? LIMIT 1"
    );
    match ctx.gateway().query(&sql, &[name.into()]).await {
        Ok(result) => result.iter().any(|row| {
            row.field(&table, "bi_primary_id").is_some()
                || row.field(&table, "requirement_name").is_some()
        }),
        Err(e) => {
            tracing::warn!(error = %e, "requirement existence check failed; treating as absent");
            false
        }
    }
}

/// Inserts a requirement, enriched with the assignee display name (from
/// `created_by_user_id`) and the client's industry.
///
/// The check-then-insert is not atomic: two concurrent inserts with the same
/// name can both pass the guard. Deduplication beyond the sequential case
/// needs a unique constraint in the CRM's storage layer.
///
/// # Errors
///
/// - [`RepoError::DuplicateName`] if a requirement with this name exists.
/// - [`RepoError::InsertFailed`] if the insert statement fails.
/// - [`RepoError::FetchIdFailed`] if the id-recovery query fails.
pub async fn insert(
    ctx: &DbContext,
    new: &NewRequirement,
    created_by_user_id: i64,
) -> Result<InsertedRequirement, RepoError> {
    let name = new.job_title.as_deref().unwrap_or("");
    if !name.is_empty() && exists(ctx, name).await {
        return Err(RepoError::DuplicateName);
    }

    let industry_name = match new.client_name.as_deref() {
        Some(client) if !client.is_empty() => client_industry(ctx, client).await,
        _ => None,
    };
    let assign_to = users::full_name_best_effort(ctx, created_by_user_id).await;

    let table = ctx.resolver().resolve(LogicalTable::Requirement).await;
    let sql = format!(
        "INSERT INTO {table} (\
             created_by, created_at, requirement_received_date, client_name, \
             date_of_allocation, requirement_name, open_no_of_position, jd_received, \
             experince_range, relevant_exp, mandatory_skills, any_qualification_criteria, \
             shift_details, salary_bracket, job_location, onsite_opportunity, \
             does_the_profile_invovle_travelling, specific_gender_requirement, \
             process_of_interview, requirement_open_since, type_of_position, \
             if_new_project, requirement_status, requirement_close_date, team_leader, \
             due_date, lead_ref_number, note, mark_complete_once_all_fulfilled, \
             Manager, responsibilities, past_company, industry_name, assign_to\
         ) VALUES (\
             ?, CURDATE(), ?, ?, ?, ?, ?, ?, ?, ?, ?, \
             ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, \
             ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, \
             ?, ?, ?\
         )"
    );
    let params = vec![
        SqlParam::Int(created_by_user_id.max(0)),
        SqlParam::opt_text(new.requirement_received_date.as_deref()),
        SqlParam::opt_text(new.client_name.as_deref()),
        SqlParam::opt_text(new.date_of_allocation.as_deref()),
        SqlParam::opt_text(new.job_title.as_deref()),
        SqlParam::opt_int(new.positions),
        SqlParam::opt_text(new.jd_received.as_deref()),
        SqlParam::opt_text(new.experience_level.as_deref()),
        SqlParam::opt_text(new.relevant_exp.as_deref()),
        SqlParam::opt_text(new.skills.as_deref()),
        SqlParam::opt_text(new.qualification.as_deref()),
        SqlParam::opt_text(new.shift.as_deref()),
        SqlParam::opt_text(new.salary_bracket.as_deref()),
        SqlParam::opt_text(new.location.as_deref()),
        SqlParam::opt_text(new.on_site_opportunity.as_deref()),
        SqlParam::opt_text(new.involve_traveling.as_deref()),
        SqlParam::opt_text(new.specific_gender_requirement.as_deref()),
        SqlParam::opt_text(new.process_of_interview.as_deref()),
        SqlParam::opt_text(new.requirement_open_since.as_deref()),
        SqlParam::opt_text(new.type_of_position.as_deref()),
        SqlParam::opt_text(new.new_project.as_deref()),
        SqlParam::opt_text(new.requirement_status.as_deref()),
        SqlParam::opt_text(new.requirement_close_date.as_deref()),
        SqlParam::opt_text(new.team_leader.as_deref()),
        SqlParam::opt_text(new.due_date.as_deref()),
        SqlParam::opt_text(new.lead_ref_number.as_deref()),
        SqlParam::opt_text(new.additional_notes.as_deref()),
        SqlParam::opt_text(new.mark_complete_once_all_fulfilled.as_deref()),
        SqlParam::opt_text(new.manager.as_deref()),
        SqlParam::opt_text(new.job_description.as_deref()),
        SqlParam::opt_text(new.past_company.as_deref()),
        SqlParam::opt_text(industry_name.as_deref()),
        SqlParam::opt_text(assign_to.as_deref()),
    ];

    ctx.gateway()
        .query(&sql, &params)
        .await
        .map_err(RepoError::InsertFailed)?;

    // The gateway does not return the generated id; recover it by re-query,
    // newest first.
    let id_sql = format!(
        "SELECT bi_primary_id, requirement_name FROM {table} \
         WHERE requirement_name = ? AND client_name = ? \
         ORDER BY bi_primary_id DESC LIMIT 1"
    );
    let id_params = [
        SqlParam::opt_text(new.job_title.as_deref()),
        SqlParam::opt_text(new.client_name.as_deref()),
    ];
    let result = ctx
        .gateway()
        .query(&id_sql, &id_params)
        .await
        .map_err(RepoError::FetchIdFailed)?;

    let bi_primary_id = result
        .first()
        .and_then(|row| row.i64_field(&table, "bi_primary_id"));
    if bi_primary_id.is_none() {
        tracing::warn!(name, "requirement inserted but its id could not be recovered");
    }
    Ok(InsertedRequirement { bi_primary_id })
}

/// Open requirements assigned to the user, by display-name substring match
/// across the three assignee columns. An unresolvable user degrades to the
/// unfiltered open listing.
///
/// # Errors
///
/// Returns [`RepoError::Gateway`] if the listing query fails.
pub async fn list_open_for_user(
    ctx: &DbContext,
    user_id: i64,
) -> Result<Vec<RequirementSummary>, RepoError> {
    let table = ctx.resolver().resolve(LogicalTable::Requirement).await;
    let user_name = users::full_name_best_effort(ctx, user_id).await;

    let result = match user_name {
        Some(name) if !name.is_empty() => {
            let sql = format!(
                "SELECT bi_primary_id, requirement_name, client_name, \
                        requirement_received_date, job_location, requirement_status \
                 FROM {table} \
                 WHERE (assign_to LIKE ? OR assign_to_others_1 LIKE ? OR assign_to_others_2 LIKE ?) \
                   AND requirement_status = ? \
                   AND requirement_name IS NOT NULL AND requirement_name != '' \
                 ORDER BY requirement_name ASC"
            );
            let pattern = format!("%{name}%");
            ctx.gateway()
                .query(
                    &sql,
                    &[
                        pattern.clone().into(),
                        pattern.clone().into(),
                        pattern.into(),
                        "Open".into(),
                    ],
                )
                .await?
        }
        _ => {
            let sql = format!(
                "SELECT bi_primary_id, requirement_name, client_name, \
                        requirement_received_date, job_location, requirement_status \
                 FROM {table} \
                 WHERE requirement_status = ? \
                   AND requirement_name IS NOT NULL AND requirement_name != '' \
                 ORDER BY requirement_name ASC"
            );
            ctx.gateway().query(&sql, &["Open".into()]).await?
        }
    };

    Ok(result
        .iter()
        .map(|row| RequirementSummary {
            bi_primary_id: row.i64_field(&table, "bi_primary_id"),
            requirement_name: row.str_field(&table, "requirement_name"),
            client_name: row.str_field(&table, "client_name"),
            requirement_received_date: row.str_field(&table, "requirement_received_date"),
            job_location: row.str_field(&table, "job_location"),
            requirement_status: row.str_field(&table, "requirement_status"),
        })
        .collect())
}

/// The requirement's name, or `None` if the row is missing or unnamed.
///
/// # Errors
///
/// Returns [`RepoError::Gateway`] if the lookup fails.
pub async fn get_name(ctx: &DbContext, requirement_id: i64) -> Result<Option<String>, RepoError> {
    let table = ctx.resolver().resolve(LogicalTable::Requirement).await;
    let sql = format!(
        "SELECT bi_primary_id, requirement_name FROM {table} \
         WHERE bi_primary_id = ? LIMIT 1"
    );
    let result = ctx
        .gateway()
        .query(&sql, &[SqlParam::Int(requirement_id)])
        .await?;

    Ok(result
        .first()
        .and_then(|row| row.str_field(&table, "requirement_name"))
        .filter(|name| !name.is_empty()))
}

/// Distinct non-empty client names for the form's client dropdown.
///
/// # Errors
///
/// Returns [`RepoError::Gateway`] if the query fails.
pub async fn list_clients(ctx: &DbContext) -> Result<Vec<String>, RepoError> {
    let table = ctx.resolver().resolve(LogicalTable::Client).await;
    let sql = format!(
        "SELECT DISTINCT client_name FROM {table} \
         WHERE client_name IS NOT NULL AND client_name != '' \
         ORDER BY client_name ASC"
    );
    let result = ctx.gateway().query(&sql, &[]).await?;

    Ok(result
        .iter()
        .filter_map(|row| row.str_field(&table, "client_name"))
        .filter(|name| !name.is_empty())
        .collect())
}

/// The client's `client_industry1`, best effort: failures and blanks become
/// `None` rather than blocking the insert.
async fn client_industry(ctx: &DbContext, client_name: &str) -> Option<String> {
    let table = ctx.resolver().resolve(LogicalTable::Client).await;
    let sql = format!(
        "SELECT client_industry1 FROM {table} \
         WHERE client_name = ? LIMIT 1"
    );
    match ctx.gateway().query(&sql, &[client_name.into()]).await {
        Ok(result) => result
            .first()
            .and_then(|row| row.str_field(&table, "client_industry1"))
            .map(|industry| industry.trim().to_string())
            .filter(|industry| !industry.is_empty()),
        Err(e) => {
            tracing::warn!(client_name, error = %e, "client industry lookup failed");
            None
        }
    }
}
