//! The fixed catalog of sourcing/posting automation workflows.
//!
//! Each campaign owns a batch of workflow registry rows drawn from this
//! catalog. Workflow names, connector names and webhook targets are fixed —
//! never user-supplied. The three social posting flags collapse into one
//! "Post on Social Media" entry whose params blob encodes the sub-platforms.

use serde::{Deserialize, Serialize};

pub const WORKFLOW_LINKEDIN_SCRAPER: &str = "Linkedin Scraper";
pub const WORKFLOW_GITHUB_SCRAPER: &str = "Github_Scrapper";
pub const WORKFLOW_LINKEDIN_MESSAGING: &str = "Linkedin Messaging";
pub const WORKFLOW_SOCIAL_POST: &str = "Post on Social Media";

const WEBHOOK_BASE: &str = "http://automation.teamob.io:5678/webhook";

/// Scheduling defaults applied to every workflow registry row at creation.
/// The first run is scheduled a day out; the synthetic "last executed" a day
/// back, so the external runner treats the entry as due exactly once per
/// interval.
pub const INTERVAL_MINUTES: i64 = 1440;
pub const PRIORITY: i64 = 5;
pub const DEFAULT_DEPTH_LIMIT: i64 = 2;
pub const MESSAGING_DEPTH_LIMIT: i64 = 6;

/// The six user-selectable campaign options, as received from the form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CampaignFlags {
    pub linkedin_posting: bool,
    pub facebook_posting: bool,
    pub twitter_posting: bool,
    pub linkedin_scraper: bool,
    pub github_scraper: bool,
    pub linkedin_messaging: bool,
}

impl CampaignFlags {
    /// True when no option at all is selected; `create_campaign` rejects this.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.linkedin_posting
            || self.facebook_posting
            || self.twitter_posting
            || self.linkedin_scraper
            || self.github_scraper
            || self.linkedin_messaging)
    }

    #[must_use]
    pub fn any_posting(&self) -> bool {
        self.linkedin_posting || self.facebook_posting || self.twitter_posting
    }
}

/// Params blob persisted on the "Post on Social Media" registry row.
///
/// The automation side expects `"1"`/`"0"` strings, and an `insta` key that
/// is always off (Instagram posting is not offered by the form). Decoding
/// treats a missing key as off: registry rows written by older tooling may
/// carry partial blobs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialParams {
    pub fb: String,
    pub ln: String,
    pub insta: String,
    pub twitter: String,
}

impl SocialParams {
    #[must_use]
    pub fn from_flags(flags: &CampaignFlags) -> Self {
        let bit = |on: bool| if on { "1" } else { "0" }.to_string();
        Self {
            fb: bit(flags.facebook_posting),
            ln: bit(flags.linkedin_posting),
            insta: "0".to_string(),
            twitter: bit(flags.twitter_posting),
        }
    }

    fn enabled(value: &str) -> bool {
        value == "1"
    }
}

/// One workflow registry row to be created, before scheduling fields are
/// filled in by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEntry {
    pub workflow_name: &'static str,
    pub connector_name: &'static str,
    pub webhook_url: String,
    pub params: Option<String>,
    pub depth_limit: i64,
}

/// Maps the selected flags to the catalog entries to persist.
///
/// Order is stable: scrapers, messaging, then the collapsed social posting
/// entry. An empty selection yields an empty vec; the caller is responsible
/// for rejecting it before any row is written.
#[must_use]
pub fn workflow_entries(flags: &CampaignFlags) -> Vec<WorkflowEntry> {
    let mut entries = Vec::new();

    if flags.linkedin_scraper {
        entries.push(WorkflowEntry {
            workflow_name: WORKFLOW_LINKEDIN_SCRAPER,
            connector_name: "linkedin_scrap",
            webhook_url: format!("{WEBHOOK_BASE}/cbbf7338-989c-44da-83da-99cf238e2de7"),
            params: None,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        });
    }

    if flags.github_scraper {
        entries.push(WorkflowEntry {
            workflow_name: WORKFLOW_GITHUB_SCRAPER,
            connector_name: "github_scrap",
            webhook_url: format!("{WEBHOOK_BASE}/8b5fd351-b8eb-45b6-87af-c7e7d47fe964"),
            params: None,
            depth_limit: DEFAULT_DEPTH_LIMIT,
        });
    }

    if flags.linkedin_messaging {
        entries.push(WorkflowEntry {
            workflow_name: WORKFLOW_LINKEDIN_MESSAGING,
            connector_name: "linkedin_message",
            webhook_url: format!("{WEBHOOK_BASE}/76cec9f7-a63f-4a11-aaf5-a2eec4acf087"),
            params: None,
            depth_limit: MESSAGING_DEPTH_LIMIT,
        });
    }

    if flags.any_posting() {
        let params = serde_json::to_string(&SocialParams::from_flags(flags))
            .unwrap_or_else(|_| "{}".to_string());
        entries.push(WorkflowEntry {
            workflow_name: WORKFLOW_SOCIAL_POST,
            connector_name: "social_media_post",
            webhook_url: format!("{WEBHOOK_BASE}/2a74e18c-8f37-4abf-a8cd-25ff4477fe15"),
            params: Some(params),
            depth_limit: DEFAULT_DEPTH_LIMIT,
        });
    }

    entries
}

/// Reconstructs the six selection flags from persisted workflow registry rows.
///
/// Name matching is case-insensitive and substring-based, tolerating the
/// historical spelling variants already in the registry ("Github_Scrapper",
/// "Post on ..."). The social entry's params blob is decoded to recover the
/// per-platform booleans; an undecodable blob leaves them off.
#[must_use]
pub fn flags_from_workflows(rows: &[(String, Option<String>)]) -> CampaignFlags {
    let mut flags = CampaignFlags::default();

    for (name, params) in rows {
        let lower = name.to_lowercase();

        if lower.contains("linkedin scraper") {
            flags.linkedin_scraper = true;
        }
        if lower.contains("github") && lower.contains("scrapper") {
            flags.github_scraper = true;
        }
        if lower.contains("linkedin messaging") {
            flags.linkedin_messaging = true;
        }
        if lower.contains("social media") || lower.contains("post on") {
            if let Some(raw) = params {
                if let Ok(social) = serde_json::from_str::<SocialParams>(raw) {
                    flags.linkedin_posting = SocialParams::enabled(&social.ln);
                    flags.facebook_posting = SocialParams::enabled(&social.fb);
                    flags.twitter_posting = SocialParams::enabled(&social.twitter);
                }
            }
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scraper_only_selection_maps_to_one_entry_with_depth_two() {
        let flags = CampaignFlags {
            linkedin_scraper: true,
            ..CampaignFlags::default()
        };
        let entries = workflow_entries(&flags);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].workflow_name, "Linkedin Scraper");
        assert_eq!(entries[0].connector_name, "linkedin_scrap");
        assert_eq!(entries[0].depth_limit, 2);
        assert!(entries[0].params.is_none());
    }

    #[test]
    fn messaging_gets_depth_limit_six() {
        let flags = CampaignFlags {
            linkedin_messaging: true,
            ..CampaignFlags::default()
        };
        let entries = workflow_entries(&flags);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].workflow_name, "Linkedin Messaging");
        assert_eq!(entries[0].depth_limit, 6);
    }

    #[test]
    fn posting_flags_collapse_into_one_social_entry() {
        let flags = CampaignFlags {
            linkedin_posting: true,
            facebook_posting: true,
            ..CampaignFlags::default()
        };
        let entries = workflow_entries(&flags);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].workflow_name, "Post on Social Media");

        let params: SocialParams =
            serde_json::from_str(entries[0].params.as_deref().expect("params")).expect("decode");
        assert_eq!(params.ln, "1");
        assert_eq!(params.fb, "1");
        assert_eq!(params.twitter, "0");
        assert_eq!(params.insta, "0");
    }

    #[test]
    fn empty_selection_yields_no_entries() {
        let flags = CampaignFlags::default();
        assert!(flags.is_empty());
        assert!(workflow_entries(&flags).is_empty());
    }

    #[test]
    fn all_flags_yield_four_entries_in_stable_order() {
        let flags = CampaignFlags {
            linkedin_posting: true,
            facebook_posting: true,
            twitter_posting: true,
            linkedin_scraper: true,
            github_scraper: true,
            linkedin_messaging: true,
        };
        let names: Vec<&str> = workflow_entries(&flags)
            .iter()
            .map(|e| e.workflow_name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Linkedin Scraper",
                "Github_Scrapper",
                "Linkedin Messaging",
                "Post on Social Media"
            ]
        );
    }

    #[test]
    fn flags_round_trip_through_persisted_rows() {
        let flags = CampaignFlags {
            linkedin_posting: true,
            twitter_posting: true,
            github_scraper: true,
            ..CampaignFlags::default()
        };
        let rows: Vec<(String, Option<String>)> = workflow_entries(&flags)
            .into_iter()
            .map(|e| (e.workflow_name.to_string(), e.params))
            .collect();
        assert_eq!(flags_from_workflows(&rows), flags);
    }

    #[test]
    fn flag_reconstruction_is_case_insensitive() {
        let rows = vec![
            ("LINKEDIN SCRAPER".to_string(), None),
            ("github_SCRAPPER".to_string(), None),
        ];
        let flags = flags_from_workflows(&rows);
        assert!(flags.linkedin_scraper);
        assert!(flags.github_scraper);
        assert!(!flags.linkedin_messaging);
    }

    #[test]
    fn social_row_with_a_partial_params_blob_keeps_the_present_keys() {
        let rows = vec![(
            "Post on Social Media".to_string(),
            Some(r#"{"ln":"1"}"#.to_string()),
        )];
        let flags = flags_from_workflows(&rows);
        assert!(flags.linkedin_posting);
        assert!(!flags.facebook_posting);
        assert!(!flags.twitter_posting);
    }

    #[test]
    fn social_row_with_bad_params_leaves_posting_flags_off() {
        let rows = vec![("Post on Social Media".to_string(), Some("{".to_string()))];
        let flags = flags_from_workflows(&rows);
        assert!(!flags.linkedin_posting);
        assert!(!flags.facebook_posting);
        assert!(!flags.twitter_posting);
    }

    #[test]
    fn campaign_flags_deserialize_from_camel_case_payload() {
        let flags: CampaignFlags = serde_json::from_str(
            r#"{"linkedinPosting":true,"githubScraper":true,"unknownKey":1}"#,
        )
        .expect("decode");
        // Unknown keys are ignored, missing keys default to false.
        assert!(flags.linkedin_posting);
        assert!(flags.github_scraper);
        assert!(!flags.twitter_posting);
    }
}
