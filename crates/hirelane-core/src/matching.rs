//! Feature-to-source matching for the campaign stats view.
//!
//! Scraped profile rows carry a free-text `source` tag ("Linkedin",
//! "Github", ...) while workflow names are catalog strings ("Linkedin
//! Scraper", "Github_Scrapper"). The policy is ordered and explicit:
//! exact lower-cased match, then a small alias table, then bidirectional
//! substring containment. Unmatched features count zero profiles.

use std::collections::BTreeMap;

/// Known source aliases: a feature name containing the left-hand term
/// matches a source bucket equal to it.
const SOURCE_ALIASES: &[&str] = &["linkedin", "github"];

/// Builds the lower-cased, trimmed source → count map the matcher runs
/// against. Later duplicates of the same normalized source win.
#[must_use]
pub fn normalize_counts<I>(counts: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = (String, i64)>,
{
    counts
        .into_iter()
        .map(|(source, count)| (source.trim().to_lowercase(), count))
        .collect()
}

/// Returns the profile count for one feature name, or 0 when nothing
/// matches.
#[must_use]
pub fn profiles_for_feature(feature: &str, counts: &BTreeMap<String, i64>) -> i64 {
    let feature = feature.trim().to_lowercase();
    if feature.is_empty() {
        return 0;
    }

    if let Some(count) = counts.get(&feature) {
        return *count;
    }

    for alias in SOURCE_ALIASES {
        if feature.contains(alias) {
            if let Some(count) = counts.get(*alias) {
                return *count;
            }
        }
    }

    for (source, count) in counts {
        if source.is_empty() {
            continue;
        }
        if feature.contains(source.as_str()) || source.contains(feature.as_str()) {
            return *count;
        }
    }

    0
}
