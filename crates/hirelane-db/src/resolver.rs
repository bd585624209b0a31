//! Runtime discovery of physical table names.
//!
//! The CRM provisions staffing tables per deployment (`bi_t8s`, `bi_t14s`,
//! ... vary by install), recording the mapping in a `module_files` metadata
//! table keyed by page name. Resolution is layered: process memo, persistent
//! store, the bulk metadata fetch, a targeted metadata query, and finally a
//! hard-coded default. Resolution never fails outward; every layer's error
//! falls through to the next. Once a name is produced it is memoized for
//! the process lifetime — there is no invalidation path, and the memo is
//! only valid for a single-process deployment.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use hirelane_gateway::{CrmGateway, Row, SqlParam};
use hirelane_store::KvStore;
use serde::{Deserialize, Serialize};

const MODULE_FILES_KEY: &str = "module_files_staffing";
const MODULE_FILES_SQL: &str =
    "SELECT filename, pagename, module_name FROM module_files WHERE module_name = ?";
const STAFFING_MODULE: &str = "staffing";

/// The stable logical entities whose backing tables vary by deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalTable {
    Client,
    Requirement,
    Profile,
}

impl LogicalTable {
    pub(crate) fn cache_key(self) -> &'static str {
        match self {
            LogicalTable::Client => "client_table_name",
            LogicalTable::Requirement => "requirement_table_name",
            LogicalTable::Profile => "profile_table_name",
        }
    }

    pub(crate) fn default_name(self) -> &'static str {
        match self {
            LogicalTable::Client => "bi_t8s",
            LogicalTable::Requirement => "bi_t14s",
            LogicalTable::Profile => "bi_t20s",
        }
    }

    fn matches_pagename(self, pagename: &str) -> bool {
        let lower = pagename.to_lowercase();
        match self {
            LogicalTable::Client => lower.contains("client"),
            LogicalTable::Requirement => lower.contains("requirement"),
            LogicalTable::Profile => {
                lower.contains("profile")
                    || lower.contains("candidate")
                    || lower.contains("scrape")
                    || lower.contains("lead")
            }
        }
    }

    /// SQL + params for the targeted single-row metadata lookup.
    fn direct_lookup(self) -> (&'static str, Vec<SqlParam>) {
        match self {
            LogicalTable::Client => (
                "SELECT filename, pagename FROM module_files \
                 WHERE module_name = ? AND pagename LIKE ? LIMIT 1",
                vec![STAFFING_MODULE.into(), "%client%".into()],
            ),
            LogicalTable::Requirement => (
                "SELECT filename, pagename FROM module_files \
                 WHERE module_name = ? AND (pagename LIKE ? OR pagename LIKE ?) LIMIT 1",
                vec![
                    STAFFING_MODULE.into(),
                    "%requirement%".into(),
                    "%post requirement%".into(),
                ],
            ),
            LogicalTable::Profile => (
                "SELECT filename, pagename FROM module_files \
                 WHERE module_name = ? AND pagename LIKE ? LIMIT 1",
                vec![STAFFING_MODULE.into(), "%lead%".into()],
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModuleFile {
    filename: String,
    pagename: String,
}

/// Resolves and memoizes physical table names.
///
/// Constructed once at process start and shared by reference; the injected
/// store is the persistent second cache tier.
pub struct TableResolver {
    gateway: Arc<dyn CrmGateway>,
    store: Arc<dyn KvStore>,
    memo: RwLock<HashMap<LogicalTable, String>>,
}

impl TableResolver {
    #[must_use]
    pub fn new(gateway: Arc<dyn CrmGateway>, store: Arc<dyn KvStore>) -> Self {
        Self {
            gateway,
            store,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves the physical table name. Infallible: the worst case is the
    /// hard-coded default for this logical table.
    pub async fn resolve(&self, logical: LogicalTable) -> String {
        if let Some(name) = self.memoized(logical) {
            return name;
        }

        match self.store.get(logical.cache_key()).await {
            Ok(Some(name)) => {
                self.memoize(logical, &name);
                return name;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(table = ?logical, error = %e, "store read failed during resolution");
            }
        }

        if let Some(name) = self.from_module_files(logical).await {
            self.write_through(logical, &name).await;
            return name;
        }

        if let Some(name) = self.direct_query(logical).await {
            self.write_through(logical, &name).await;
            return name;
        }

        let name = logical.default_name().to_string();
        tracing::warn!(table = ?logical, default = %name, "table resolution fell back to default");
        self.write_through(logical, &name).await;
        name
    }

    fn memoized(&self, logical: LogicalTable) -> Option<String> {
        self.memo
            .read()
            .ok()
            .and_then(|memo| memo.get(&logical).cloned())
    }

    fn memoize(&self, logical: LogicalTable, name: &str) {
        if let Ok(mut memo) = self.memo.write() {
            memo.entry(logical).or_insert_with(|| name.to_string());
        }
    }

    async fn write_through(&self, logical: LogicalTable, name: &str) {
        self.memoize(logical, name);
        if let Err(e) = self.store.set(logical.cache_key(), name).await {
            tracing::debug!(table = ?logical, error = %e, "store write failed during resolution");
        }
    }

    /// Step 3: all staffing module file/page mappings, fetched in one query
    /// and cached as JSON in the store, then scanned for a pagename match.
    async fn from_module_files(&self, logical: LogicalTable) -> Option<String> {
        let files = match self.cached_module_files().await {
            Some(files) => files,
            None => self.fetch_module_files().await?,
        };

        files
            .iter()
            .find(|file| logical.matches_pagename(&file.pagename))
            .map(|file| file.filename.clone())
    }

    async fn cached_module_files(&self) -> Option<Vec<ModuleFile>> {
        let raw = self.store.get(MODULE_FILES_KEY).await.ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    async fn fetch_module_files(&self) -> Option<Vec<ModuleFile>> {
        let result = match self
            .gateway
            .query(MODULE_FILES_SQL, &[STAFFING_MODULE.into()])
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "module_files bulk fetch failed");
                return None;
            }
        };

        let files: Vec<ModuleFile> = result
            .iter()
            .filter_map(module_file_from_row)
            .collect();
        if files.is_empty() {
            return None;
        }

        if let Ok(raw) = serde_json::to_string(&files) {
            if let Err(e) = self.store.set(MODULE_FILES_KEY, &raw).await {
                tracing::debug!(error = %e, "could not cache module_files");
            }
        }
        Some(files)
    }

    /// Step 4: targeted single-row metadata query for just this table.
    async fn direct_query(&self, logical: LogicalTable) -> Option<String> {
        let (sql, params) = logical.direct_lookup();
        match self.gateway.query(sql, &params).await {
            Ok(result) => result
                .first()
                .and_then(|row| row.str_field("module_files", "filename"))
                .filter(|name| !name.is_empty()),
            Err(e) => {
                tracing::warn!(table = ?logical, error = %e, "direct metadata query failed");
                None
            }
        }
    }
}

fn module_file_from_row(row: Row<'_>) -> Option<ModuleFile> {
    let filename = row.str_field("module_files", "filename")?;
    if filename.is_empty() {
        return None;
    }
    let pagename = row
        .str_field("module_files", "pagename")
        .unwrap_or_default();
    Some(ModuleFile { filename, pagename })
}
