//! Scripted [`CrmGateway`] for repository tests.
//!
//! Rules match on an SQL substring, in registration order. Each rule holds a
//! queue of responses: queued responses are consumed one by one and the last
//! repeats, so sequential scenarios (empty, then a row) script naturally.
//! Unmatched statements return an empty row set.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use hirelane_gateway::{CrmGateway, GatewayError, QueryResult, SqlParam};
use serde_json::Value;

enum Scripted {
    Body(Value),
    Fail,
}

struct Rule {
    pattern: String,
    responses: VecDeque<Scripted>,
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<(String, Vec<SqlParam>)>>,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a response body for statements containing `pattern`.
    pub(crate) fn on(self, pattern: &str, body: Value) -> Self {
        self.push(pattern, Scripted::Body(body));
        self
    }

    /// Registers a gateway failure for statements containing `pattern`.
    pub(crate) fn on_err(self, pattern: &str) -> Self {
        self.push(pattern, Scripted::Fail);
        self
    }

    fn push(&self, pattern: &str, response: Scripted) {
        let mut rules = self.rules.lock().expect("rules lock");
        if let Some(rule) = rules.iter_mut().find(|r| r.pattern == pattern) {
            rule.responses.push_back(response);
        } else {
            rules.push(Rule {
                pattern: pattern.to_string(),
                responses: VecDeque::from([response]),
            });
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    /// All statements executed so far, for asserting what was (not) run.
    pub(crate) fn executed_sql(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub(crate) fn params_for(&self, pattern: &str) -> Vec<Vec<SqlParam>> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|(sql, _)| sql.contains(pattern))
            .map(|(_, params)| params.clone())
            .collect()
    }
}

#[async_trait]
impl CrmGateway for FakeGateway {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, GatewayError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((sql.to_string(), params.to_vec()));

        let mut rules = self.rules.lock().expect("rules lock");
        for rule in rules.iter_mut() {
            if !sql.contains(&rule.pattern) {
                continue;
            }
            let scripted = if rule.responses.len() > 1 {
                rule.responses.pop_front()
            } else {
                rule.responses.front().map(|r| match r {
                    Scripted::Body(v) => Scripted::Body(v.clone()),
                    Scripted::Fail => Scripted::Fail,
                })
            };
            return match scripted {
                Some(Scripted::Body(body)) => Ok(serde_json::from_value(body)
                    .expect("scripted body must decode as a QueryResult")),
                Some(Scripted::Fail) | None => {
                    Err(GatewayError::UnexpectedStatus { status: 500 })
                }
            };
        }

        Ok(QueryResult::Rows(Vec::new()))
    }
}
