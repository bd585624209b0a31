mod campaigns;
mod requirements;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use hirelane_db::{DbContext, RepoError};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{request_id, RequestId};
use crate::spa;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<DbContext>,
    pub static_dir: PathBuf,
}

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The portal's API surface. Requests reach it via any path containing a
/// `web` segment followed by a function name; everything else is the SPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiFunction {
    GetClients,
    GetRequirements,
    GetManagers,
    GetTeamLeaders,
    AddRequirement,
    GetUserName,
    GetCampaignStatus,
    CreateCampaign,
    GetCampaignFeatures,
}

impl ApiFunction {
    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "get_clients" => Some(Self::GetClients),
            "get_requirements" => Some(Self::GetRequirements),
            "get_managers" => Some(Self::GetManagers),
            "get_team_leaders" => Some(Self::GetTeamLeaders),
            "add_requirement" => Some(Self::AddRequirement),
            "get_user_name" => Some(Self::GetUserName),
            "get_campaign_status" => Some(Self::GetCampaignStatus),
            "create_campaign" => Some(Self::CreateCampaign),
            "get_campaign_features" => Some(Self::GetCampaignFeatures),
            _ => None,
        }
    }
}

/// Scans path segments from the end for a `web` segment immediately
/// followed by a known function name. The portal is deployed under varying
/// path prefixes, so the position of `web` in the path is not fixed.
fn api_function(path: &str) -> Option<ApiFunction> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for i in (0..segments.len().saturating_sub(1)).rev() {
        if segments[i] == "web" {
            if let Some(function) = ApiFunction::parse(segments[i + 1]) {
                return Some(function);
            }
        }
    }
    None
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id))
        .with_state(state)
}

/// Single entry point: routes API calls by path scan, everything else to
/// the SPA. Handler failures become JSON error bodies, never HTTP errors —
/// the form reads `success`/`error` from the body and a bare 500 page would
/// break it.
async fn dispatch(State(state): State<AppState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path().to_string();

    let Some(function) = api_function(&path) else {
        return spa::serve(&state.static_dir, &path).await;
    };

    let req_id = parts
        .extensions
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    if parts.method != Method::POST {
        tracing::warn!(%path, method = %parts.method, request_id = %req_id, "method not allowed");
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({"error": "Method not allowed"})),
        )
            .into_response();
    }

    let params = read_params(body).await;
    let debug = parts
        .uri
        .query()
        .is_some_and(|q| q.split('&').any(|kv| kv == "debug=1"));

    tracing::debug!(?function, %path, request_id = %req_id, "dispatching api call");
    let ctx = &state.ctx;
    let result = match function {
        ApiFunction::GetClients => requirements::get_clients(ctx).await,
        ApiFunction::GetRequirements => requirements::get_requirements(ctx, &params).await,
        ApiFunction::GetManagers | ApiFunction::GetTeamLeaders => {
            requirements::get_staff(ctx).await
        }
        ApiFunction::AddRequirement => requirements::add_requirement(ctx, &params).await,
        ApiFunction::GetUserName => requirements::get_user_name(ctx, &params).await,
        ApiFunction::GetCampaignStatus => campaigns::get_campaign_status(ctx, &params).await,
        ApiFunction::CreateCampaign => campaigns::create_campaign(ctx, &params).await,
        ApiFunction::GetCampaignFeatures => {
            campaigns::get_campaign_features(ctx, &params, debug).await
        }
    };

    let body = result.unwrap_or_else(|err| error_body(&err));
    (StatusCode::OK, Json(body)).into_response()
}

/// Decodes the request body as a JSON object; an absent or malformed body
/// degrades to empty params rather than an error.
async fn read_params(body: Body) -> Value {
    match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) if !bytes.is_empty() => {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!({}))
        }
        _ => json!({}),
    }
}

/// Pulls an integer param by any of the accepted key spellings; the form
/// posts ids as numbers or numeric strings. Absent or unparseable → 0.
fn i64_param(params: &Value, keys: &[&str]) -> i64 {
    keys.iter()
        .find_map(|key| match params.get(*key) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
        .unwrap_or(0)
}

fn error_body(err: &RepoError) -> Value {
    if err.is_validation() {
        let mut body = json!({"success": false, "error": err.to_string()});
        if matches!(err, RepoError::DuplicateName) {
            body["field"] = json!("jobTitle");
        }
        return body;
    }

    tracing::error!(error = %err, "database operation failed");
    let code = match err {
        RepoError::InsertFailed(_) => "db_insert_failed",
        RepoError::FetchIdFailed(_) => "db_fetch_id_failed",
        _ => "db_query_failed",
    };
    json!({"success": false, "error": code})
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::Request;
    use hirelane_gateway::{CrmGateway, GatewayError, QueryResult, SqlParam};
    use hirelane_store::MemoryStore;
    use tower::ServiceExt;

    /// Minimal scripted gateway: first rule whose SQL substring matches
    /// wins; unmatched statements return no rows.
    #[derive(Default)]
    struct ScriptedGateway {
        rules: Vec<(&'static str, Value)>,
        fail_on: Option<&'static str>,
    }

    impl ScriptedGateway {
        fn on(mut self, pattern: &'static str, body: Value) -> Self {
            self.rules.push((pattern, body));
            self
        }

        fn fail_on(mut self, pattern: &'static str) -> Self {
            self.fail_on = Some(pattern);
            self
        }
    }

    #[async_trait]
    impl CrmGateway for ScriptedGateway {
        async fn query(
            &self,
            sql: &str,
            _params: &[SqlParam],
        ) -> Result<QueryResult, GatewayError> {
            if let Some(pattern) = self.fail_on {
                if sql.contains(pattern) {
                    return Err(GatewayError::UnexpectedStatus { status: 500 });
                }
            }
            for (pattern, body) in &self.rules {
                if sql.contains(pattern) {
                    return Ok(serde_json::from_value(body.clone()).expect("scripted body"));
                }
            }
            Ok(QueryResult::Rows(Vec::new()))
        }
    }

    fn app_with(gateway: ScriptedGateway) -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<html></html>").expect("index");
        let ctx = Arc::new(DbContext::new(
            Arc::new(gateway),
            Arc::new(MemoryStore::new()),
        ));
        (
            build_app(AppState {
                ctx,
                static_dir: dir.path().to_path_buf(),
            }),
            dir,
        )
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[test]
    fn api_function_scan_finds_web_segment_anywhere() {
        assert_eq!(api_function("/web/get_clients"), Some(ApiFunction::GetClients));
        assert_eq!(
            api_function("/portal/v2/web/create_campaign"),
            Some(ApiFunction::CreateCampaign)
        );
        // The scan wants `web` immediately followed by a known function.
        assert_eq!(api_function("/web/ai/static/js/main.js"), None);
        assert_eq!(api_function("/web/unknown_function"), None);
        assert_eq!(api_function("/get_clients"), None);
    }

    #[test]
    fn i64_param_accepts_numbers_numeric_strings_and_alternate_keys() {
        assert_eq!(i64_param(&json!({"user_id": 7}), &["user_id", "userId"]), 7);
        assert_eq!(
            i64_param(&json!({"userId": " 9 "}), &["user_id", "userId"]),
            9
        );
        assert_eq!(i64_param(&json!({}), &["user_id"]), 0);
        assert_eq!(i64_param(&json!({"user_id": "abc"}), &["user_id"]), 0);
    }

    #[tokio::test]
    async fn wrong_method_on_an_api_path_is_405() {
        let (app, _dir) = app_with(ScriptedGateway::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/web/get_clients")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn get_clients_returns_the_distinct_names() {
        let gateway = ScriptedGateway::default().on(
            "SELECT DISTINCT client_name",
            json!({"status": "success", "data": [
                {"bi_t8s": {"client_name": "Acme"}},
                {"client_name": "Globex"},
            ]}),
        );
        let (app, _dir) = app_with(gateway);
        let response = app
            .oneshot(post("/web/get_clients", "{}"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["clients"], json!(["Acme", "Globex"]));
    }

    #[tokio::test]
    async fn missing_body_degrades_to_empty_params() {
        let (app, _dir) = app_with(ScriptedGateway::default());
        let response = app
            .oneshot(post("/web/get_requirements", "not json at all"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["requirements"], json!([]));
    }

    #[tokio::test]
    async fn duplicate_requirement_reports_the_field() {
        let gateway = ScriptedGateway::default().on(
            "WHERE requirement_name = ? LIMIT 1",
            json!([{"bi_primary_id": 1, "requirement_name": "Rust Engineer"}]),
        );
        let (app, _dir) = app_with(gateway);
        let response = app
            .oneshot(post(
                "/web/add_requirement",
                r#"{"jobTitle": "Rust Engineer", "clientName": "Acme", "user_id": 3}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["field"], "jobTitle");
        assert!(json["error"]
            .as_str()
            .expect("error message")
            .contains("unique job title"));
    }

    #[tokio::test]
    async fn gateway_failure_maps_to_a_generic_db_error_with_http_200() {
        let gateway = ScriptedGateway::default().fail_on("workflow_campaigns");
        let (app, _dir) = app_with(gateway);
        let response = app
            .oneshot(post("/web/get_campaign_status", r#"{"requirement_id": 12}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "db_query_failed");
    }

    #[tokio::test]
    async fn campaign_status_round_trips_selected_options() {
        let gateway = ScriptedGateway::default()
            .on(
                "WHERE ref_table_id = ? LIMIT 1",
                json!([{"workflow_campaigns": {"id": 88}}]),
            )
            .on(
                "FROM workflow_registry",
                json!([{"workflow_name": "Linkedin Scraper", "params": null}]),
            );
        let (app, _dir) = app_with(gateway);
        let response = app
            .oneshot(post("/web/get_campaign_status", r#"{"requirement_id": 12}"#))
            .await
            .expect("response");

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["campaign_exists"], true);
        assert_eq!(json["campaign_id"], 88);
        assert_eq!(json["selected_options"]["linkedinScraper"], true);
        assert_eq!(json["selected_options"]["githubScraper"], false);
    }

    #[tokio::test]
    async fn create_campaign_with_no_options_is_a_validation_error() {
        let gateway = ScriptedGateway::default().on(
            "WHERE bi_primary_id = ? LIMIT 1",
            json!([{"bi_t14s": {"requirement_name": "Rust Engineer"}}]),
        );
        let (app, _dir) = app_with(gateway);
        let response = app
            .oneshot(post("/web/create_campaign", r#"{"requirement_id": 12}"#))
            .await
            .expect("response");

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Please select at least one posting option");
    }

    #[tokio::test]
    async fn unknown_user_name_lookup_is_a_displayable_error() {
        let (app, _dir) = app_with(ScriptedGateway::default());
        let response = app
            .oneshot(post("/web/get_user_name", r#"{"user_id": 42}"#))
            .await
            .expect("response");

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "User not found");
    }

    #[tokio::test]
    async fn non_positive_user_id_is_rejected_before_the_lookup() {
        let (app, _dir) = app_with(ScriptedGateway::default());
        for body in [r#"{"user_id": 0}"#, r#"{"user_id": -3}"#, "{}"] {
            let response = app
                .clone()
                .oneshot(post("/web/get_user_name", body))
                .await
                .expect("response");

            let json = body_json(response).await;
            assert_eq!(json["success"], false);
            assert_eq!(json["error"], "Invalid user ID");
        }
    }

    #[tokio::test]
    async fn non_api_paths_fall_through_to_the_spa() {
        let (app, _dir) = app_with(ScriptedGateway::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/campaigns/12")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn debug_query_flag_enables_the_raw_feature_report() {
        let gateway = ScriptedGateway::default()
            .on(
                "WHERE ref_table_id = ? LIMIT 1",
                json!([{"id": 77}]),
            )
            .on(
                "AND workflow_name != ?",
                json!([{"workflow_name": "Linkedin Scraper"}]),
            )
            .on(
                "GROUP BY source",
                json!([{"source": "linkedin", "profiles": 3}]),
            );
        let (app, _dir) = app_with(gateway);
        let response = app
            .oneshot(post(
                "/web/get_campaign_features?debug=1",
                r#"{"requirement_id": 12}"#,
            ))
            .await
            .expect("response");

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["features"][0]["feature"], "Linkedin Scraper");
        assert_eq!(json["features"][0]["profiles"], 3);
        assert_eq!(json["debug"]["profile_table"], "bi_t20s");
    }
}
