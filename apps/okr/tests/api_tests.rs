//! Integration tests for the OKR HTTP API.
//!
//! Uses axum-test to drive the router without binding a socket; GitHub is
//! replaced by a small axum server on an ephemeral port.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_test::TestServer;
use okr::api::types::{HealthResponse, TokenResponse, UserJson, VerifyResponse};
use okr::api::{AppState, create_router};
use okr::config::{GithubConfig, ServerConfig};
use okr_core::{SeedSummary, Tracker, UserId};
use serde_json::{Value, json};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

const ADMIN: usize = 0;
const ENG_MANAGER: usize = 1;
const SALES_MANAGER: usize = 2;
const FRONTEND_LEAD: usize = 3;
const FRONTEND_DEV: usize = 5;
const BACKEND_DEV: usize = 7;

struct Fixture {
    server: TestServer,
    state: AppState,
    seed: SeedSummary,
}

impl Fixture {
    fn user(&self, index: usize) -> UserId {
        self.seed.users[index]
    }

    fn token(&self, index: usize) -> String {
        self.state.tokens.issue(self.user(index)).unwrap()
    }

    fn engineering(&self) -> u64 {
        self.seed.departments[0].0
    }

    fn frontend(&self) -> u64 {
        self.seed.teams[0].0
    }

    fn backend(&self) -> u64 {
        self.seed.teams[1].0
    }

    /// Create an individual Engineering objective owned by `owner`.
    async fn objective_for(&self, owner: usize) -> Value {
        let response = self
            .server
            .post("/api/objectives")
            .authorization_bearer(self.token(owner))
            .json(&json!({
                "title": "Ship the new dashboard",
                "type": "individual",
                "timeframe": {"quarter": 2, "year": 2025},
                "department": self.engineering().to_string(),
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    async fn key_result_for(&self, owner: usize, objective: u64) -> Value {
        let response = self
            .server
            .post("/api/key-results")
            .authorization_bearer(self.token(owner))
            .json(&json!({
                "objective": objective,
                "title": "Weekly active users",
                "metricType": "number",
                "startValue": 0,
                "targetValue": "100",
                "unit": "users",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        jwt_secret: Some("test-secret".to_string()),
        rate_limit: 0,
        ..ServerConfig::default()
    }
}

/// Test server over a seeded in-memory tracker.
fn create_test_server() -> Fixture {
    create_server_with(test_config())
}

fn create_server_with(config: ServerConfig) -> Fixture {
    let mut tracker = Tracker::in_memory().unwrap();
    let seed = tracker.seed_demo_data().unwrap();
    let state = AppState::new(tracker, config).unwrap();
    let server = TestServer::new(create_router(state.clone())).unwrap();
    Fixture {
        server,
        state,
        seed,
    }
}

/// Serve a minimal GitHub on an ephemeral port and return its base URL.
///
/// - the token endpoint accepts only `good-code`, and otherwise answers 200
///   with an `error` field as GitHub does
/// - `/user` hides the email, so the client has to read `/user/emails`
async fn spawn_github_stub() -> String {
    async fn access_token(Json(body): Json<Value>) -> Json<Value> {
        if body["code"] == "good-code" && body["client_secret"] == "stub-secret" {
            Json(json!({"access_token": "gho_stub", "token_type": "bearer"}))
        } else {
            Json(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired.",
            }))
        }
    }

    fn authorized(headers: &HeaderMap) -> Result<(), StatusCode> {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if bearer == Some("Bearer gho_stub") {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }

    async fn user(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        authorized(&headers)?;
        Ok(Json(json!({
            "id": 583231,
            "login": "octocat",
            "name": "The Octocat",
            "email": null,
        })))
    }

    async fn emails(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        authorized(&headers)?;
        Ok(Json(json!([
            {"email": "octo@old.example.com", "primary": false, "verified": true},
            {"email": "octocat@example.com", "primary": true, "verified": true},
        ])))
    }

    let router = Router::new()
        .route("/login/oauth/access_token", post(access_token))
        .route("/user", get(user))
        .route("/user/emails", get(emails));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn create_github_server() -> Fixture {
    let base = spawn_github_stub().await;
    create_server_with(ServerConfig {
        github: GithubConfig {
            client_id: Some("stub-client".to_string()),
            client_secret: Some("stub-secret".to_string()),
            callback_url: None,
            oauth_url: base.clone(),
            api_url: base,
        },
        ..test_config()
    })
}

fn location(response: &axum_test::TestResponse) -> String {
    response
        .header(header::LOCATION)
        .to_str()
        .unwrap()
        .to_string()
}

fn id_of(document: &Value) -> u64 {
    document["_id"].as_u64().unwrap()
}

// =============================================================================
// HEALTH & ROUTING
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = create_test_server();

    let response = fixture.server.get("/api/health").await;

    response.assert_status_ok();
    let body: HealthResponse = response.json();
    assert_eq!(body.status, "OK");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let fixture = create_test_server();

    let response = fixture.server.get("/api/nope").await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"], "Not found");
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let fixture = create_test_server();

    let response = fixture.server.get("/api/objectives").await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "No token provided");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/objectives")
        .authorization_bearer("not.a.token")
        .await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "Invalid token");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let fixture = create_test_server();
    let foreign = okr::api::TokenIssuer::new("other-secret", 7)
        .issue(fixture.user(ADMIN))
        .unwrap();

    let response = fixture
        .server
        .get("/api/auth/verify")
        .authorization_bearer(foreign)
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let fixture = create_test_server();
    let token = fixture.state.tokens.issue(UserId(9_999)).unwrap();

    let response = fixture
        .server
        .get("/api/auth/verify")
        .authorization_bearer(token)
        .await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "User not found");
}

#[tokio::test]
async fn test_verify_returns_current_user() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/auth/verify")
        .authorization_bearer(fixture.token(ENG_MANAGER))
        .await;

    response.assert_status_ok();
    let body: VerifyResponse = response.json();
    assert_eq!(body.user.id, fixture.user(ENG_MANAGER).0);
    assert_eq!(body.user.email, "eng.manager@example.com");
    assert_eq!(body.user.department, Some(fixture.engineering()));
}

#[tokio::test]
async fn test_okta_callback_issues_usable_token() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .post("/api/auth/okta/callback")
        .json(&json!({
            "oktaId": "00u-new-hire",
            "email": "new.hire@example.com",
            "name": "New Hire",
        }))
        .await;

    response.assert_status_ok();
    let body: TokenResponse = response.json();
    assert_eq!(body.user.email, "new.hire@example.com");
    assert_eq!(body.user.okta_id.as_deref(), Some("00u-new-hire"));

    let verify = fixture
        .server
        .get("/api/auth/verify")
        .authorization_bearer(body.token)
        .await;
    verify.assert_status_ok();
    assert_eq!(verify.json::<VerifyResponse>().user.id, body.user.id);
}

#[tokio::test]
async fn test_okta_callback_is_idempotent() {
    let fixture = create_test_server();
    let profile = json!({
        "oktaId": "00u-repeat",
        "email": "repeat@example.com",
        "name": "Repeat Visitor",
    });

    let first: TokenResponse = fixture
        .server
        .post("/api/auth/okta/callback")
        .json(&profile)
        .await
        .json();
    let second: TokenResponse = fixture
        .server
        .post("/api/auth/okta/callback")
        .json(&profile)
        .await
        .json();

    assert_eq!(first.user.id, second.user.id);
}

#[tokio::test]
async fn test_github_login_without_configuration() {
    let fixture = create_test_server();

    let response = fixture.server.get("/api/auth/github").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.json::<Value>()["error"],
        "GitHub sign-in is not configured"
    );
}

#[tokio::test]
async fn test_github_callback_failure_redirects_to_login() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/auth/github/callback")
        .add_query_param("error", "access_denied")
        .await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "http://localhost:3000/login");
}

#[tokio::test]
async fn test_github_login_redirects_to_authorize() {
    let fixture = create_github_server().await;

    let response = fixture.server.get("/api/auth/github").await;

    response.assert_status(StatusCode::FOUND);
    let target = location(&response);
    assert!(target.contains("/login/oauth/authorize?"), "{}", target);
    assert!(target.contains("client_id=stub-client"), "{}", target);
    assert!(target.contains("scope=user%3Aemail"), "{}", target);
}

#[tokio::test]
async fn test_github_callback_signs_in_with_private_email() {
    let fixture = create_github_server().await;

    let response = fixture
        .server
        .get("/api/auth/github/callback")
        .add_query_param("code", "good-code")
        .await;

    response.assert_status(StatusCode::FOUND);
    let target = location(&response);
    let token = target
        .strip_prefix("http://localhost:3000/auth/callback?token=")
        .unwrap_or_else(|| panic!("unexpected redirect: {}", target))
        .to_string();

    let verify = fixture
        .server
        .get("/api/auth/verify")
        .authorization_bearer(&token)
        .await;
    verify.assert_status_ok();
    let body: VerifyResponse = verify.json();
    assert_eq!(body.user.email, "octocat@example.com");
    assert_eq!(body.user.name, "The Octocat");

    let again = fixture
        .server
        .get("/api/auth/github/callback")
        .add_query_param("code", "good-code")
        .await;
    let second = location(&again);
    let second_token = second
        .strip_prefix("http://localhost:3000/auth/callback?token=")
        .unwrap()
        .to_string();
    let second_user: VerifyResponse = fixture
        .server
        .get("/api/auth/verify")
        .authorization_bearer(&second_token)
        .await
        .json();
    assert_eq!(second_user.user.id, body.user.id);
}

#[tokio::test]
async fn test_github_rejected_code_redirects_to_login() {
    let fixture = create_github_server().await;

    let response = fixture
        .server
        .get("/api/auth/github/callback")
        .add_query_param("code", "stale-code")
        .await;

    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "http://localhost:3000/login");
}

// =============================================================================
// OBJECTIVES
// =============================================================================

#[tokio::test]
async fn test_create_objective_defaults_owner_to_caller() {
    let fixture = create_test_server();

    let objective = fixture.objective_for(FRONTEND_DEV).await;

    assert_eq!(objective["owner"]["_id"], fixture.user(FRONTEND_DEV).0);
    assert_eq!(objective["department"]["name"], "Engineering");
    assert_eq!(objective["progress"], 0);
    assert_eq!(objective["status"], "draft");
}

#[tokio::test]
async fn test_create_objective_validation_error() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .post("/api/objectives")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .json(&json!({
            "title": "Missing department",
            "type": "department",
            "timeframe": {"quarter": 1, "year": 2025},
        }))
        .await;

    response.assert_status_bad_request();
    let error = response.json::<Value>()["error"].as_str().unwrap().to_string();
    assert!(error.contains("department"), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .post("/api/objectives")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status_bad_request();
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/objectives/abc")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_missing_objective_is_not_found() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/objectives/9999")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .await;

    response.assert_status_not_found();
    assert_eq!(response.json::<Value>()["error"], "Objective not found");
}

#[tokio::test]
async fn test_list_filters_by_owner() {
    let fixture = create_test_server();
    fixture.objective_for(FRONTEND_DEV).await;
    fixture.objective_for(BACKEND_DEV).await;

    let response = fixture
        .server
        .get("/api/objectives")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .add_query_param("owner", fixture.user(FRONTEND_DEV).0)
        .await;

    response.assert_status_ok();
    let list = response.json::<Vec<Value>>();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["owner"]["_id"], fixture.user(FRONTEND_DEV).0);
    assert!(list[0]["keyResults"].is_array());
}

#[tokio::test]
async fn test_list_filters_by_team_members() {
    let fixture = create_test_server();
    fixture.objective_for(FRONTEND_DEV).await;
    fixture.objective_for(BACKEND_DEV).await;

    let response = fixture
        .server
        .get("/api/objectives")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .add_query_param("team", fixture.backend())
        .await;

    let list = response.json::<Vec<Value>>();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["owner"]["_id"], fixture.user(BACKEND_DEV).0);
}

#[tokio::test]
async fn test_list_rejects_invalid_type_filter() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/objectives")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .add_query_param("type", "galactic")
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_individual_cannot_edit_someone_elses_objective() {
    let fixture = create_test_server();
    let objective = fixture.objective_for(FRONTEND_DEV).await;

    let response = fixture
        .server
        .put(&format!("/api/objectives/{}", id_of(&objective)))
        .authorization_bearer(fixture.token(BACKEND_DEV))
        .json(&json!({"title": "Hijacked"}))
        .await;

    response.assert_status_forbidden();
    assert_eq!(
        response.json::<Value>()["error"],
        "Not authorized to edit this objective"
    );
}

#[tokio::test]
async fn test_department_manager_can_edit_objective() {
    let fixture = create_test_server();
    let objective = fixture.objective_for(FRONTEND_DEV).await;
    let path = format!("/api/objectives/{}", id_of(&objective));

    let response = fixture
        .server
        .put(&path)
        .authorization_bearer(fixture.token(ENG_MANAGER))
        .json(&json!({"status": "active"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "active");

    let other = fixture
        .server
        .put(&path)
        .authorization_bearer(fixture.token(SALES_MANAGER))
        .json(&json!({"status": "completed"}))
        .await;
    other.assert_status_forbidden();
}

#[tokio::test]
async fn test_team_lead_can_edit_team_objective() {
    let fixture = create_test_server();
    let created = fixture
        .server
        .post("/api/objectives")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .json(&json!({
            "title": "Faster page loads",
            "type": "team",
            "timeframe": {"quarter": 3, "year": 2025},
            "department": fixture.engineering(),
            "team": {"_id": fixture.frontend()},
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let objective = created.json::<Value>();
    assert_eq!(objective["team"]["name"], "Frontend");

    let response = fixture
        .server
        .put(&format!("/api/objectives/{}", id_of(&objective)))
        .authorization_bearer(fixture.token(FRONTEND_LEAD))
        .json(&json!({"description": "Under two seconds"}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["description"], "Under two seconds");
}

#[tokio::test]
async fn test_only_owner_or_admin_deletes_objective() {
    let fixture = create_test_server();
    let objective = fixture.objective_for(FRONTEND_DEV).await;
    let key_result = fixture
        .key_result_for(FRONTEND_DEV, id_of(&objective))
        .await;
    let path = format!("/api/objectives/{}", id_of(&objective));

    let denied = fixture
        .server
        .delete(&path)
        .authorization_bearer(fixture.token(ENG_MANAGER))
        .await;
    denied.assert_status_forbidden();

    let deleted = fixture
        .server
        .delete(&path)
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .await;
    deleted.assert_status_ok();
    assert_eq!(
        deleted.json::<Value>()["message"],
        "Objective and key results deleted"
    );

    let gone = fixture
        .server
        .get(&path)
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .await;
    gone.assert_status_not_found();

    let orphans = fixture
        .server
        .get(&format!("/api/key-results/objective/{}", id_of(&objective)))
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .await;
    orphans.assert_status_ok();
    assert!(orphans.json::<Vec<Value>>().is_empty());

    let stale = fixture
        .server
        .delete(&format!("/api/key-results/{}", id_of(&key_result)))
        .authorization_bearer(fixture.token(ADMIN))
        .await;
    stale.assert_status_not_found();
}

// =============================================================================
// KEY RESULTS
// =============================================================================

#[tokio::test]
async fn test_key_result_create_starts_at_start_value() {
    let fixture = create_test_server();
    let objective = fixture.objective_for(FRONTEND_DEV).await;

    let key_result = fixture
        .key_result_for(FRONTEND_DEV, id_of(&objective))
        .await;

    assert_eq!(key_result["currentValue"], 0.0);
    assert_eq!(key_result["targetValue"], 100.0);
    assert_eq!(key_result["progress"], 0);
    assert_eq!(key_result["status"], "at_risk");
    assert_eq!(key_result["confidenceHistory"].as_array().unwrap().len(), 1);
    assert_eq!(key_result["progressHistory"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_key_result_update_recomputes_progress_and_rollup() {
    let fixture = create_test_server();
    let objective = fixture.objective_for(FRONTEND_DEV).await;
    let key_result = fixture
        .key_result_for(FRONTEND_DEV, id_of(&objective))
        .await;

    let response = fixture
        .server
        .put(&format!("/api/key-results/{}", id_of(&key_result)))
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .json(&json!({"currentValue": "60"}))
        .await;

    response.assert_status_ok();
    let updated = response.json::<Value>();
    assert_eq!(updated["progress"], 60);
    assert_eq!(updated["status"], "on_track");
    assert_eq!(updated["progressHistory"].as_array().unwrap().len(), 2);

    let detail = fixture
        .server
        .get(&format!("/api/objectives/{}", id_of(&objective)))
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .await
        .json::<Value>();
    assert_eq!(detail["objective"]["progress"], 60);
    assert_eq!(detail["keyResults"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_key_result_completed_when_target_met() {
    let fixture = create_test_server();
    let objective = fixture.objective_for(FRONTEND_DEV).await;
    let key_result = fixture
        .key_result_for(FRONTEND_DEV, id_of(&objective))
        .await;

    let updated = fixture
        .server
        .put(&format!("/api/key-results/{}", id_of(&key_result)))
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .json(&json!({"currentValue": 150}))
        .await
        .json::<Value>();

    assert_eq!(updated["progress"], 100);
    assert_eq!(updated["status"], "completed");
}

#[tokio::test]
async fn test_key_result_write_requires_objective_owner() {
    let fixture = create_test_server();
    let objective = fixture.objective_for(FRONTEND_DEV).await;
    let key_result = fixture
        .key_result_for(FRONTEND_DEV, id_of(&objective))
        .await;

    let response = fixture
        .server
        .put(&format!("/api/key-results/{}", id_of(&key_result)))
        .authorization_bearer(fixture.token(ENG_MANAGER))
        .json(&json!({"currentValue": 10}))
        .await;

    response.assert_status_forbidden();
    assert_eq!(
        response.json::<Value>()["error"],
        "Not authorized to edit this key result"
    );
}

#[tokio::test]
async fn test_confidence_update_records_one_entry() {
    let fixture = create_test_server();
    let objective = fixture.objective_for(FRONTEND_DEV).await;
    let key_result = fixture
        .key_result_for(FRONTEND_DEV, id_of(&objective))
        .await;
    let path = format!("/api/key-results/{}", id_of(&key_result));

    fixture
        .server
        .put(&path)
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .json(&json!({"currentValue": 80}))
        .await
        .assert_status_ok();

    let response = fixture
        .server
        .patch(&format!("{}/confidence", path))
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .json(&json!({"confidenceLevel": "high", "note": "Launch went well"}))
        .await;

    response.assert_status_ok();
    let updated = response.json::<Value>();
    assert_eq!(updated["confidenceLevel"], "high");
    assert_eq!(updated["status"], "on_track");
    let history = updated["confidenceHistory"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["note"], "Launch went well");
}

#[tokio::test]
async fn test_key_result_for_missing_objective() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .post("/api/key-results")
        .authorization_bearer(fixture.token(ADMIN))
        .json(&json!({
            "objective": 9_999,
            "title": "Orphan",
            "metricType": "percentage",
            "startValue": 0,
            "targetValue": 100,
        }))
        .await;

    response.assert_status_not_found();
}

// =============================================================================
// ORGANIZATION
// =============================================================================

#[tokio::test]
async fn test_departments_are_listed_with_managers() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/departments")
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .await;

    response.assert_status_ok();
    let list = response.json::<Vec<Value>>();
    assert_eq!(list.len(), 2);
    let engineering = list.iter().find(|d| d["name"] == "Engineering").unwrap();
    assert_eq!(engineering["manager"]["email"], "eng.manager@example.com");
}

#[tokio::test]
async fn test_department_writes_are_admin_only() {
    let fixture = create_test_server();
    let body = json!({"name": "Marketing", "description": "Brand and growth"});

    let denied = fixture
        .server
        .post("/api/departments")
        .authorization_bearer(fixture.token(ENG_MANAGER))
        .json(&body)
        .await;
    denied.assert_status_forbidden();
    assert_eq!(denied.json::<Value>()["error"], "Admin access required");

    let created = fixture
        .server
        .post("/api/departments")
        .authorization_bearer(fixture.token(ADMIN))
        .json(&body)
        .await;
    created.assert_status(StatusCode::CREATED);
    let department = created.json::<Value>();
    assert_eq!(department["name"], "Marketing");
    assert!(department["manager"].is_null());

    let managed = fixture
        .server
        .patch(&format!("/api/departments/{}/manager", id_of(&department)))
        .authorization_bearer(fixture.token(ADMIN))
        .json(&json!({"managerId": fixture.user(SALES_MANAGER).0.to_string()}))
        .await;
    managed.assert_status_ok();
    assert_eq!(
        managed.json::<Value>()["manager"]["_id"],
        fixture.user(SALES_MANAGER).0
    );
}

#[tokio::test]
async fn test_team_membership_endpoints() {
    let fixture = create_test_server();

    let created = fixture
        .server
        .post("/api/teams")
        .authorization_bearer(fixture.token(ADMIN))
        .json(&json!({
            "name": "Platform",
            "department": fixture.engineering(),
            "teamLead": "",
            "members": [fixture.user(BACKEND_DEV).0, ""],
        }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let team = created.json::<Value>();
    assert!(team["teamLead"].is_null());
    assert_eq!(team["members"].as_array().unwrap().len(), 1);

    let lead = fixture
        .server
        .patch(&format!("/api/teams/{}/lead", id_of(&team)))
        .authorization_bearer(fixture.token(ADMIN))
        .json(&json!({"leadId": fixture.user(FRONTEND_LEAD).0}))
        .await;
    lead.assert_status_ok();
    assert_eq!(
        lead.json::<Value>()["teamLead"]["_id"],
        fixture.user(FRONTEND_LEAD).0
    );

    let members = fixture
        .server
        .patch(&format!("/api/teams/{}/members", id_of(&team)))
        .authorization_bearer(fixture.token(ADMIN))
        .json(&json!({"members": [fixture.user(FRONTEND_DEV).0, fixture.user(BACKEND_DEV).0]}))
        .await;
    members.assert_status_ok();
    assert_eq!(members.json::<Value>()["members"].as_array().unwrap().len(), 2);

    let denied = fixture
        .server
        .patch(&format!("/api/teams/{}/members", id_of(&team)))
        .authorization_bearer(fixture.token(FRONTEND_LEAD))
        .json(&json!({"members": []}))
        .await;
    denied.assert_status_forbidden();
}

// =============================================================================
// USERS
// =============================================================================

#[tokio::test]
async fn test_user_list_is_admin_only() {
    let fixture = create_test_server();

    fixture
        .server
        .get("/api/users")
        .authorization_bearer(fixture.token(ENG_MANAGER))
        .await
        .assert_status_forbidden();

    let response = fixture
        .server
        .get("/api/users")
        .authorization_bearer(fixture.token(ADMIN))
        .await;
    response.assert_status_ok();
    let users = response.json::<Vec<Value>>();
    assert_eq!(users.len(), 9);
    assert!(users.iter().all(|u| u.get("githubAccessToken").is_none()));
}

#[tokio::test]
async fn test_any_user_can_read_a_profile() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get(&format!("/api/users/{}", fixture.user(ENG_MANAGER).0))
        .authorization_bearer(fixture.token(FRONTEND_DEV))
        .await;

    response.assert_status_ok();
    let user: UserJson = response.json();
    assert_eq!(user.email, "eng.manager@example.com");
    assert_eq!(user.department.map(|d| d.name).as_deref(), Some("Engineering"));
}

#[tokio::test]
async fn test_moving_user_between_teams() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .patch(&format!("/api/users/{}", fixture.user(FRONTEND_DEV).0))
        .authorization_bearer(fixture.token(ADMIN))
        .json(&json!({"team": fixture.backend()}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["team"]["name"], "Backend");

    let teams = fixture
        .server
        .get("/api/teams")
        .authorization_bearer(fixture.token(ADMIN))
        .await
        .json::<Vec<Value>>();
    let member_ids = |name: &str| -> Vec<u64> {
        teams
            .iter()
            .find(|t| t["name"] == name)
            .unwrap()["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(id_of)
            .collect()
    };
    let mover = fixture.user(FRONTEND_DEV).0;
    assert!(!member_ids("Frontend").contains(&mover));
    assert!(member_ids("Backend").contains(&mover));
}

#[tokio::test]
async fn test_deleted_user_loses_access() {
    let fixture = create_test_server();
    let token = fixture.token(BACKEND_DEV);

    let response = fixture
        .server
        .delete(&format!("/api/users/{}", fixture.user(BACKEND_DEV).0))
        .authorization_bearer(fixture.token(ADMIN))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["message"], "User deleted successfully");

    fixture
        .server
        .get("/api/auth/verify")
        .authorization_bearer(token)
        .await
        .assert_status_unauthorized();
}

// =============================================================================
// RATE LIMITING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let fixture = create_server_with(ServerConfig {
        rate_limit: 1,
        ..test_config()
    });

    fixture.server.get("/api/health").await.assert_status_ok();
    let limited = fixture.server.get("/api/health").await;

    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        limited.json::<Value>()["error"],
        "Too many requests, please try again later"
    );
}
