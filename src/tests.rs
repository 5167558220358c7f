//! Integration tests for the travel back-office backend.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{AdminSeed, Config, ImageSearchConfig};
use crate::{create_router, AppState};

const ADMIN_EMAIL: &str = "admin@agencia.test";
const ADMIN_PASSWORD: &str = "admin123";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    state: AppState,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let admin = AdminSeed {
            email: ADMIN_EMAIL.to_string(),
            name: "Admin".to_string(),
            password: Some(ADMIN_PASSWORD.to_string()),
        };

        let config = Config {
            db_path: temp_dir.path().join("test.sqlite"),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            jwt_secret: "test-secret".to_string(),
            session_ttl_hours: 24,
            utc_offset_hours: -3,
            admin: admin.clone(),
            images: ImageSearchConfig {
                unsplash_access_key: None,
                pexels_api_key: None,
                unsplash_url: "http://127.0.0.1:9".to_string(),
                pexels_url: "http://127.0.0.1:9".to_string(),
            },
        };

        let state = AppState::new(config).await.expect("Failed to build state");
        state.repo.init(&admin).await.expect("Failed to seed store");

        let app = create_router(state.clone());

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            state,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token(&self, email: &str, password: &str) -> String {
        let resp = self.login(email, password).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.token(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    fn post(&self, path: &str, token: &str, body: Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token).json(&body)
    }

    fn put(&self, path: &str, token: &str, body: Value) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token).json(&body)
    }

    fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Create an agent and return `(id, token)`.
    async fn agent(&self, admin: &str, email: &str) -> (String, String) {
        let resp = self
            .post(
                "/api/users",
                admin,
                json!({ "name": "Agente", "email": email, "password": "agente123" }),
            )
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let user: Value = resp.json().await.unwrap();
        let id = user["id"].as_str().unwrap().to_string();
        (id, self.token(email, "agente123").await)
    }
}

fn promo(destination: &str) -> Value {
    json!({
        "destination": destination,
        "hotel": "Hotel Central",
        "startDate": "2026-12-01",
        "endDate": "2026-12-06",
        "value": "1.500,00",
        "installments": 10,
        "breakfast": true,
        "departures": { "saoPaulo": true }
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_login_sets_cookie_and_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture.login("ADMIN@agencia.test", ADMIN_PASSWORD).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password").is_none());

    // The cookie alone authenticates
    let token = body["token"].as_str().unwrap();
    let resp = fixture
        .client
        .get(fixture.url("/api/auth/session"))
        .header("cookie", format!("session_token={}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let claims: Value = resp.json().await.unwrap();
    assert_eq!(claims["email"], ADMIN_EMAIL);

    let sessions = fixture.state.repo.sessions.all().await.unwrap();
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;
    let (agent_id, _) = fixture.agent(&admin, "bia@agencia.test").await;

    let resp = fixture
        .delete(&format!("/api/users/{}", agent_id), &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut bodies = Vec::new();
    for (email, password) in [
        ("nobody@agencia.test", "whatever1"),
        (ADMIN_EMAIL, "wrong-password"),
        ("bia@agencia.test", "agente123"),
    ] {
        let resp = fixture.login(email, password).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        bodies.push(resp.text().await.unwrap());
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/promos"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());

    let resp = fixture.get("/api/promos", "not-a-jwt").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_agent_cannot_reach_admin_routes() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;
    let (_, agent) = fixture.agent(&admin, "caio@agencia.test").await;

    for path in ["/api/users", "/api/users/stats", "/api/employees"] {
        let resp = fixture.get(path, &agent).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", path);
    }

    let resp = fixture
        .post("/api/migrate", &agent, json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Promos are open to agents
    let resp = fixture.get("/api/promos", &agent).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_promo_lifecycle() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;

    let resp = fixture
        .post("/api/promos", &admin, promo("Maceió"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["nights"], 5);
    assert_eq!(created["dateRange"], "01/12/2026 a 06/12/2026");

    let resp = fixture
        .get(&format!("/api/promos/{}", id), &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let mut changed = promo("Maceió");
    changed["hotel"] = json!("Hotel Novo");
    let resp = fixture
        .put(&format!("/api/promos/{}", id), &admin, changed)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["hotel"], "Hotel Novo");
    assert_eq!(updated["createdAt"], created["createdAt"]);

    // Upserting an unknown id creates it
    let resp = fixture
        .put("/api/promos/fresh-id", &admin, promo("Gramado"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = fixture
        .delete(&format!("/api/promos?id={}", id), &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let list: Vec<Value> = fixture
        .get("/api/promos", &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "fresh-id");

    let resp = fixture
        .get(&format!("/api/promos/{}", id), &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_promo_validation_reports_details() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;

    let mut bad = promo("Natal");
    bad["allInclusive"] = json!(true);
    bad["departures"] = json!({});
    let resp = fixture
        .post("/api/promos", &admin, bad)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.unwrap();
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert!(details[0].as_str().unwrap().starts_with("mealPlan"));
    assert!(details[1].as_str().unwrap().starts_with("departures"));

    // Unparseable JSON is a plain bad request
    let resp = fixture
        .client
        .post(fixture.url("/api/promos"))
        .bearer_auth(&admin)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_promo_stats_and_csv() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;

    for destination in ["Rio de Janeiro", "Salvador", "Rio de Janeiro"] {
        let resp = fixture
            .post("/api/promos", &admin, promo(destination))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let stats: Value = fixture
        .get("/api/promos/stats", &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["totalPromos"], 3);
    assert_eq!(stats["uniqueDestinations"], 2);
    assert_eq!(stats["mostPopularDestination"]["name"], "Rio de Janeiro");
    assert_eq!(stats["mostPopularDestination"]["count"], 2);
    assert_eq!(stats["averageValue"], 3000.0);
    let daily = stats["dailyCounts"].as_array().unwrap();
    assert_eq!(daily.len(), 30);
    assert_eq!(daily[29]["count"], 3);

    let resp = fixture
        .get("/api/promos/csv?type=today", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"].to_str().unwrap(),
        "text/csv; charset=utf-8"
    );
    let disposition = resp.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"promos-today-"));

    let csv = resp.text().await.unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.starts_with("\"Destino\""));

    let resp = fixture
        .get("/api/promos/csv?type=custom", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_rules() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;

    let session: Value = fixture
        .get("/api/auth/session", &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let admin_id = session["id"].as_str().unwrap().to_string();

    // Only active admin cannot be removed
    let resp = fixture
        .delete(&format!("/api/users/{}", admin_id), &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Email uniqueness is case-insensitive
    let resp = fixture
        .post(
            "/api/users",
            &admin,
            json!({ "name": "Dup", "email": "Admin@Agencia.Test", "password": "123456" }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let (agent_id, _) = fixture.agent(&admin, "duda@agencia.test").await;
    let resp = fixture
        .delete(&format!("/api/users?id={}", agent_id), &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let deactivated: Value = resp.json().await.unwrap();
    assert_eq!(deactivated["active"], false);

    let inactive: Vec<Value> = fixture
        .get("/api/users?active=false", &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);

    let stats: Value = fixture
        .get("/api/users/stats", &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["totalUsers"], 2);
    assert_eq!(stats["activeUsers"], 1);
    assert_eq!(stats["admins"], 1);
}

#[tokio::test]
async fn test_review_fans_out_to_history() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;
    let (agent_id, agent) = fixture.agent(&admin, "eva@agencia.test").await;
    let (other_id, _) = fixture.agent(&admin, "fabi@agencia.test").await;

    for user_id in [&agent_id, &other_id] {
        let resp = fixture
            .post(
                "/api/employees/performance",
                &admin,
                json!({
                    "userId": user_id,
                    "period": "2026-09",
                    "rating": 8.5,
                    "metrics": { "promosCreated": 4, "customerSatisfaction": 4.5 }
                }),
            )
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let user: Value = fixture
        .get(&format!("/api/users/{}", agent_id), &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let history = user["performanceHistory"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["kind"], "review");
    assert_eq!(history[0]["rating"], 8.5);

    // Agents see only their own reviews
    let own: Vec<Value> = fixture
        .get("/api/employees/performance", &agent)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["userId"], agent_id.as_str());

    let resp = fixture
        .get(
            &format!("/api/employees/performance?userId={}", other_id),
            &agent,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = fixture
        .post(
            "/api/employees/performance",
            &agent,
            json!({ "userId": agent_id, "period": "2026-10", "rating": 10 }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let employees: Vec<Value> = fixture
        .get("/api/employees", &admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let eva = employees
        .iter()
        .find(|e| e["id"] == agent_id.as_str())
        .unwrap();
    assert_eq!(eva["reviewCount"], 1);
    assert_eq!(eva["lastReviewPeriod"], "2026-09");
}

#[tokio::test]
async fn test_social_inbox_triage() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;
    let (agent_id, agent) = fixture.agent(&admin, "gabi@agencia.test").await;

    let resp = fixture
        .post(
            "/api/social/instagram",
            &agent,
            json!({
                "action": "receive",
                "sender": { "username": "viajante", "name": "Viajante" },
                "content": "Tem pacote para Bonito?"
            }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let message: Value = resp.json().await.unwrap();
    let id = message["id"].as_str().unwrap().to_string();
    assert_eq!(message["read"], false);

    let resp = fixture
        .post(
            "/api/social/instagram",
            &admin,
            json!({ "action": "assign", "id": id, "assignedTo": agent_id }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = fixture
        .post(
            "/api/social/instagram",
            &agent,
            json!({ "action": "reply", "id": id, "content": "Temos sim!" }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let replied: Value = resp.json().await.unwrap();
    assert_eq!(replied["read"], true);
    assert_eq!(replied["replies"][0]["authorName"], "Agente");

    let unread: Vec<Value> = fixture
        .get("/api/social/instagram?status=unread", &agent)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(unread.is_empty());

    let mine: Vec<Value> = fixture
        .get(
            &format!("/api/social/instagram?assignedTo={}", agent_id),
            &agent,
        )
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);

    let resp = fixture
        .delete(&format!("/api/social/instagram/{}", id), &agent)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_image_search_falls_back_to_placeholder() {
    let fixture = TestFixture::new().await;
    let admin = fixture.admin_token().await;

    let resp = fixture
        .get("/api/images/search?query=Fernando%20de%20Noronha", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let image: Value = resp.json().await.unwrap();
    assert_eq!(image["source"], "placeholder");

    let resp = fixture
        .get("/api/images/search", &admin)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_init_and_migrate() {
    let fixture = TestFixture::new().await;

    // Already seeded by the fixture
    let report: Value = fixture
        .client
        .get(fixture.url("/api/init"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["adminCreated"], false);
    assert_eq!(report["keysCreated"].as_array().unwrap().len(), 0);

    let admin = fixture.admin_token().await;
    fixture
        .post("/api/promos", &admin, promo("Bonito"))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .post("/api/migrate", &admin, json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let report: Value = resp.json().await.unwrap();
    assert_eq!(report["passwordsHashed"], 0);
    assert_eq!(report["historyEntries"], 1);
}
