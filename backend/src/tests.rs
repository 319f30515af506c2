//! Integration tests for the kindergarten site backend.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::events::RecordingEvents;
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    events: Arc<RecordingEvents>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config {
            db_path: temp_dir.path().join("test.sqlite"),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            contact_delay: Duration::ZERO,
            ..Config::default()
        };
        adjust(&mut config);

        let events = Arc::new(RecordingEvents::default());
        let state = AppState::build(config, events.clone())
            .await
            .expect("Failed to build state");

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            events,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login_as(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/admin/login"))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await
            .unwrap()
    }

    /// Log in with the default credentials and return the session token.
    async fn login(&self) -> String {
        let resp = self.login_as("admin", "admin123").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("x-session-token", token)
            .send()
            .await
            .unwrap()
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("x-session-token", token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .header("x-session-token", token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .header("x-session-token", token)
            .send()
            .await
            .unwrap()
    }

    async fn contact(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/contact"))
            .header("user-agent", "integration-test")
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn contact_from(&self, forwarded_for: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/contact"))
            .header("user-agent", "integration-test")
            .header("x-forwarded-for", forwarded_for)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

fn valid_contact() -> Value {
    json!({
        "name": "Ayşe Yılmaz",
        "email": "ayse@example.com",
        "message": "Kayıt dönemi hakkında bilgi almak istiyorum."
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
async fn test_admin_routes_require_session() {
    let fixture = TestFixture::new().await;

    for path in ["/api/admin/activities", "/api/admin/stats", "/admin/fragments/messages"] {
        let resp = fixture.client.get(fixture.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", path);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    let resp = fixture.get("/api/admin/activities", "not-a-session").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_default_login_and_logout() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/admin/session"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], "needsCredentialSetup");

    let token = fixture.login().await;
    let body: Value = fixture.get("/api/admin/session", &token).await.json().await.unwrap();
    assert_eq!(body["data"], "loggedIn");

    let resp = fixture.post("/api/admin/logout", &token, json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["notification"]["kind"], "info");

    let resp = fixture.get("/api/admin/activities", &token).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let logins = fixture
        .events
        .events()
        .into_iter()
        .filter(|(_, params)| params["action"] == "admin_login")
        .count();
    assert_eq!(logins, 1);
}

#[tokio::test]
async fn test_bearer_token_is_accepted() {
    let fixture = TestFixture::new().await;
    let token = fixture.login().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/admin/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_lockout() {
    let fixture = TestFixture::new().await;

    for _ in 0..4 {
        let resp = fixture.login_as("admin", "wrong").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    // Fifth failure is still reported as a bad login and arms the lock
    let resp = fixture.login_as("admin", "wrong").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Correct credentials are refused while locked
    let resp = fixture.login_as("admin", "admin123").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "LOCKED_OUT");
    assert!(body["error"]["details"]["retryAfterSecs"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_activity_crud_with_fragments() {
    let fixture = TestFixture::new().await;
    let token = fixture.login().await;

    // Create
    let resp = fixture
        .post(
            "/api/admin/activities",
            &token,
            json!({
                "title": "Müzik ve Dans",
                "date": "2024-02-15",
                "time": "10:30",
                "location": "Müzik Salonu",
                "description": "Ritm ve melodilerle dolu bir sabah",
                "capacity": 20
            }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["title"], "Müzik ve Dans");
    assert!(body["fragment"].as_str().unwrap().contains("Müzik ve Dans"));
    assert!(body["fragment"].as_str().unwrap().contains("20 kişi"));
    assert_eq!(body["notification"]["kind"], "success");

    // A second one lands in front of it
    let resp = fixture
        .post(
            "/api/admin/activities",
            &token,
            json!({"title": "Sanat Atölyesi", "date": "2024-03-01", "location": "Sanat Odası"}),
        )
        .await;
    let second: Value = resp.json().await.unwrap();
    let list: Value = fixture.get("/api/admin/activities", &token).await.json().await.unwrap();
    assert_eq!(list["data"].as_array().unwrap().len(), 2);
    assert_eq!(list["data"][0]["id"], second["data"]["id"]);

    // Get
    let body: Value = fixture
        .get(&format!("/api/admin/activities/{}", id), &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["location"], "Müzik Salonu");

    // Update
    let resp = fixture
        .put(
            &format!("/api/admin/activities/{}", id),
            &token,
            json!({"title": "Müzik Şenliği"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Müzik Şenliği");
    assert_eq!(body["data"]["location"], "Müzik Salonu");
    assert!(body["data"]["updatedAt"].is_string());
    assert!(body["fragment"].as_str().unwrap().contains("Müzik Şenliği"));

    // Delete without confirmation is a no-op
    let body: Value = fixture
        .delete(&format!("/api/admin/activities/{}", id), &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"], "cancelled");
    let resp = fixture.get(&format!("/api/admin/activities/{}", id), &token).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Confirmed delete
    let body: Value = fixture
        .delete(&format!("/api/admin/activities/{}?confirm=true", id), &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"], "deleted");
    assert!(!body["fragment"].as_str().unwrap().contains("Müzik Şenliği"));

    let resp = fixture.get(&format!("/api/admin/activities/{}", id), &token).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_activity_validation_and_missing_ids() {
    let fixture = TestFixture::new().await;
    let token = fixture.login().await;

    let resp = fixture
        .post(
            "/api/admin/activities",
            &token,
            json!({"title": "   ", "date": "2024-02-15", "location": "Bahçe"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let list: Value = fixture.get("/api/admin/activities", &token).await.json().await.unwrap();
    assert!(list["data"].as_array().unwrap().is_empty());

    let resp = fixture
        .put("/api/admin/activities/12345", &token, json!({"title": "Yok"}))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = fixture
        .delete("/api/admin/activities/12345?confirm=true", &token)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blog_post_reaches_public_site() {
    let fixture = TestFixture::new().await;
    let token = fixture.login().await;

    let resp = fixture
        .post(
            "/api/admin/blog",
            &token,
            json!({"title": "Test", "author": "A", "content": "Hello", "category": "egitim", "tags": "okul, oyun"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["tags"], json!(["okul", "oyun"]));
    assert!(body["fragment"].as_str().unwrap().contains("Eğitim"));

    let public: Value = fixture
        .client
        .get(fixture.url("/api/public/blog"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let posts = public["data"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Test");
    assert_eq!(posts[0]["author"], "A");
    assert_eq!(posts[0]["content"], "Hello");

    let html = fixture
        .client
        .get(fixture.url("/fragments/blog"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("blog-card"));
    assert!(html.contains("Hello"));

    let resp = fixture
        .post(
            "/api/admin/blog",
            &token,
            json!({"title": "Kategori", "author": "A", "content": "İçerik", "category": "spor"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_public_page_renders_site_name() {
    let fixture = TestFixture::with_config(|config| {
        config.site_name = "Minik Adımlar Anaokulu".to_string();
    })
    .await;

    let resp = fixture.client.get(fixture.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = resp.text().await.unwrap();
    assert!(html.contains("<title>Minik Adımlar Anaokulu</title>"));
    assert!(html.contains("Henüz etkinlik eklenmemiş"));
}

#[tokio::test]
async fn test_contact_submission_and_rate_limit() {
    let fixture = TestFixture::new().await;

    let resp = fixture.contact(valid_contact()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["notification"]["kind"], "success");

    let resp = fixture.contact(valid_contact()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "RATE_LIMITED");

    let token = fixture.login().await;
    let list: Value = fixture.get("/api/admin/messages", &token).await.json().await.unwrap();
    let messages = list["data"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["read"], false);
    assert_eq!(messages[0]["userAgent"], "integration-test");

    let submissions: Vec<_> = fixture
        .events
        .events()
        .into_iter()
        .filter(|(name, _)| name == "form_submission")
        .collect();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].1["success"], true);
}

#[tokio::test]
async fn test_contact_validation_reports_fields() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .contact(json!({"name": "A", "email": "not-an-email", "message": "kısa"}))
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    let details = &body["error"]["details"];
    assert!(details["name"].is_string());
    assert!(details["email"].is_string());
    assert!(details["message"].is_string());

    // A rejected submission does not start the rate-limit window
    let resp = fixture.contact(valid_contact()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_contact_rate_limit_is_per_client() {
    let fixture = TestFixture::new().await;

    let resp = fixture.contact_from("203.0.113.5", valid_contact()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // A different parent is not held up by the first one
    let resp = fixture.contact_from("203.0.113.6", valid_contact()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = fixture.contact_from("203.0.113.5", valid_contact()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // No forwarded header: keyed by the peer address
    let resp = fixture.contact(valid_contact()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let token = fixture.login().await;
    let list: Value = fixture.get("/api/admin/messages", &token).await.json().await.unwrap();
    let ips: Vec<_> = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["ip"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(ips, vec!["127.0.0.1", "203.0.113.6", "203.0.113.5"]);
}

#[tokio::test]
async fn test_contact_validation_checked_before_rate_limit() {
    let fixture = TestFixture::new().await;

    let resp = fixture.contact(valid_contact()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Inside the window an invalid form still reports its field errors
    let resp = fixture.contact(json!({"name": "", "email": "x", "message": ""})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_message_read_state_and_filters() {
    let fixture = TestFixture::with_config(|config| {
        config.contact_interval = Duration::ZERO;
    })
    .await;

    fixture.contact(valid_contact()).await;
    fixture.contact(valid_contact()).await;

    let token = fixture.login().await;
    let list: Value = fixture.get("/api/admin/messages", &token).await.json().await.unwrap();
    let id = list["data"][1]["id"].as_i64().unwrap();

    let resp = fixture
        .put(&format!("/api/admin/messages/{}/read?filter=unread", id), &token, json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["read"], true);
    assert_eq!(body["fragment"].as_str().unwrap().matches("data-id").count(), 1);

    // Marking again changes nothing
    let resp = fixture
        .put(&format!("/api/admin/messages/{}/read", id), &token, json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let read: Value = fixture
        .get("/api/admin/messages?filter=read", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(read["data"].as_array().unwrap().len(), 1);
    assert_eq!(read["data"][0]["id"], id);

    let stats: Value = fixture.get("/api/admin/stats", &token).await.json().await.unwrap();
    assert_eq!(stats["data"]["messages"], 2);
    assert_eq!(stats["data"]["unreadMessages"], 1);

    fixture
        .put(&format!("/api/admin/messages/{}/unread", id), &token, json!({}))
        .await;
    let html = fixture
        .get("/admin/fragments/messages?filter=read", &token)
        .await
        .text()
        .await
        .unwrap();
    assert!(html.contains("Okunmuş mesaj bulunmuyor"));

    let resp = fixture
        .delete(&format!("/api/admin/messages/{}?confirm=true", id), &token)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let list: Value = fixture.get("/api/admin/messages", &token).await.json().await.unwrap();
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let resp = fixture
        .put("/api/admin/messages/1/read", &token, json!({}))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_export_download() {
    let fixture = TestFixture::new().await;
    let token = fixture.login().await;
    fixture
        .post(
            "/api/admin/activities",
            &token,
            json!({"title": "Bahar Şenliği", "date": "2024-04-20", "location": "Bahçe"}),
        )
        .await;

    let resp = fixture.get("/api/admin/export", &token).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"anaokulu-backup-"));
    assert!(disposition.ends_with(".json\""));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["activities"].as_array().unwrap().len(), 1);
    assert!(body["blogPosts"].as_array().unwrap().is_empty());
    assert!(body["contactMessages"].as_array().unwrap().is_empty());
    assert!(body["exportDate"].is_string());
}

#[tokio::test]
async fn test_credential_setup_flow() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/admin/setup"))
        .json(&json!({"username": "mudur", "password": "Guvenli1", "confirmPassword": "Farkli1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = fixture
        .client
        .post(fixture.url("/api/admin/setup"))
        .json(&json!({"username": "mudur", "password": "Guvenli1", "confirmPassword": "Guvenli1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();
    assert!(body["data"]["expiresInSecs"].as_u64().unwrap() > 0);

    let body: Value = fixture.get("/api/admin/session", &token).await.json().await.unwrap();
    assert_eq!(body["data"], "loggedIn");

    // Defaults no longer work; the configured pair does
    let resp = fixture.login_as("admin", "admin123").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = fixture.login_as("mudur", "Guvenli1").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = fixture
        .client
        .post(fixture.url("/api/admin/setup"))
        .json(&json!({"username": "baska", "password": "Guvenli2", "confirmPassword": "Guvenli2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Reset brings the defaults back
    let resp = fixture.post("/api/admin/reset", &token, json!({})).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = fixture.login_as("admin", "admin123").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_change_password() {
    let fixture = TestFixture::new().await;
    let token = fixture.login().await;

    let resp = fixture
        .post(
            "/api/admin/password",
            &token,
            json!({"currentPassword": "yanlis", "newPassword": "Yeni123", "confirmPassword": "Yeni123"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = fixture
        .post(
            "/api/admin/password",
            &token,
            json!({"currentPassword": "admin123", "newPassword": "Yeni123", "confirmPassword": "Yeni123"}),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = fixture.login_as("admin", "admin123").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = fixture.login_as("admin", "Yeni123").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_strength_endpoint() {
    let fixture = TestFixture::new().await;

    for (password, expected) in [("abc", "weak"), ("abcdef1", "medium"), ("Abcdef1!", "strong")] {
        let body: Value = fixture
            .client
            .post(fixture.url("/api/admin/password-strength"))
            .json(&json!({"password": password}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"], expected, "{}", password);
    }
}
