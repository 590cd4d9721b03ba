use chrono::{Duration, Utc};
use depot_auth::{JwtClaims, Principal, menus};
use depot_core::UserId;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "black-box-secret";
const ADMIN_PASSWORD: &str = "black-box-admin";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a seeded in-memory store, on an ephemeral port.
        let services = depot_api::app::in_memory_services(ADMIN_PASSWORD)
            .await
            .expect("failed to seed in-memory store");
        let app = depot_api::app::build_app(services, JWT_SECRET.as_bytes(), Duration::minutes(10));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token(&self, username: &str, password: &str) -> String {
        let res = self.login(username, password).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, user_id: UserId, username: &str) -> String {
    let claims = JwtClaims::for_principal(&Principal::new(user_id, username), Utc::now(), Duration::minutes(10));
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Creates a supplier and a goods type, returning their ids.
async fn catalog_fixture(server: &TestServer, token: &str) -> (String, String) {
    let res = server
        .post(token, "/suppliers", json!({ "name": "Acme Trading" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let supplier: Value = res.json().await.unwrap();

    let res = server
        .post(token, "/goods-types", json!({ "name": "Beverages" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let goods_type: Value = res.json().await.unwrap();

    (
        supplier["id"].as_str().unwrap().to_string(),
        goods_type["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_is_public_and_everything_else_needs_a_token() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let forged = mint_jwt("some-other-secret", UserId::new(), "admin");
    let res = server.get(&forged, "/whoami").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_failures_share_one_response() {
    let server = TestServer::spawn().await;

    let unknown = server.login("nobody", ADMIN_PASSWORD).await;
    let wrong = server.login("admin", "not-the-password").await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown: Value = unknown.json().await.unwrap();
    let wrong: Value = wrong.json().await.unwrap();
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn admin_login_resolves_every_menu() {
    let server = TestServer::spawn().await;
    let token = server.token("admin", ADMIN_PASSWORD).await;

    let res = server.get(&token, "/whoami").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["username"], "admin");

    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    for menu in menus::ALL {
        assert!(permissions.contains(&menu.as_str()), "missing {}", menu.as_str());
    }
}

#[tokio::test]
async fn token_of_a_vanished_user_is_rejected() {
    let server = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET, UserId::new(), "ghost");

    let res = server.get(&token, "/purchases/list").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn purchase_document_lifecycle() {
    let server = TestServer::spawn().await;
    let token = server.token("admin", ADMIN_PASSWORD).await;
    let (supplier_id, type_id) = catalog_fixture(&server, &token).await;

    let res = server.get(&token, "/purchases/number?date=2026-06-01").await;
    assert_eq!(res.status(), StatusCode::OK);
    let number: Value = res.json().await.unwrap();
    assert_eq!(number["number"], "JH202606010001");

    let res = server
        .post(
            &token,
            "/purchases/save",
            json!({
                "number": "JH202606010001",
                "supplier_id": supplier_id,
                "date": "2026-06-01",
                "amount_payable": 40,
                "state": "2",
                "lines": [
                    { "code": "A1", "name": "Apple juice", "price": 10, "num": 3, "type_id": type_id },
                    { "code": "B2", "name": "Still water", "price": 5, "num": 2, "type_id": type_id },
                ],
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let saved: Value = res.json().await.unwrap();
    let id = saved["id"].as_str().unwrap().to_string();
    assert_eq!(saved["state"], "outstanding");

    // The next number moves past the saved one.
    let number: Value = server
        .get(&token, "/purchases/number?date=2026-06-01")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(number["number"], "JH202606010002");

    let listed: Value = server
        .get(&token, &format!("/purchases/list?supplier_id={supplier_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let lines: Value = server
        .get(&token, &format!("/purchases/goods?purchase_list_id={id}&code_or_name=water"))
        .await
        .json()
        .await
        .unwrap();
    let lines = lines.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["code"], "B2");

    let rows: Value = server
        .get(&token, "/purchases/count?start=2026-06-01&end=2026-06-30")
        .await
        .json()
        .await
        .unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["supplier_name"], "Acme Trading");
    assert_eq!(rows[0]["goods_type"], "Beverages");

    let res = server
        .post(&token, "/purchases/state", json!({ "id": id, "state": "settled" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["state"], "settled");
    assert_eq!(updated["amount_payable"], 40);

    let res = server.post(&token, "/purchases/delete", json!({ "id": id })).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let listed: Value = server.get(&token, "/purchases/list").await.json().await.unwrap();
    assert!(listed.as_array().unwrap().is_empty());

    let res = server.post(&token, "/purchases/delete", json!({ "id": id })).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let logs: Value = server.get(&token, "/logs?kind=DELETE").await.json().await.unwrap();
    let entries = logs["entries"].as_array().unwrap();
    assert!(
        entries
            .iter()
            .any(|e| e["description"].as_str().unwrap().contains("JH202606010001"))
    );
}

#[tokio::test]
async fn duplicate_number_is_a_validation_error() {
    let server = TestServer::spawn().await;
    let token = server.token("admin", ADMIN_PASSWORD).await;
    let (supplier_id, type_id) = catalog_fixture(&server, &token).await;

    let body = json!({
        "number": "JH202606010001",
        "supplier_id": supplier_id,
        "date": "2026-06-01",
        "amount_payable": 10,
        "state": "1",
        "lines": [{ "code": "A1", "name": "Apple juice", "price": 10, "num": 1, "type_id": type_id }],
    });
    let res = server.post(&token, "/purchases/save", body.clone()).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = server.post(&token, "/purchases/save", body).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");
}

#[tokio::test]
async fn malformed_date_is_rejected() {
    let server = TestServer::spawn().await;
    let token = server.token("admin", ADMIN_PASSWORD).await;

    let res = server.get(&token, "/purchases/list?start=06/01/2026").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "validation_error");
}

#[tokio::test]
async fn user_without_menus_is_forbidden() {
    let server = TestServer::spawn().await;
    let admin = server.token("admin", ADMIN_PASSWORD).await;

    let res = server
        .post(&admin, "/admin/users", json!({ "username": "clerk", "password": "clerk-pass" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let clerk = server.token("clerk", "clerk-pass").await;
    let res = server.get(&clerk, "/purchases/list").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "forbidden");

    let res = server.get(&clerk, "/logs").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn granted_role_takes_effect_on_the_next_request() {
    let server = TestServer::spawn().await;
    let admin = server.token("admin", ADMIN_PASSWORD).await;

    let user: Value = server
        .post(&admin, "/admin/users", json!({ "username": "auditor", "password": "auditor-pass" }))
        .await
        .json()
        .await
        .unwrap();
    let role: Value = server
        .post(&admin, "/admin/roles", json!({ "name": "log reader" }))
        .await
        .json()
        .await
        .unwrap();
    let all_menus: Value = server.get(&admin, "/admin/menus").await.json().await.unwrap();
    let log_menu = all_menus
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["name"] == menus::SYSTEM_LOG.as_str())
        .unwrap()["id"]
        .clone();

    let auditor = server.token("auditor", "auditor-pass").await;
    assert_eq!(server.get(&auditor, "/logs").await.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .put(server.url(&format!("/admin/roles/{}/menus", role["id"].as_str().unwrap())))
        .bearer_auth(&admin)
        .json(&json!({ "menu_ids": [log_menu] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = server
        .client
        .put(server.url(&format!("/admin/users/{}/roles", user["id"].as_str().unwrap())))
        .bearer_auth(&admin)
        .json(&json!({ "role_ids": [role["id"]] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Same token, fresh permissions.
    assert_eq!(server.get(&auditor, "/logs").await.status(), StatusCode::OK);
}
