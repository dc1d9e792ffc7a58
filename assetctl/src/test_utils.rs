//! Test helpers: a ready application on a `#[sqlx::test]` pool, registered companies, extra users
//! and bearer headers.

use axum_test::TestServer;
use serde_json::{Value, json};
use sqlx::PgPool;

use crate::{
    api::models::{companies::CompanyCreateResponse, users::UserCreateResponse},
    auth::session,
    config::{Config, DatabaseConfig, PasswordConfig, PoolSettings},
    types::{CompanyId, UserId},
};

/// Password every test user is created with.
pub const TEST_PASSWORD: &str = "P4ssword";

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            url: None,
            pool: PoolSettings {
                max_connections: 2,
                min_connections: 0,
                ..Default::default()
            },
        },
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    };
    // Cheap hashing keeps the HTTP tests fast
    config.auth.password = PasswordConfig {
        argon2_memory_kib: 128,
        argon2_iterations: 1,
        argon2_parallelism: 1,
    };
    config
}

/// `Authorization` header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// A company registered through the API, with its founding admin.
#[derive(Debug, Clone)]
pub struct TestCompany {
    pub id: CompanyId,
    pub admin_id: UserId,
    pub admin_token: String,
}

impl TestCompany {
    /// Path below `/api/1.0/companies/{id}`.
    pub fn path(&self, rest: &str) -> String {
        format!("/api/1.0/companies/{}{}", self.id, rest)
    }
}

/// A user created by a company admin.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub email: String,
    pub token: String,
}

/// Register a company whose admin is `{tag}admin` / `{tag}@example.com`.
pub async fn register_company(server: &TestServer, tag: &str) -> TestCompany {
    let response = server
        .post("/api/1.0/companies")
        .json(&json!({
            "companyName": format!("{tag} Ltd"),
            "username": format!("{tag}admin"),
            "email": format!("{tag}@example.com"),
            "password": TEST_PASSWORD,
        }))
        .await;
    response.assert_status_ok();

    let body: CompanyCreateResponse = response.json();
    TestCompany {
        id: body.company_id,
        admin_id: body.user_id,
        admin_token: body.token,
    }
}

/// Create a non-admin user in `company`, authenticated as its admin.
pub async fn create_user(server: &TestServer, company: &TestCompany, username: &str) -> TestUser {
    let email = format!("{username}@example.com");
    let response = server
        .post(&company.path("/users"))
        .add_header("authorization", bearer(&company.admin_token))
        .json(&json!({
            "username": username,
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .await;
    response.assert_status_ok();

    let body: UserCreateResponse = response.json();
    let config = create_test_config();
    let identity = session::verify_token(&body.token, &config).expect("issued token verifies");

    TestUser {
        id: identity.user_id,
        email,
        token: body.token,
    }
}

/// Id of one of the company's seeded statuses.
pub async fn status_id(server: &TestServer, company: &TestCompany, name: &str) -> i32 {
    let response = server
        .get(&company.path("/asset-status"))
        .add_header("authorization", bearer(&company.admin_token))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["assetStatuses"]
        .as_array()
        .and_then(|statuses| statuses.iter().find(|s| s["statusName"] == name))
        .and_then(|s| s["id"].as_i64())
        .map(|id| id as i32)
        .expect("seeded status exists")
}

/// Id of the company's asset group called `name`.
pub async fn asset_group_id(server: &TestServer, company: &TestCompany, name: &str) -> i32 {
    let response = server
        .get(&company.path("/asset-groups"))
        .add_query_param("pagination", "false")
        .add_header("authorization", bearer(&company.admin_token))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["assetGroups"]
        .as_array()
        .and_then(|groups| groups.iter().find(|g| g["assetGroupName"] == name))
        .and_then(|g| g["id"].as_i64())
        .map(|id| id as i32)
        .expect("asset group exists")
}

/// Create an asset in the company's default group and return its id.
pub async fn create_asset(server: &TestServer, company: &TestCompany, name: &str, extra: Value) -> i32 {
    let status = status_id(server, company, "In Use").await;
    let group = asset_group_id(server, company, crate::db::seeds::DEFAULT_ASSET_GROUP).await;

    let mut body = json!({
        "assetName": name,
        "statusCode": status,
        "assetgroupId": group,
    });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }

    server
        .post(&company.path("/assets"))
        .add_header("authorization", bearer(&company.admin_token))
        .json(&body)
        .await
        .assert_status_ok();

    let response = server
        .get(&company.path("/assets"))
        .add_query_param("search", name)
        .add_header("authorization", bearer(&company.admin_token))
        .await;
    let listed: Value = response.json();
    listed["content"][0]["id"].as_i64().map(|id| id as i32).expect("asset was created")
}

/// Asserts an error envelope with the given status-independent message.
pub fn assert_message(body: &Value, message: &str) {
    assert_eq!(body["message"], message, "unexpected error body: {body}");
}
