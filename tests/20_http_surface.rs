mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn root_responds_with_service_info() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(&server.base_url).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["name"], "recherche-api");
    assert_eq!(body["authenticated"], false);
    Ok(())
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    // OK or degraded both count as liveness; degraded means no database
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );
    let _body = res.json::<serde_json::Value>().await?;
    Ok(())
}

#[tokio::test]
async fn preflight_is_answered_with_cors_headers() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/chercheurs-api", server.base_url),
        )
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await?;

    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::NO_CONTENT,
        "unexpected preflight status: {}",
        res.status()
    );
    assert!(
        res.headers().contains_key("access-control-allow-origin"),
        "missing CORS allow-origin header"
    );
    Ok(())
}

#[tokio::test]
async fn mutation_without_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/chercheurs-api", server.base_url))
        .json(&json!({ "nom": "Kabongo", "prenom": "Alice" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Authorization required");
    Ok(())
}

#[tokio::test]
async fn stats_dashboard_requires_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/stats-dashboard", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Authorization required");
    Ok(())
}

#[tokio::test]
async fn export_requires_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/export-data", server.base_url))
        .json(&json!({ "type": "chercheurs", "format": "csv" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/provinces-api", server.base_url))
        .header("Authorization", "Bearer not-a-jwt")
        .json(&json!({ "nom": "Kinshasa" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    let message = body["error"].as_str().unwrap_or_default();
    assert!(
        message.starts_with("Invalid token"),
        "unexpected error: {}",
        message
    );
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": uuid::Uuid::new_v4(),
        "email": "test@example.cd",
        "exp": now - 3600,
        "iat": now - 7200,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(common::TEST_JWT_SECRET.as_bytes()),
    )?;

    let res = client
        .get(format!("{}/stats-dashboard", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn put_without_token_is_unauthorized() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Missing token outranks the missing id: auth is checked first
    let res = client
        .put(format!("{}/centres-api", server.base_url))
        .json(&json!({ "nom": "CRGM" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Authorization required");
    Ok(())
}

#[tokio::test]
async fn put_with_token_but_no_id_is_bad_request() -> Result<()> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": uuid::Uuid::new_v4(),
        "email": "test@example.cd",
        "exp": now + 3600,
        "iat": now,
    });
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(common::TEST_JWT_SECRET.as_bytes()),
    )?;

    let res = client
        .put(format!("{}/centres-api", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "nom": "CRGM" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], "Centre ID required");
    Ok(())
}

#[tokio::test]
async fn malformed_json_body_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/provinces-api", server.base_url))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body.get("error").is_some(), "missing error field: {}", body);
    Ok(())
}

#[tokio::test]
async fn unknown_sort_key_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/chercheurs-api?sort_by=password",
            server.base_url
        ))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    let message = body["error"].as_str().unwrap_or_default();
    assert!(
        message.contains("sort key"),
        "unexpected error: {}",
        message
    );
    Ok(())
}

#[tokio::test]
async fn invalid_sort_direction_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!(
            "{}/publications-api?sort_by=annee&sort_dir=sideways",
            server.base_url
        ))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn non_uuid_path_id_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/provinces-api/not-a-uuid", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
