mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;

    // OK or SERVICE_UNAVAILABLE both count as liveness
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    // Should be valid JSON
    let _body = res.json::<serde_json::Value>().await?;
    Ok(())
}

#[tokio::test]
async fn root_lists_endpoint_groups() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert!(body["data"]["endpoints"]["grace"].is_string());
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/auth/whoami", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}
