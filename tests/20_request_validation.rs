mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use synapsis_api::auth::{generate_jwt, Claims};

// A token the spawned server accepts: both processes fall back to the same
// development JWT secret unless JWT_SECRET is set, in which case both
// inherit it from the environment.
fn bearer(role: &str) -> Result<String> {
    let claims = Claims::new(
        Uuid::new_v4(),
        role.to_string(),
        Some(Uuid::new_v4()),
        format!("{}@synapsis.example.com", role),
        "Test Account".to_string(),
    );
    Ok(generate_jwt(claims)?)
}

#[tokio::test]
async fn empty_signup_body_gets_a_400_error_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/student/signup", server.base_url))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn recommendation_with_missing_fields_gets_a_400_error_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!(
            "{}/api/coordinator/recommendgracemark",
            server.base_url
        ))
        .bearer_auth(bearer("coordinator")?)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn review_without_student_id_gets_a_400_error_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .put(format!(
            "{}/api/teacher/approverecommendedgracemark",
            server.base_url
        ))
        .bearer_auth(bearer("teacher")?)
        .json(&json!({ "approve": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn malformed_json_body_gets_a_400_error_envelope() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/student/signup", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}
