mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::{assert_error_envelope, assert_success_envelope, TestServer, ADMIN_TOKEN, U1_TOKEN, U2_TOKEN};

#[tokio::test]
async fn user_reads_own_record() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get("/api/v1/users/u1").bearer_auth(U1_TOKEN).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_success_envelope(&body);
    assert_eq!(body["data"]["id"], "u1");
    assert_eq!(body["data"]["email"], "u1@example.com");
    assert_eq!(body["data"]["display_name"], Value::Null);
    assert!(body["data"]["created_at"].is_string());
    Ok(())
}

#[tokio::test]
async fn user_cannot_read_someone_else() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get("/api/v1/users/u1").bearer_auth(U2_TOKEN).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body = res.json::<Value>().await?;
    assert_error_envelope(&body);
    assert_eq!(body["error"], "Not authorized to view this user");
    Ok(())
}

#[tokio::test]
async fn site_admin_reads_any_user() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get("/api/v1/users/u2").bearer_auth(ADMIN_TOKEN).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["id"], "u2");
    Ok(())
}

#[tokio::test]
async fn unknown_user_is_not_found_for_admin() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .get("/api/v1/users/nobody")
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "User not found");
    Ok(())
}
