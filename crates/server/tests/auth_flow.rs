mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use common::{bearer, build_app, login, owner_token, send, PASSWORD};

#[tokio::test]
async fn register_login_and_me() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let email = format!("user_{}@example.com", Uuid::new_v4());

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        &[],
        Some(json!({ "email": email, "name": "Tester", "password": PASSWORD, "businessName": "Arctic Air" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "owner");

    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&json!({ "email": email, "password": PASSWORD }))?))?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get("set-cookie").and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));

    let token = login(&app, &email, PASSWORD).await?;
    let (status, body) = send(&app, "GET", "/auth/me", &[("authorization", &bearer(&token))], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], email.as_str());

    // Cookie 同样可用
    let cookie_pair = cookie.split(';').next().unwrap_or_default().to_string();
    let (status, _) = send(&app, "GET", "/auth/me", &[("cookie", &cookie_pair)], None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn me_requires_session() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let (status, body) = send(&app, "GET", "/auth/me", &[], None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authentication required");

    let (status, _) = send(&app, "GET", "/auth/me", &[("authorization", "Bearer not-a-jwt")], None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_wrong_password() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let email = format!("user_{}@example.com", Uuid::new_v4());
    send(&app, "POST", "/auth/register", &[], Some(json!({ "email": email, "name": "T", "password": "StrongPass123", "businessName": "B" }))).await?;

    let (status, body) = send(&app, "POST", "/auth/login", &[], Some(json!({ "email": email, "password": "wrong-pass" }))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn register_validation_and_duplicates() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let (status, _) = send(&app, "POST", "/auth/register", &[], Some(json!({ "email": "a@b.com", "name": "A", "password": "short", "businessName": "B" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/auth/register", &[], Some(json!({ "email": "a@b.com", "name": "A", "password": PASSWORD }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "businessName is required");

    let payload = json!({ "email": "dup@b.com", "name": "A", "password": PASSWORD, "businessName": "B" });
    assert_eq!(send(&app, "POST", "/auth/register", &[], Some(payload.clone())).await?.0, StatusCode::CREATED);
    assert_eq!(send(&app, "POST", "/auth/register", &[], Some(payload)).await?.0, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn owner_invites_staff_who_cannot_manage_keys() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let owner = owner_token(&app).await?;
    let staff_email = format!("staff_{}@example.com", Uuid::new_v4());

    let (status, body) = send(
        &app,
        "POST",
        "/auth/register",
        &[("authorization", &bearer(&owner))],
        Some(json!({ "email": staff_email, "name": "Tech", "password": PASSWORD })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "staff");

    let staff = login(&app, &staff_email, PASSWORD).await?;
    let (status, _) = send(&app, "POST", "/api/api-keys", &[("authorization", &bearer(&staff))], Some(json!({ "name": "zapier" }))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    // 员工仍可访问本企业数据
    let (status, _) = send(&app, "GET", "/api/customers", &[("authorization", &bearer(&staff))], None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_platform_admin() -> anyhow::Result<()> {
    let (app, state) = build_app().await?;
    let owner = owner_token(&app).await?;
    let (status, body) = send(&app, "GET", "/admin/stats", &[("authorization", &bearer(&owner))], None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "platform admin role required");

    state.auth.ensure_platform_admin("root@platform.test", PASSWORD).await?;
    let admin = login(&app, "root@platform.test", PASSWORD).await?;
    let (status, body) = send(&app, "GET", "/admin/stats", &[("authorization", &bearer(&admin))], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["stats"]["businesses"].as_u64().unwrap_or_default() >= 2);

    let (status, body) = send(&app, "GET", "/admin/businesses", &[("authorization", &bearer(&admin))], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["businesses"].is_array());
    assert!(body["pageInfo"].is_object());
    Ok(())
}
