mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{bearer, build_app, owner_token, seed_business, send, send_raw};

fn weekday_availability() -> Value {
    let day = json!({ "enabled": true, "slots": [{ "start": "08:00", "end": "17:00" }], "breaks": [{ "start": "12:00", "end": "13:00" }] });
    json!({ "monday": day, "tuesday": day, "wednesday": day, "thursday": day, "friday": day })
}

async fn create_service(app: &axum::Router, auth: &str) -> anyhow::Result<String> {
    let (status, body) = send(
        app,
        "POST",
        "/api/services",
        &[("authorization", auth)],
        Some(json!({
            "name": "Furnace Repair",
            "basePrice": 100.0,
            "durationMinutes": 60,
            "availability": weekday_availability(),
            "pricingRules": [{ "name": "emergency", "condition": { "type": "emergency" }, "modifier": { "type": "percentage", "value": 0.1 } }]
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    Ok(body["service"]["id"].as_str().unwrap_or_default().to_string())
}

async fn create_customer(app: &axum::Router, auth: &str, email: &str) -> anyhow::Result<(StatusCode, Value)> {
    send(app, "POST", "/api/customers", &[("authorization", auth)], Some(json!({ "name": "Jordan", "email": email }))).await
}

#[tokio::test]
async fn booking_requires_service_id() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let auth = bearer(&owner_token(&app).await?);
    let (status, body) = send(&app, "POST", "/api/bookings", &[("authorization", &auth)], Some(json!({ "date": "2030-01-07", "startTime": "09:00" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "serviceId is required" }));
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_json_error() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let auth = bearer(&owner_token(&app).await?);
    let (status, body) = send_raw(&app, "/api/customers", &[("authorization", &auth)], "{\"name\": ").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = send(&app, "POST", "/api/services", &[("authorization", &auth)], Some(json!({ "name": "x", "basePrice": "cheap" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("basePrice"), "{body}");
    Ok(())
}

#[tokio::test]
async fn out_of_range_rules_are_rejected() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let auth = bearer(&owner_token(&app).await?);
    let (status, body) = send(
        &app,
        "POST",
        "/api/services",
        &[("authorization", &auth)],
        Some(json!({
            "name": "Duct Cleaning",
            "basePrice": 80.0,
            "durationMinutes": 60,
            "availability": weekday_availability(),
            "schedulingRules": [{ "condition": { "type": "lead_time", "hours": i64::MAX }, "action": "block" }]
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("lead_time"), "{body}");
    Ok(())
}

#[tokio::test]
async fn duplicate_customer_email_conflicts() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let auth = bearer(&owner_token(&app).await?);
    let (status, body) = create_customer(&app, &auth, "jordan@example.com").await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let (status, body) = create_customer(&app, &auth, "jordan@example.com").await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn tenants_do_not_see_each_other() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let a = bearer(&owner_token(&app).await?);
    let b = bearer(&owner_token(&app).await?);
    let (_, body) = create_customer(&app, &a, "only-a@example.com").await?;
    let id = body["customer"]["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = send(&app, "GET", &format!("/api/customers/{id}"), &[("authorization", &b)], None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send(&app, "GET", "/api/customers", &[("authorization", &b)], None).await?;
    assert_eq!(body["customers"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["pageInfo"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn booking_flow_with_invoice_and_overlap() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let auth = bearer(&owner_token(&app).await?);
    let service_id = create_service(&app, &auth).await?;
    let (_, body) = create_customer(&app, &auth, "jordan@example.com").await?;
    let customer_id = body["customer"]["id"].clone();

    // 2030-01-07 为周一
    let (status, body) = send(&app, "GET", &format!("/api/services/{service_id}/availability?date=2030-01-07"), &[("authorization", &auth)], None).await?;
    assert_eq!(status, StatusCode::OK);
    let slots = body["availability"]["slots"].as_array().cloned().unwrap_or_default();
    assert_eq!(slots.first().map(|s| s["startTime"].clone()), Some(json!("08:00")));
    assert!(!slots.iter().any(|s| s["startTime"] == "12:00"));

    let booking = json!({ "serviceId": service_id, "customerId": customer_id, "date": "2030-01-07", "startTime": "09:00", "isEmergency": true });
    let (status, body) = send(&app, "POST", "/api/bookings", &[("authorization", &auth)], Some(booking.clone())).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["price"]["finalPrice"], 110.0);
    assert_eq!(body["invoice"]["status"], "draft");
    let booking_id = body["booking"]["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = send(&app, "POST", "/api/bookings", &[("authorization", &auth)], Some(booking)).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "time slot is already booked");

    let (_, body) = send(&app, "GET", &format!("/api/services/{service_id}/availability?date=2030-01-07"), &[("authorization", &auth)], None).await?;
    let taken = body["availability"]["slots"].as_array().cloned().unwrap_or_default();
    assert!(!taken.iter().any(|s| s["startTime"] == "09:00"));

    let (status, body) = send(&app, "PUT", &format!("/api/bookings/{booking_id}"), &[("authorization", &auth)], Some(json!({ "status": "confirmed" }))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["booking"]["status"], "confirmed");

    let (status, _) = send(&app, "PUT", &format!("/api/bookings/{booking_id}"), &[("authorization", &auth)], Some(json!({ "status": "pending" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/audit-logs", &[("authorization", &auth)], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["auditLogs"].as_array().map(|a| !a.is_empty()).unwrap_or(false));
    Ok(())
}

#[tokio::test]
async fn api_key_authentication_and_rate_limit() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let auth = bearer(&owner_token(&app).await?);
    create_service(&app, &auth).await?;

    let (status, body) = send(&app, "POST", "/api/api-keys", &[("authorization", &auth)], Some(json!({ "name": "crm", "rateLimitPerMinute": 2 }))).await?;
    assert_eq!(status, StatusCode::CREATED);
    let key = body["key"].as_str().unwrap_or_default().to_string();
    assert!(body["apiKey"].get("keyHash").is_none());

    let (status, body) = send(&app, "GET", "/v1/services", &[], None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "API key required");
    let (status, _) = send(&app, "GET", "/v1/services", &[("x-api-key", "hvac_bogus")], None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/v1/services", &[("x-api-key", &key)], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services"].as_array().map(Vec::len), Some(1));
    assert_eq!(send(&app, "GET", "/v1/services", &[("x-api-key", &key)], None).await?.0, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/v1/services", &[("x-api-key", &key)], None).await?;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "rate limit exceeded");
    Ok(())
}

#[tokio::test]
async fn revoked_key_is_rejected() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let auth = bearer(&owner_token(&app).await?);
    let (_, body) = send(&app, "POST", "/api/api-keys", &[("authorization", &auth)], Some(json!({ "name": "zap" }))).await?;
    let key = body["key"].as_str().unwrap_or_default().to_string();
    let id = body["apiKey"]["id"].as_str().unwrap_or_default().to_string();

    assert_eq!(send(&app, "GET", "/v1/customers", &[("x-api-key", &key)], None).await?.0, StatusCode::OK);
    assert_eq!(send(&app, "DELETE", &format!("/api/api-keys/{id}"), &[("authorization", &auth)], None).await?.0, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", "/v1/customers", &[("x-api-key", &key)], None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "API key inactive");
    Ok(())
}

#[tokio::test]
async fn widget_booking_flow() -> anyhow::Result<()> {
    let (app, state) = build_app().await?;
    let (_, svc) = seed_business(&state, "acme-hvac").await?;

    let (status, body) = send(&app, "GET", "/widget/acme-hvac/services", &[], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services"][0]["name"], "AC Tune-up");

    let (status, body) = send(&app, "GET", &format!("/widget/acme-hvac/services/{}/availability?date=2030-01-08", svc.id), &[], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["availability"]["slots"].as_array().map(Vec::len), Some(9));

    let payload = json!({
        "serviceId": svc.id,
        "date": "2030-01-08",
        "startTime": "10:00",
        "customer": { "name": "Sam", "email": "sam@example.com", "phone": "+15550111" }
    });
    let (status, body) = send(&app, "POST", "/widget/acme-hvac/bookings", &[], Some(payload)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["price"]["finalPrice"], 120.0);

    let (status, body) = send(&app, "POST", "/widget/acme-hvac/bookings", &[], Some(json!({ "serviceId": svc.id, "date": "2030-01-08", "startTime": "11:00" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "customer is required");

    let (status, _) = send(&app, "GET", "/widget/nobody/services", &[], None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn health_metrics_and_docs() -> anyhow::Result<()> {
    let (app, _) = build_app().await?;
    let (status, body) = send(&app, "GET", "/health", &[], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, "GET", "/api-docs/openapi.json", &[], None).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/v1/bookings").is_some());
    Ok(())
}
