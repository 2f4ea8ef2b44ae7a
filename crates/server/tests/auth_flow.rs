mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};

use common::{assert_redirect, build_app, json_body, session_cookie, PASSWORD};
use service::auth::domain::{LoginInput, LoginKind};

#[tokio::test]
async fn health_and_openapi_are_public() -> anyhow::Result<()> {
    let t = build_app().await?;
    let resp = t.get("/health", None).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await?["status"], "ok");

    let resp = t.get("/api-docs/openapi.json", None).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = json_body(resp).await?;
    assert!(doc["paths"]["/login"].is_object());
    Ok(())
}

#[tokio::test]
async fn company_login_sets_cookie_and_lands_on_dashboard() -> anyhow::Result<()> {
    let t = build_app().await?;
    let resp = t.post_form("/login", "user_type=company&username=alpha&password=Passw0rd%21", None).await?;
    assert_redirect(&resp, "/dashboard");
    let raw = resp.headers()[header::SET_COOKIE].to_str()?.to_string();
    assert!(raw.contains("HttpOnly"));
    let cookie = session_cookie(&resp).expect("session cookie");

    let resp = t.get("/dashboard", Some(&cookie)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await?;
    assert_eq!(body["role"], "company_admin");
    assert_eq!(body["data"]["kind"], "summary");
    assert_eq!(body["data"]["branches"], 2);
    Ok(())
}

#[tokio::test]
async fn wrong_password_goes_back_to_login() -> anyhow::Result<()> {
    let t = build_app().await?;
    let resp = t.post_form("/login", "user_type=company&username=alpha&password=nope-nope", None).await?;
    assert_redirect(&resp, "/login?error=invalid_credentials");
    assert!(session_cookie(&resp).is_none());

    // personnel accounts cannot use the shared form
    let resp = t.post_form("/login", "user_type=personnel&username=manager.a1&password=Passw0rd%21", None).await?;
    assert_redirect(&resp, "/login?error=invalid_user_type");
    Ok(())
}

#[tokio::test]
async fn personnel_login_uses_own_form() -> anyhow::Result<()> {
    let t = build_app().await?;
    let cookie = t.personnel_login("manager.a1").await?;
    let resp = t.get("/me", Some(&cookie)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await?;
    assert_eq!(me["user_type"], "personnel");
    assert_eq!(me["user_id"], t.ids.manager_a1);

    let resp = t.post_form("/personnel/login", "username=manager.a1&password=wrong-one", None).await?;
    assert_redirect(&resp, "/personnel/login?error=invalid_credentials");
    Ok(())
}

#[tokio::test]
async fn anonymous_requests_are_sent_to_login() -> anyhow::Result<()> {
    let t = build_app().await?;
    for uri in ["/dashboard", "/customers", "/services/1/receipt", "/service-expired"] {
        let resp = t.get(uri, None).await?;
        assert_redirect(&resp, "/login");
    }
    let resp = t.get("/customers", Some("auth_token=not-a-jwt")).await?;
    assert_redirect(&resp, "/login");
    Ok(())
}

#[tokio::test]
async fn bearer_token_is_accepted() -> anyhow::Result<()> {
    let t = build_app().await?;
    let session = t
        .state
        .auth
        .login(LoginInput { kind: LoginKind::Admin, username: "root".into(), password: PASSWORD.into() })
        .await?;
    let req = Request::builder()
        .uri("/companies")
        .header(header::AUTHORIZATION, format!("Bearer {}", session.token))
        .body(Body::empty())?;
    let resp = t.send(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await?["total"], 2);
    Ok(())
}

#[tokio::test]
async fn logout_clears_cookie() -> anyhow::Result<()> {
    let t = build_app().await?;
    let cookie = t.login("branch", "alpha-1").await?;
    let resp = t.post_form("/logout", "", Some(&cookie)).await?;
    assert_redirect(&resp, "/login");
    let cleared = resp.headers()[header::SET_COOKIE].to_str()?;
    assert!(cleared.starts_with("auth_token="));
    Ok(())
}
