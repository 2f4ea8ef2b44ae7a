mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use common::{assert_redirect, build_app, json_body};

#[tokio::test]
async fn company_admin_never_sees_other_company() -> anyhow::Result<()> {
    let t = build_app().await?;
    let beta = t.login("company", "beta").await?;

    let resp = t.get("/customers", Some(&beta)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = json_body(resp).await?;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], t.ids.customer_b);

    let resp = t.get(&format!("/customers/{}", t.ids.customer_a1), Some(&beta)).await?;
    assert_redirect(&resp, "/dashboard?error=unauthorized");

    let resp = t.get(&format!("/companies/{}", t.ids.company_a), Some(&beta)).await?;
    assert_redirect(&resp, "/dashboard?error=unauthorized");
    Ok(())
}

#[tokio::test]
async fn branch_manager_is_limited_to_own_branch() -> anyhow::Result<()> {
    let t = build_app().await?;
    let mgr = t.personnel_login("manager.a1").await?;

    let resp = t.get("/customers", Some(&mgr)).await?;
    let page = json_body(resp).await?;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], t.ids.customer_a1);

    let resp = t.get(&format!("/services/{}/receipt", t.ids.service_a2), Some(&mgr)).await?;
    assert_redirect(&resp, "/dashboard?error=unauthorized");
    Ok(())
}

#[tokio::test]
async fn cross_branch_delete_is_denied_and_row_remains() -> anyhow::Result<()> {
    let t = build_app().await?;
    let mgr = t.personnel_login("manager.a1").await?;

    let resp = t.post_form(&format!("/services/{}/delete", t.ids.service_a2), "", Some(&mgr)).await?;
    assert_redirect(&resp, "/dashboard?error=unauthorized");
    let still_there = models::service::Entity::find_by_id(t.ids.service_a2).one(&t.state.db).await?;
    assert!(still_there.is_some());

    // the company admin may delete it
    let alpha = t.login("company", "alpha").await?;
    let resp = t.post_form(&format!("/services/{}/delete", t.ids.service_a2), "", Some(&alpha)).await?;
    assert_redirect(&resp, "/services?success=deleted");
    assert!(models::service::Entity::find_by_id(t.ids.service_a2).one(&t.state.db).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_phone_is_unprocessable_and_not_saved() -> anyhow::Result<()> {
    let t = build_app().await?;
    let alpha = t.login("company", "alpha").await?;
    let before = models::customer::Entity::find().count(&t.state.db).await?;

    let body = format!("branch_id={}&name=Another&phone=%2B90+532+100+00+01&email=", t.ids.branch_a2);
    let resp = t.post_form("/customers", &body, Some(&alpha)).await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = json_body(resp).await?;
    assert_eq!(errors["errors"][0]["field"], "phone");
    assert_eq!(models::customer::Entity::find().count(&t.state.db).await?, before);

    // same number in another company is fine
    let beta = t.login("company", "beta").await?;
    let resp = t.post_form("/customers", "name=Ece&phone=0532+100+00+02", Some(&beta)).await?;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(models::customer::Entity::find().count(&t.state.db).await?, before + 1);
    Ok(())
}

#[tokio::test]
async fn expired_company_is_redirected_except_logout() -> anyhow::Result<()> {
    let t = build_app().await?;
    let alpha = t.login("company", "alpha").await?;
    let yesterday = Utc::now().date_naive() - Duration::days(1);
    let company = models::company::Entity::find_by_id(t.ids.company_a).one(&t.state.db).await?.expect("company a");
    let mut am: models::company::ActiveModel = company.into();
    am.service_end_date = Set(yesterday);
    am.update(&t.state.db).await?;

    for uri in ["/dashboard", "/customers", "/company/settings"] {
        let resp = t.get(uri, Some(&alpha)).await?;
        assert_redirect(&resp, "/service-expired");
    }
    let resp = t.post_form("/customers", "name=Ece&phone=05321000009", Some(&alpha)).await?;
    assert_redirect(&resp, "/service-expired");

    let resp = t.get("/service-expired", Some(&alpha)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = json_body(resp).await?;
    assert_eq!(page["status"], "expired");
    assert_eq!(page["end_date"], yesterday.to_string());

    // staff of the company are locked out too
    let mgr = t.personnel_login("manager.a1").await?;
    assert_redirect(&t.get("/dashboard", Some(&mgr)).await?, "/service-expired");

    let resp = t.post_form("/logout", "", Some(&alpha)).await?;
    assert_redirect(&resp, "/login");

    // company B is unaffected
    let beta = t.login("company", "beta").await?;
    assert_eq!(t.get("/dashboard", Some(&beta)).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn deactivated_staff_session_is_dropped() -> anyhow::Result<()> {
    let t = build_app().await?;
    let mgr = t.personnel_login("manager.a1").await?;
    assert_eq!(t.get("/dashboard", Some(&mgr)).await?.status(), StatusCode::OK);

    let person = models::personnel::Entity::find_by_id(t.ids.manager_a1).one(&t.state.db).await?.expect("manager");
    let mut am: models::personnel::ActiveModel = person.into();
    am.is_active = Set(false);
    am.update(&t.state.db).await?;

    let resp = t.get("/dashboard", Some(&mgr)).await?;
    assert_redirect(&resp, "/login?error=account_disabled");
    let cleared = resp.headers()[axum::http::header::SET_COOKIE].to_str()?;
    assert!(cleared.starts_with("auth_token="));
    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_unprocessable() -> anyhow::Result<()> {
    let t = build_app().await?;
    let alpha = t.login("company", "alpha").await?;
    let body = format!("branch_id={}&role=technician&name=Ali&username=manager.a1&password=Passw0rd%21", t.ids.branch_a1);
    let resp = t.post_form("/personnel", &body, Some(&alpha)).await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = json_body(resp).await?;
    assert_eq!(errors["errors"][0]["field"], "username");
    Ok(())
}

#[tokio::test]
async fn end_date_today_is_still_open() -> anyhow::Result<()> {
    let t = build_app().await?;
    let company = models::company::Entity::find_by_id(t.ids.company_a).one(&t.state.db).await?.expect("company a");
    let mut am: models::company::ActiveModel = company.into();
    am.service_end_date = Set(Utc::now().date_naive());
    am.update(&t.state.db).await?;

    let alpha = t.login("company", "alpha").await?;
    assert_eq!(t.get("/dashboard", Some(&alpha)).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn super_admin_manages_companies_and_settings() -> anyhow::Result<()> {
    let t = build_app().await?;
    let root = t.login("admin", "root").await?;

    let resp = t.post_form("/settings", "default_service_days=30&receipt.footer=Tesekkurler", Some(&root)).await?;
    assert_redirect(&resp, "/settings?success=saved");

    let resp = t.post_form("/companies", "name=Gamma+Klima&username=gamma&password=Passw0rd%21", Some(&root)).await?;
    assert_redirect(&resp, "/companies?success=created");
    let page = json_body(t.get("/companies?q=Gamma", Some(&root)).await?).await?;
    assert_eq!(page["total"], 1);
    let expected = (Utc::now().date_naive() + Duration::days(30)).to_string();
    assert_eq!(page["items"][0]["service_end_date"], expected);

    // company admins cannot reach the super admin pages
    let alpha = t.login("company", "alpha").await?;
    assert_redirect(&t.get("/settings", Some(&alpha)).await?, "/dashboard?error=unauthorized");
    assert_redirect(&t.post_form("/companies", "name=X&username=xxx&password=Passw0rd%21", Some(&alpha)).await?, "/dashboard?error=unauthorized");
    Ok(())
}
