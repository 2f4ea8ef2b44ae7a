#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use migration::MigratorTrait;
use tower::Service;

use models::branch::{self, BranchProfile, NewBranch};
use models::company::{self, CompanyProfile, NewCompany};
use models::customer::{self, CustomerProfile, NewCustomer};
use models::personnel::{self, NewPersonnel, PersonnelProfile};
use models::role::Role;
use models::service::{self as ticket, NewService, ServiceDetails};
use server::auth::ServerState;
use service::auth::hash_password;

pub const PASSWORD: &str = "Passw0rd!";

/// Ids of the seeded rows.
#[derive(Debug, Clone, Copy)]
pub struct Seeded {
    pub company_a: i32,
    pub company_b: i32,
    pub branch_a1: i32,
    pub branch_a2: i32,
    pub manager_a1: i32,
    pub customer_a1: i32,
    pub customer_a2: i32,
    pub customer_b: i32,
    pub service_a2: i32,
}

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
    pub ids: Seeded,
}

/// In-memory database, migrated and seeded; router wired exactly like `run`.
pub async fn build_app() -> anyhow::Result<TestApp> {
    let db = models::db::connect_sqlite_memory().await?;
    migration::Migrator::up(&db, None).await?;
    let cfg = configs::AuthConfig { jwt_secret: "server-test-secret-0123".into(), session_hours: 12, secure_cookie: false };
    let state = server::build_state(db, &cfg);
    state.auth.ensure_super_admin("root", PASSWORD).await?;
    let ids = seed(&state).await?;
    Ok(TestApp { app: server::build_app(state.clone()), state, ids })
}

async fn seed(state: &ServerState) -> anyhow::Result<Seeded> {
    let db = &state.db;
    let hash = hash_password(PASSWORD)?;
    let end = Utc::now().date_naive() + Duration::days(30);

    let company = |name: &str, username: &str| NewCompany {
        profile: CompanyProfile { name: name.into(), ..Default::default() },
        service_end_date: end,
        username: username.into(),
        password_hash: hash.clone(),
    };
    let a = company::create(db, company("Alpha Klima", "alpha")).await?;
    let b = company::create(db, company("Beta Klima", "beta")).await?;

    let branch = |company_id: i32, name: &str| NewBranch {
        company_id,
        profile: BranchProfile { name: name.into(), ..Default::default() },
        username: name.into(),
        password_hash: hash.clone(),
    };
    let a1 = branch::create(db, branch(a.id, "alpha-1")).await?;
    let a2 = branch::create(db, branch(a.id, "alpha-2")).await?;

    let manager = personnel::create(db, NewPersonnel {
        company_id: a.id,
        branch_id: Some(a1.id),
        role: Role::BranchManager,
        profile: PersonnelProfile { name: "Mehmet".into(), ..Default::default() },
        username: "manager.a1".into(),
        password_hash: hash.clone(),
    })
    .await?;

    let customer = |company_id: i32, branch_id: Option<i32>, name: &str, phone: &str| NewCustomer {
        company_id,
        branch_id,
        profile: CustomerProfile { name: name.into(), phone: phone.into(), ..Default::default() },
    };
    let c_a1 = customer::create(db, customer(a.id, Some(a1.id), "Ayse", "0532 100 00 01")).await?;
    let c_a2 = customer::create(db, customer(a.id, Some(a2.id), "Burak", "0532 100 00 02")).await?;
    let c_b = customer::create(db, customer(b.id, None, "Deniz", "0532 100 00 01")).await?;

    let s_a2 = ticket::create(db, NewService {
        customer_id: c_a2.id,
        company_id: a.id,
        branch_id: Some(a2.id),
        technician_id: None,
        details: ServiceDetails { description: Some("Klima su akitiyor".into()), ..Default::default() },
    })
    .await?;

    Ok(Seeded {
        company_a: a.id,
        company_b: b.id,
        branch_a1: a1.id,
        branch_a2: a2.id,
        manager_a1: manager.id,
        customer_a1: c_a1.id,
        customer_a2: c_a2.id,
        customer_b: c_b.id,
        service_a2: s_a2.id,
    })
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> anyhow::Result<Response<Body>> {
        Ok(self.app.clone().call(req).await?)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> anyhow::Result<Response<Body>> {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::empty())?).await
    }

    /// POST an urlencoded form body.
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> anyhow::Result<Response<Body>> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::from(body.to_string()))?).await
    }

    /// Log in through the shared login form and return the `name=value` cookie pair.
    pub async fn login(&self, user_type: &str, username: &str) -> anyhow::Result<String> {
        let body = format!("user_type={user_type}&username={username}&password=Passw0rd%21");
        let resp = self.post_form("/login", &body, None).await?;
        session_cookie(&resp).ok_or_else(|| anyhow::anyhow!("login for {username} did not set a cookie"))
    }

    pub async fn personnel_login(&self, username: &str) -> anyhow::Result<String> {
        let body = format!("username={username}&password=Passw0rd%21");
        let resp = self.post_form("/personnel/login", &body, None).await?;
        session_cookie(&resp).ok_or_else(|| anyhow::anyhow!("personnel login for {username} did not set a cookie"))
    }
}

/// `auth_token=<jwt>` taken from a `Set-Cookie` header.
pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with("auth_token=") && pair.len() > "auth_token=".len())
        .map(str::to_string)
}

pub fn location(resp: &Response<Body>) -> Option<&str> {
    resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

pub fn assert_redirect(resp: &Response<Body>, target: &str) {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER, "expected redirect to {target}");
    assert_eq!(location(resp), Some(target));
}

pub async fn json_body(resp: Response<Body>) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
