#![cfg(test)]
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;

use models::role::Role;
use models::{branch, company, customer, personnel, service};

use crate::auth::context::AuthContext;
use crate::auth::domain::LoginKind;
use crate::auth::hash_password;
use crate::scope::Scope;

pub const PASSWORD: &str = "Passw0rd!";

/// Fresh in-memory database with migrations applied.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = models::db::connect_sqlite_memory().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Ids of the seeded tenant tree.
///
/// Company A has branches a1/a2 plus a company-wide customer; company B has one branch.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub company_a: i32,
    pub company_b: i32,
    pub branch_a1: i32,
    pub branch_a2: i32,
    pub branch_b1: i32,
    pub manager_a1: i32,
    pub tech_a1: i32,
    pub tech_a2: i32,
    pub tech_b1: i32,
    pub customer_a1: i32,
    pub customer_a2: i32,
    pub customer_a: i32,
    pub customer_b1: i32,
    pub service_a1: i32,
    pub service_a2: i32,
    pub service_a: i32,
    pub service_b1: i32,
}

pub async fn seed(db: &DatabaseConnection) -> Result<Fixture, anyhow::Error> {
    let hash = hash_password(PASSWORD)?;
    let end = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();

    let mk_company = |name: &str| company::NewCompany {
        profile: company::CompanyProfile { name: name.to_string(), ..Default::default() },
        service_end_date: end,
        username: name.to_lowercase(),
        password_hash: hash.clone(),
    };
    let ca = company::create(db, mk_company("Alpha")).await?;
    let cb = company::create(db, mk_company("Beta")).await?;

    let mk_branch = |company_id: i32, name: &str| branch::NewBranch {
        company_id,
        profile: branch::BranchProfile { name: name.to_string(), ..Default::default() },
        username: name.to_lowercase(),
        password_hash: hash.clone(),
    };
    let a1 = branch::create(db, mk_branch(ca.id, "alpha-1")).await?;
    let a2 = branch::create(db, mk_branch(ca.id, "alpha-2")).await?;
    let b1 = branch::create(db, mk_branch(cb.id, "beta-1")).await?;

    let mk_person = |company_id: i32, branch_id: i32, role: Role, username: &str| personnel::NewPersonnel {
        company_id,
        branch_id: Some(branch_id),
        role,
        profile: personnel::PersonnelProfile { name: username.to_string(), ..Default::default() },
        username: username.to_string(),
        password_hash: hash.clone(),
    };
    let manager_a1 = personnel::create(db, mk_person(ca.id, a1.id, Role::BranchManager, "manager.a1")).await?;
    let tech_a1 = personnel::create(db, mk_person(ca.id, a1.id, Role::Technician, "tech.a1")).await?;
    let tech_a2 = personnel::create(db, mk_person(ca.id, a2.id, Role::Technician, "tech.a2")).await?;
    let tech_b1 = personnel::create(db, mk_person(cb.id, b1.id, Role::Technician, "tech.b1")).await?;

    let mk_customer = |company_id: i32, branch_id: Option<i32>, name: &str, phone: &str| customer::NewCustomer {
        company_id,
        branch_id,
        profile: customer::CustomerProfile { name: name.to_string(), phone: phone.to_string(), ..Default::default() },
    };
    let cust_a1 = customer::create(db, mk_customer(ca.id, Some(a1.id), "Ayse", "0532 100 00 01")).await?;
    let cust_a2 = customer::create(db, mk_customer(ca.id, Some(a2.id), "Burak", "0532 100 00 02")).await?;
    let cust_a = customer::create(db, mk_customer(ca.id, None, "Cem", "0532 100 00 03")).await?;
    let cust_b1 = customer::create(db, mk_customer(cb.id, Some(b1.id), "Deniz", "0532 100 00 01")).await?;

    let mk_service = |c: &customer::Model, technician_id: Option<i32>| service::NewService {
        customer_id: c.id,
        company_id: c.company_id,
        branch_id: c.branch_id,
        technician_id,
        details: service::ServiceDetails { description: Some(format!("visit for {}", c.name)), ..Default::default() },
    };
    let s_a1 = service::create(db, mk_service(&cust_a1, Some(tech_a1.id))).await?;
    let s_a2 = service::create(db, mk_service(&cust_a2, Some(tech_a2.id))).await?;
    let s_a = service::create(db, mk_service(&cust_a, None)).await?;
    let s_b1 = service::create(db, mk_service(&cust_b1, Some(tech_b1.id))).await?;

    Ok(Fixture {
        company_a: ca.id,
        company_b: cb.id,
        branch_a1: a1.id,
        branch_a2: a2.id,
        branch_b1: b1.id,
        manager_a1: manager_a1.id,
        tech_a1: tech_a1.id,
        tech_a2: tech_a2.id,
        tech_b1: tech_b1.id,
        customer_a1: cust_a1.id,
        customer_a2: cust_a2.id,
        customer_a: cust_a.id,
        customer_b1: cust_b1.id,
        service_a1: s_a1.id,
        service_a2: s_a2.id,
        service_a: s_a.id,
        service_b1: s_b1.id,
    })
}

pub fn super_ctx() -> AuthContext {
    AuthContext::new(1, LoginKind::Admin, Scope::super_admin(), "root")
}

pub fn company_ctx(company_id: i32) -> AuthContext {
    AuthContext::new(company_id, LoginKind::Company, Scope::company(company_id), "company admin")
}

pub fn manager_ctx(fx: &Fixture) -> AuthContext {
    AuthContext::new(fx.manager_a1, LoginKind::Personnel, Scope::branch_manager(fx.company_a, Some(fx.branch_a1)), "manager.a1")
}

pub fn tech_ctx(personnel_id: i32, company_id: i32, branch_id: i32) -> AuthContext {
    AuthContext::new(personnel_id, LoginKind::Personnel, Scope::technician(company_id, Some(branch_id)), "tech")
}
