use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use models::role::Role;
use models::{admin, branch, company, personnel};

use crate::auth::domain::{Account, AuthUser, LoginKind};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn company(&self, id: i32) -> Result<Option<company::Model>, AuthError> {
        company::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))
    }
}

fn repo_err(e: sea_orm::DbErr) -> AuthError { AuthError::Repository(e.to_string()) }

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_account(&self, kind: LoginKind, username: &str) -> Result<Option<Account>, AuthError> {
        let username = username.trim();
        match kind {
            LoginKind::Admin => {
                let res = admin::Entity::find()
                    .filter(admin::Column::Username.eq(username))
                    .one(&self.db)
                    .await
                    .map_err(repo_err)?;
                Ok(res.map(|a| Account {
                    user: AuthUser {
                        id: a.id,
                        kind,
                        username: a.username,
                        name: a.name,
                        role: Role::SuperAdmin,
                        company_id: None,
                        branch_id: None,
                        company_name: None,
                    },
                    password_hash: a.password_hash,
                    active: true,
                }))
            }
            LoginKind::Company => {
                let res = company::Entity::find()
                    .filter(company::Column::Username.eq(username))
                    .one(&self.db)
                    .await
                    .map_err(repo_err)?;
                Ok(res.map(|c| Account {
                    user: AuthUser {
                        id: c.id,
                        kind,
                        username: c.username,
                        name: c.contact_name.clone().unwrap_or_else(|| c.name.clone()),
                        role: Role::CompanyAdmin,
                        company_id: Some(c.id),
                        branch_id: None,
                        company_name: Some(c.name),
                    },
                    password_hash: c.password_hash,
                    active: c.is_active,
                }))
            }
            LoginKind::Branch => {
                let Some(b) = branch::Entity::find()
                    .filter(branch::Column::Username.eq(username))
                    .one(&self.db)
                    .await
                    .map_err(repo_err)?
                else {
                    return Ok(None);
                };
                let company = self.company(b.company_id).await?;
                let company_active = company.as_ref().map_or(false, |c| c.is_active);
                Ok(Some(Account {
                    user: AuthUser {
                        id: b.id,
                        kind,
                        username: b.username,
                        name: b.name,
                        role: Role::BranchManager,
                        company_id: Some(b.company_id),
                        branch_id: Some(b.id),
                        company_name: company.map(|c| c.name),
                    },
                    password_hash: b.password_hash,
                    active: b.is_active && company_active,
                }))
            }
            LoginKind::Personnel => {
                let Some(p) = personnel::Entity::find()
                    .filter(personnel::Column::Username.eq(username))
                    .one(&self.db)
                    .await
                    .map_err(repo_err)?
                else {
                    return Ok(None);
                };
                let Some(role) = p.parsed_role() else {
                    tracing::warn!(event = "personnel_unknown_role", personnel_id = p.id, role = %p.role);
                    return Ok(None);
                };
                let company = self.company(p.company_id).await?;
                let company_active = company.as_ref().map_or(false, |c| c.is_active);
                Ok(Some(Account {
                    user: AuthUser {
                        id: p.id,
                        kind,
                        username: p.username,
                        name: p.name,
                        role,
                        company_id: Some(p.company_id),
                        branch_id: p.branch_id,
                        company_name: company.map(|c| c.name),
                    },
                    password_hash: p.password_hash,
                    active: p.is_active && company_active,
                }))
            }
        }
    }

    async fn count_admins(&self) -> Result<u64, AuthError> {
        admin::Entity::find().count(&self.db).await.map_err(repo_err)
    }

    async fn create_admin(&self, username: &str, name: &str, password_hash: String) -> Result<AuthUser, AuthError> {
        let created = admin::create(&self.db, username, name, password_hash)
            .await
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(AuthUser {
            id: created.id,
            kind: LoginKind::Admin,
            username: created.username,
            name: created.name,
            role: Role::SuperAdmin,
            company_id: None,
            branch_id: None,
            company_name: None,
        })
    }
}
