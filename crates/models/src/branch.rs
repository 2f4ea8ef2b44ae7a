use sea_orm::{entity::prelude::*, ConnectionTrait, PaginatorTrait, QueryFilter, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors};
use crate::{company, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "branches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Company }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Company => Entity::belongs_to(company::Entity).from(Column::CompanyId).to(company::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default)]
pub struct BranchProfile {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl BranchProfile {
    pub fn validate(&mut self, errors: &mut FieldErrors) {
        self.name = self.name.trim().to_string();
        self.email = validation::non_empty(self.email.take());
        self.address = validation::non_empty(self.address.take());
        validation::require_text(errors, "name", &self.name, 128);
        validation::validate_email(errors, "email", self.email.as_deref());
        let phone = validation::non_empty(self.phone.take());
        self.phone = validation::optional_phone(errors, "phone", phone.as_deref());
    }
}

#[derive(Debug, Clone)]
pub struct NewBranch {
    pub company_id: i32,
    pub profile: BranchProfile,
    pub username: String,
    pub password_hash: String,
}

/// Usernames are unique per account table.
pub async fn username_taken<C: ConnectionTrait>(db: &C, username: &str) -> Result<bool, errors::ModelError> {
    let n = Entity::find()
        .filter(Column::Username.eq(username.trim()))
        .count(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(n > 0)
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewBranch) -> Result<Model, errors::ModelError> {
    let NewBranch { company_id, mut profile, username, password_hash } = input;
    let mut errs = FieldErrors::new();
    profile.validate(&mut errs);
    validation::validate_username(&mut errs, "username", &username);
    errs.into_result()?;
    if username_taken(db, &username).await? {
        return Err(errors::ModelError::invalid("username", "already taken"));
    }

    let now = Utc::now().into();
    let am = ActiveModel {
        company_id: Set(company_id),
        name: Set(profile.name),
        phone: Set(profile.phone),
        email: Set(profile.email),
        address: Set(profile.address),
        username: Set(username.trim().to_string()),
        password_hash: Set(password_hash),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
