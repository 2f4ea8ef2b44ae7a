use sea_orm::{entity::prelude::*, ConnectionTrait, PaginatorTrait, QueryFilter, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors};
use crate::validation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub service_end_date: Date,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Subscription has lapsed: the end date itself is still a valid day.
    pub fn is_expired_on(&self, today: Date) -> bool {
        self.service_end_date < today
    }
}

/// Company profile fields shared by create and update forms.
#[derive(Debug, Clone, Default)]
pub struct CompanyProfile {
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CompanyProfile {
    /// Validate in place; the phone is replaced by its normalised form.
    pub fn validate(&mut self, errors: &mut FieldErrors) {
        self.contact_name = validation::non_empty(self.contact_name.take());
        self.email = validation::non_empty(self.email.take());
        self.address = validation::non_empty(self.address.take());
        self.name = self.name.trim().to_string();
        validation::require_text(errors, "name", &self.name, 128);
        validation::optional_text(errors, "contact_name", self.contact_name.as_deref(), 128);
        validation::validate_email(errors, "email", self.email.as_deref());
        let phone = validation::non_empty(self.phone.take());
        self.phone = validation::optional_phone(errors, "phone", phone.as_deref());
    }
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub profile: CompanyProfile,
    pub service_end_date: Date,
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

pub async fn create<C: ConnectionTrait>(db: &C, input: NewCompany) -> Result<Model, errors::ModelError> {
    let NewCompany { mut profile, service_end_date, username, password_hash } = input;
    let mut errs = FieldErrors::new();
    profile.validate(&mut errs);
    validation::validate_username(&mut errs, "username", &username);
    errs.into_result()?;
    if username_taken(db, &username).await? {
        return Err(errors::ModelError::invalid("username", "already taken"));
    }

    let now = Utc::now().into();
    let am = ActiveModel {
        name: Set(profile.name),
        contact_name: Set(profile.contact_name),
        phone: Set(profile.phone),
        email: Set(profile.email),
        address: Set(profile.address),
        service_end_date: Set(service_end_date),
        username: Set(username.trim().to_string()),
        password_hash: Set(password_hash),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
