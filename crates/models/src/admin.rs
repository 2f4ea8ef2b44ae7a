use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors};
use crate::validation;

/// Super-admin account.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(db: &C, username: &str, name: &str, password_hash: String) -> Result<Model, errors::ModelError> {
    let mut errs = FieldErrors::new();
    validation::validate_username(&mut errs, "username", username);
    validation::require_text(&mut errs, "name", name, 128);
    errs.into_result()?;
    let am = ActiveModel {
        username: Set(username.trim().to_string()),
        name: Set(name.trim().to_string()),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
