use sea_orm::{entity::prelude::*, ConnectionTrait, QueryFilter, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors};

/// Global key/value configuration row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub key: String,
    pub value: String,
    pub updated_by: Option<String>,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Days a new company subscription runs when no end date is given.
pub const DEFAULT_SERVICE_DAYS: &str = "default_service_days";

pub fn validate_key(errors: &mut FieldErrors, key: &str) {
    let ok = !key.is_empty()
        && key.len() <= 128
        && key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.');
    if !ok {
        errors.push(key, "setting keys use a-z, 0-9, '_' and '.' (max 128)");
    }
}

pub async fn find_by_key<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Key.eq(key))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Insert or overwrite `key`, stamping the audit pair.
pub async fn upsert<C: ConnectionTrait>(db: &C, key: &str, value: &str, updated_by: Option<&str>) -> Result<Model, errors::ModelError> {
    let mut errs = FieldErrors::new();
    validate_key(&mut errs, key);
    errs.into_result()?;

    let now = Utc::now().into();
    let by = updated_by.map(str::to_string);
    match find_by_key(db, key).await? {
        Some(existing) => {
            let mut am: ActiveModel = existing.into();
            am.value = Set(value.to_string());
            am.updated_by = Set(by);
            am.updated_at = Set(now);
            am.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
        }
        None => {
            let am = ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                updated_by: Set(by),
                updated_at: Set(now),
                ..Default::default()
            };
            am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
        }
    }
}
