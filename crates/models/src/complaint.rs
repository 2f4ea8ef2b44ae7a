//! Customer complaint catalogue.
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors};
use crate::validation;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaints")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(db: &C, name: &str) -> Result<Model, errors::ModelError> {
    let mut errs = FieldErrors::new();
    validation::require_text(&mut errs, "name", name, 128);
    errs.into_result()?;
    let am = ActiveModel { name: Set(name.trim().to_string()), ..Default::default() };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
