//! Device models, one brand each. Stored in the `models` table.
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors};
use crate::{brand, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "models")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub brand_id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Brand }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Brand => Entity::belongs_to(brand::Entity).from(Column::BrandId).to(brand::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(db: &C, brand_id: i32, name: &str) -> Result<Model, errors::ModelError> {
    let mut errs = FieldErrors::new();
    validation::require_text(&mut errs, "name", name, 128);
    errs.into_result()?;
    let am = ActiveModel { brand_id: Set(brand_id), name: Set(name.trim().to_string()), ..Default::default() };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
