use sea_orm::{entity::prelude::*, ConnectionTrait, QueryFilter, PaginatorTrait, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors};
use crate::{branch, company, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub company_id: i32,
    pub branch_id: Option<i32>,
    pub name: String,
    /// Normalised national form, unique per company.
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Company, Branch }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Company => Entity::belongs_to(company::Entity).from(Column::CompanyId).to(company::Column::Id).into(),
            Relation::Branch => Entity::belongs_to(branch::Entity).from(Column::BranchId).to(branch::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Default)]
pub struct CustomerProfile {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
}

impl CustomerProfile {
    /// Validate in place; on success `phone` holds the normalised number.
    pub fn validate(&mut self, errors: &mut FieldErrors) {
        self.name = self.name.trim().to_string();
        self.email = validation::non_empty(self.email.take());
        self.address = validation::non_empty(self.address.take());
        self.city = validation::non_empty(self.city.take());
        self.district = validation::non_empty(self.district.take());
        validation::require_text(errors, "name", &self.name, 128);
        validation::validate_email(errors, "email", self.email.as_deref());
        validation::optional_text(errors, "city", self.city.as_deref(), 64);
        validation::optional_text(errors, "district", self.district.as_deref(), 64);
        if let Some(p) = validation::require_phone(errors, "phone", &self.phone) {
            self.phone = p;
        }
    }
}

/// Whether another customer of `company_id` already uses `phone` (normalised).
pub async fn phone_taken<C: ConnectionTrait>(db: &C, company_id: i32, phone: &str, exclude_id: Option<i32>) -> Result<bool, errors::ModelError> {
    let mut q = Entity::find()
        .filter(Column::CompanyId.eq(company_id))
        .filter(Column::Phone.eq(phone));
    if let Some(id) = exclude_id {
        q = q.filter(Column::Id.ne(id));
    }
    let n = q.count(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(n > 0)
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub company_id: i32,
    pub branch_id: Option<i32>,
    pub profile: CustomerProfile,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewCustomer) -> Result<Model, errors::ModelError> {
    let NewCustomer { company_id, branch_id, mut profile } = input;
    let mut errs = FieldErrors::new();
    profile.validate(&mut errs);
    errs.into_result()?;
    if phone_taken(db, company_id, &profile.phone, None).await? {
        return Err(errors::ModelError::invalid("phone", "phone number already registered for another customer"));
    }

    let now = Utc::now().into();
    let am = ActiveModel {
        company_id: Set(company_id),
        branch_id: Set(branch_id),
        name: Set(profile.name),
        phone: Set(profile.phone),
        email: Set(profile.email),
        address: Set(profile.address),
        city: Set(profile.city),
        district: Set(profile.district),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}
