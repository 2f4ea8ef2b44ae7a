//! Role-scoped data access.
//!
//! A [`Scope`] is derived from the session once per request and decides which
//! rows the caller may see. Reads go through [`Scope::apply`] (typed queries)
//! or [`Scope::filter_sql`] (hand-written SQL); rows fetched by primary key
//! are checked afterwards with [`Scope::ensure_access`]. The three agree for
//! every (scope, row) pair.

use models::role::Role;
use models::{branch, company, customer, personnel, service};
use sea_orm::{ColumnTrait, DbBackend, EntityTrait, QueryFilter, Select, Value};

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    All,
    Company(i32),
    Branch { company_id: i32, branch_id: Option<i32> },
}

/// Maximal visible slice of tenant data for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    role: Role,
    reach: Reach,
}

/// Actions gated by role, independent of which rows they touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageCompanies,
    ManageSystemSettings,
    ManageLookups,
    ManageCompanySettings,
    ManageBranches,
    ManagePersonnel,
    ManageCustomers,
    ManageServices,
    UpdateServiceStatus,
}

impl Scope {
    pub fn super_admin() -> Self {
        Self { role: Role::SuperAdmin, reach: Reach::All }
    }

    pub fn company(company_id: i32) -> Self {
        Self { role: Role::CompanyAdmin, reach: Reach::Company(company_id) }
    }

    pub fn branch_manager(company_id: i32, branch_id: Option<i32>) -> Self {
        Self { role: Role::BranchManager, reach: Reach::Branch { company_id, branch_id } }
    }

    pub fn technician(company_id: i32, branch_id: Option<i32>) -> Self {
        Self { role: Role::Technician, reach: Reach::Branch { company_id, branch_id } }
    }

    /// Build from session claims. Every role below super admin needs a company.
    pub fn new(role: Role, company_id: Option<i32>, branch_id: Option<i32>) -> Result<Self, ServiceError> {
        match (role, company_id) {
            (Role::SuperAdmin, _) => Ok(Self::super_admin()),
            (Role::CompanyAdmin, Some(cid)) => Ok(Self::company(cid)),
            (Role::BranchManager, Some(cid)) => Ok(Self::branch_manager(cid, branch_id)),
            (Role::Technician, Some(cid)) => Ok(Self::technician(cid, branch_id)),
            (role, None) => Err(ServiceError::forbidden(format!("{role} session without company"))),
        }
    }

    pub fn role(&self) -> Role { self.role }

    pub fn is_super_admin(&self) -> bool { matches!(self.reach, Reach::All) }

    pub fn company_id(&self) -> Option<i32> {
        match self.reach {
            Reach::All => None,
            Reach::Company(cid) | Reach::Branch { company_id: cid, .. } => Some(cid),
        }
    }

    pub fn branch_id(&self) -> Option<i32> {
        match self.reach {
            Reach::Branch { branch_id, .. } => branch_id,
            _ => None,
        }
    }

    /// Append the scope predicate to `sql`, which must already carry a `WHERE`.
    ///
    /// `alias` names the table holding `company_id`/`branch_id`. Session values
    /// are pushed onto `params` in placeholder order.
    ///
    /// ```
    /// use sea_orm::{DbBackend, Value};
    /// use service::scope::Scope;
    ///
    /// let (sql, params) = Scope::branch_manager(5, Some(3)).filter_sql(
    ///     DbBackend::Postgres,
    ///     "SELECT s.id FROM services s WHERE s.status = $1",
    ///     vec![Value::from("pending")],
    ///     "s",
    /// );
    /// assert_eq!(sql, "SELECT s.id FROM services s WHERE s.status = $1 AND s.company_id = $2 AND s.branch_id = $3");
    /// assert_eq!(params.len(), 3);
    /// ```
    pub fn filter_sql(&self, backend: DbBackend, sql: &str, mut params: Vec<Value>, alias: &str) -> (String, Vec<Value>) {
        let mut out = sql.to_string();
        match self.reach {
            Reach::All => {}
            Reach::Company(cid) => {
                push_eq(backend, &mut out, &mut params, alias, "company_id", cid);
            }
            Reach::Branch { company_id, branch_id } => {
                push_eq(backend, &mut out, &mut params, alias, "company_id", company_id);
                match branch_id {
                    Some(bid) => push_eq(backend, &mut out, &mut params, alias, "branch_id", bid),
                    None => out.push_str(&format!(" AND {alias}.branch_id IS NULL")),
                }
            }
        }
        (out, params)
    }

    /// Restrict a typed query to this scope.
    pub fn apply<E: ScopedEntity>(&self, select: Select<E>) -> Select<E> {
        match self.reach {
            Reach::All => select,
            Reach::Company(cid) => select.filter(E::company_column().eq(cid)),
            Reach::Branch { company_id, branch_id } => {
                let select = select.filter(E::company_column().eq(company_id));
                match (E::branch_column(), branch_id) {
                    (Some(col), Some(bid)) => select.filter(col.eq(bid)),
                    (Some(col), None) => select.filter(col.is_null()),
                    (None, _) => select,
                }
            }
        }
    }

    /// Whether a row owned by (`company_id`, `branch_id`) is visible.
    pub fn can_access(&self, company_id: i32, branch_id: Option<i32>) -> bool {
        match self.reach {
            Reach::All => true,
            Reach::Company(cid) => cid == company_id,
            Reach::Branch { company_id: cid, branch_id: bid } => cid == company_id && bid == branch_id,
        }
    }

    /// Company rows carry no branch: branch roles may still read their own company.
    pub fn can_access_company(&self, company_id: i32) -> bool {
        self.company_id().map_or(true, |cid| cid == company_id)
    }

    pub fn ensure_access(&self, company_id: i32, branch_id: Option<i32>) -> Result<(), ServiceError> {
        if self.can_access(company_id, branch_id) {
            Ok(())
        } else {
            Err(ServiceError::forbidden("row outside session scope"))
        }
    }

    pub fn ensure_row<T: TenantOwned>(&self, row: &T) -> Result<(), ServiceError> {
        let (cid, bid) = row.owner();
        self.ensure_access(cid, bid)
    }

    pub fn ensure_company(&self, company_id: i32) -> Result<(), ServiceError> {
        if self.can_access_company(company_id) {
            Ok(())
        } else {
            Err(ServiceError::forbidden("company outside session scope"))
        }
    }

    /// Owner of a row about to be created.
    ///
    /// Scoped roles always write into their own company (and branch, for
    /// branch roles); only super admins pick the company freely.
    pub fn owner_for_new(&self, requested_company: Option<i32>, requested_branch: Option<i32>) -> Result<(i32, Option<i32>), ServiceError> {
        match self.reach {
            Reach::All => match requested_company {
                Some(cid) => Ok((cid, requested_branch)),
                None => Err(ServiceError::invalid("company_id", "required")),
            },
            Reach::Company(cid) => {
                if matches!(requested_company, Some(other) if other != cid) {
                    return Err(ServiceError::forbidden("cannot write into another company"));
                }
                Ok((cid, requested_branch))
            }
            Reach::Branch { company_id, branch_id } => {
                if matches!(requested_company, Some(other) if other != company_id)
                    || matches!(requested_branch, Some(other) if Some(other) != branch_id)
                {
                    return Err(ServiceError::forbidden("cannot write outside own branch"));
                }
                Ok((company_id, branch_id))
            }
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        use Permission::*;
        match self.role {
            Role::SuperAdmin => true,
            Role::CompanyAdmin => !matches!(permission, ManageCompanies | ManageSystemSettings | ManageLookups),
            Role::BranchManager => matches!(permission, ManagePersonnel | ManageCustomers | ManageServices | UpdateServiceStatus),
            Role::Technician => matches!(permission, UpdateServiceStatus),
        }
    }

    pub fn require(&self, permission: Permission) -> Result<(), ServiceError> {
        if self.allows(permission) {
            Ok(())
        } else {
            Err(ServiceError::forbidden(format!("{} may not {:?}", self.role, permission)))
        }
    }
}

/// Positional placeholder number `n` (1-based) for `backend`.
pub fn placeholder(backend: DbBackend, n: usize) -> String {
    match backend {
        DbBackend::Postgres => format!("${n}"),
        _ => "?".to_string(),
    }
}

fn push_eq(backend: DbBackend, sql: &mut String, params: &mut Vec<Value>, alias: &str, column: &str, value: i32) {
    params.push(value.into());
    let ph = placeholder(backend, params.len());
    sql.push_str(&format!(" AND {alias}.{column} = {ph}"));
}

/// Entity with tenant ownership columns.
pub trait ScopedEntity: EntityTrait {
    fn company_column() -> Self::Column;
    /// `None` for entities that are not bound to a branch.
    fn branch_column() -> Option<Self::Column>;
}

impl ScopedEntity for company::Entity {
    fn company_column() -> Self::Column { company::Column::Id }
    fn branch_column() -> Option<Self::Column> { None }
}

impl ScopedEntity for branch::Entity {
    fn company_column() -> Self::Column { branch::Column::CompanyId }
    fn branch_column() -> Option<Self::Column> { Some(branch::Column::Id) }
}

impl ScopedEntity for personnel::Entity {
    fn company_column() -> Self::Column { personnel::Column::CompanyId }
    fn branch_column() -> Option<Self::Column> { Some(personnel::Column::BranchId) }
}

impl ScopedEntity for customer::Entity {
    fn company_column() -> Self::Column { customer::Column::CompanyId }
    fn branch_column() -> Option<Self::Column> { Some(customer::Column::BranchId) }
}

impl ScopedEntity for service::Entity {
    fn company_column() -> Self::Column { service::Column::CompanyId }
    fn branch_column() -> Option<Self::Column> { Some(service::Column::BranchId) }
}

/// Fetched row with a known owner.
pub trait TenantOwned {
    fn owner(&self) -> (i32, Option<i32>);
}

impl TenantOwned for branch::Model {
    fn owner(&self) -> (i32, Option<i32>) { (self.company_id, Some(self.id)) }
}

impl TenantOwned for personnel::Model {
    fn owner(&self) -> (i32, Option<i32>) { (self.company_id, self.branch_id) }
}

impl TenantOwned for customer::Model {
    fn owner(&self) -> (i32, Option<i32>) { (self.company_id, self.branch_id) }
}

impl TenantOwned for service::Model {
    fn owner(&self) -> (i32, Option<i32>) { (self.company_id, self.branch_id) }
}
