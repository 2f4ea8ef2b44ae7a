use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

/// `user_type` is one of `admin`, `company`, `branch`.
#[derive(ToSchema)]
pub struct LoginRequest { pub user_type: String, pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct PersonnelLoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct CustomerRequest {
    pub branch_id: Option<i32>,
    pub name: String,
    /// Normalised to `0XXXXXXXXXX`; unique per company.
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
}

#[derive(ToSchema)]
pub struct StatusRequest {
    /// `pending`, `assigned`, `in_progress`, `completed` or `cancelled`.
    pub status: String,
    /// Final price, e.g. `150.50`.
    pub price: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login_page,
        crate::routes::auth::login,
        crate::routes::auth::personnel_login_page,
        crate::routes::auth::personnel_login,
        crate::routes::auth::logout,
        crate::routes::dashboard::show,
        crate::routes::companies::list,
        crate::routes::companies::create,
        crate::routes::branches::list,
        crate::routes::branches::delete,
        crate::routes::personnel::list,
        crate::routes::customers::list,
        crate::routes::customers::create,
        crate::routes::services::list,
        crate::routes::services::set_status,
        crate::routes::services::delete,
        crate::routes::services::receipt,
        crate::routes::settings::list,
        crate::routes::settings::save,
        crate::routes::lookups::catalog,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            PersonnelLoginRequest,
            CustomerRequest,
            StatusRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "dashboard"),
        (name = "companies"),
        (name = "branches"),
        (name = "personnel"),
        (name = "customers"),
        (name = "services"),
        (name = "settings"),
        (name = "lookups")
    )
)]
pub struct ApiDoc;
