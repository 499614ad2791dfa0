use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String, pub version: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub business_name: String,
    pub website: Option<String>,
    pub owner_full_name: String,
    pub owner_job_title: Option<String>,
    pub work_email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse { pub token: String, pub expires_at: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDoc {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: String,
    pub website: String,
    pub phone: String,
    pub email: String,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_job_title: String,
    pub created_at: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc { pub id: Uuid, pub email: String, pub name: String, pub roles: Vec<String>, pub created_at: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalDoc { pub id: Uuid, pub name: String, pub roles: Vec<String>, pub expires_at: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::businesses::register,
        crate::routes::businesses::get_business,
        crate::routes::businesses::find_by_email,
        crate::routes::businesses::get_user,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            BusinessDoc,
            UserDoc,
            PrincipalDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "businesses"),
        (name = "users")
    )
)]
pub struct ApiDoc;
