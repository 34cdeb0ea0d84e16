use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jane.doe@company.com")]
    pub email: Option<String>,
    #[schema(example = "employee123")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub employee_id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Bearer token payload: the verified identity attached to every call.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub employee_id: i64,
    /// Email of the employee.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub employee_id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateMeRequest {
    #[schema(example = "Jane Q. Doe")]
    pub full_name: Option<String>,
    #[schema(example = "jane.q@company.com")]
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}
