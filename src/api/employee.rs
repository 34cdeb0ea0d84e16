use crate::{
    auth::{auth::AuthUser, password::hash_password},
    config::Config,
    error::AppError,
    model::{
        employee::{EmployeeResponse, EmployeeSummary, NewEmployee},
        role::Role,
    },
    service::directory,
    utils::email_index::EmailIndex,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "jane.doe@company.com", format = "email", value_type = String)]
    pub email: String,
    /// Defaults to `Employee`
    pub role: Option<Role>,
    #[schema(example = 3000.0)]
    pub gross_monthly_salary: f64,
    #[schema(example = "Engineer")]
    pub job_title: Option<String>,
    #[schema(example = "R&D")]
    pub department: Option<String>,
    #[schema(example = "+8801712345678")]
    pub phone_number: Option<String>,
    /// Falls back to the configured default password
    pub password: Option<String>,
    /// Defaults to today
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub date_of_joining: Option<NaiveDate>,
}

/// Partial update; unknown keys are ignored.
#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub gross_monthly_salary: Option<f64>,
    pub bank_account_number: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "employee_id": 12
        })),
        (status = 400, description = "Invalid email format or salary"),
        (status = 403, description = "Forbidden: Admins only"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    index: web::Data<EmailIndex>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let full_name = payload.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::invalid_input("Missing required fields").into());
    }

    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| config.default_employee_password.clone());
    let password_hash = hash_password(&password).map_err(AppError::from)?;

    let employee_id = directory::create(
        pool.get_ref(),
        index.get_ref(),
        NewEmployee {
            full_name,
            email: payload.email,
            password_hash,
            role: payload.role.unwrap_or(Role::Employee),
            job_title: payload.job_title,
            department: payload.department,
            phone_number: payload.phone_number,
            gross_monthly_salary: payload.gross_monthly_salary,
            date_of_joining: payload
                .date_of_joining
                .unwrap_or_else(|| Local::now().date_naive()),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "employee_id": employee_id
    })))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Active employees", body = [EmployeeSummary])
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    let employees = directory::list_active(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, body = EmployeeResponse),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    _auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let employee = directory::find_by_id(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(EmployeeResponse::from(employee)))
}

#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    request_body = UpdateEmployee,
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee updated successfully"),
        (status = 400, description = "No valid fields provided for update"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    index: web::Data<EmailIndex>,
    path: web::Path<i64>,
    payload: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    directory::update(pool.get_ref(), index.get_ref(), path.into_inner(), &payload).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee updated successfully" })))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee deactivated successfully"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn deactivate_employee(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    directory::deactivate(pool.get_ref(), path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Employee deactivated successfully" })))
}
