use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::AppError,
    models::{
        ChangePasswordRequest, LoginReqDto, LoginResponse, MeResponse, UpdateMeRequest, UserInfo,
    },
    service::directory,
    utils::{
        email_index::EmailIndex,
        validation::{is_valid_email, normalize_email},
    },
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument};

/// Login
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed bearer token and profile", body = LoginResponse),
        (status = 400, description = "Missing email/password or malformed email"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid credentials"
        }))
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, payload),
    fields(email = payload.email.as_deref().unwrap_or_default())
)]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    let email = normalize_email(payload.email.as_deref().unwrap_or_default());
    let password = payload.password.as_deref().unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return Err(AppError::invalid_input("Email and password are required").into());
    }
    if !is_valid_email(&email) {
        return Err(AppError::invalid_input("Invalid email format").into());
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let employee = match directory::find_by_email(pool.get_ref(), &email).await? {
        Some(e) if e.is_active => e,
        Some(_) => {
            info!("Invalid credentials: employee inactive");
            return Err(invalid().into());
        }
        None => {
            info!("Invalid credentials: unknown email");
            return Err(invalid().into());
        }
    };

    if let Err(e) = verify_password(password, &employee.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(invalid().into());
    }

    debug!(employee_id = employee.employee_id, "Generating access token");
    let token = generate_access_token(
        employee.employee_id,
        employee.email.clone(),
        employee.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(AppError::from)?;

    info!(employee_id = employee.employee_id, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: UserInfo {
            employee_id: employee.employee_id,
            email: employee.email,
            name: employee.full_name,
            role: employee.role,
        },
    }))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, body = MeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, pool: web::Data<SqlitePool>) -> actix_web::Result<impl Responder> {
    let employee = directory::find_by_id(pool.get_ref(), auth.employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(HttpResponse::Ok().json(MeResponse {
        employee_id: employee.employee_id,
        full_name: employee.full_name,
        email: employee.email,
        role: employee.role,
    }))
}

/// Update own name and/or email
#[utoipa::path(
    patch,
    path = "/api/me",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 400, description = "No valid fields provided"),
        (status = 409, description = "Email already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_me(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    index: web::Data<EmailIndex>,
    payload: web::Json<UpdateMeRequest>,
) -> actix_web::Result<impl Responder> {
    directory::update_profile(
        pool.get_ref(),
        index.get_ref(),
        auth.employee_id,
        payload.full_name.as_deref(),
        payload.email.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Profile updated" })))
}

/// Change own password
#[utoipa::path(
    post,
    path = "/api/me/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Missing fields or current password is incorrect")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<ChangePasswordRequest>,
) -> actix_web::Result<impl Responder> {
    let current = payload.current_password.as_deref().unwrap_or_default();
    let new = payload.new_password.as_deref().unwrap_or_default();
    if current.is_empty() || new.is_empty() {
        return Err(
            AppError::invalid_input("current_password and new_password are required").into(),
        );
    }

    let employee = directory::find_by_id(pool.get_ref(), auth.employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if verify_password(current, &employee.password_hash).is_err() {
        return Err(AppError::invalid_input("Current password is incorrect").into());
    }

    let hash = hash_password(new).map_err(AppError::from)?;
    directory::set_password_hash(pool.get_ref(), auth.employee_id, &hash).await?;

    info!(employee_id = auth.employee_id, "Password changed");
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated" })))
}
