use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::{auth::AuthUser, password::hash_password},
    error::AppError,
    service::{attendance, directory},
};

#[derive(Deserialize, ToSchema)]
pub struct ResetPassword {
    #[schema(example = "jane.doe@company.com")]
    pub email: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub employee_count: i64,
    pub active_employee_count: i64,
    pub today_attendance_count: i64,
    /// Always 0: there is no shift schedule to be late against.
    pub late_count: i64,
}

#[utoipa::path(
    post,
    path = "/api/admin/reset-password",
    request_body = ResetPassword,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "email and new_password are required"),
        (status = 403, description = "Forbidden: Admins only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reset_password(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<ResetPassword>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    let new_password = payload.new_password.as_deref().unwrap_or_default();
    if email.is_empty() || new_password.is_empty() {
        return Err(AppError::invalid_input("email and new_password are required").into());
    }

    let hash = hash_password(new_password).map_err(AppError::from)?;
    directory::set_password_hash_by_email(pool.get_ref(), email, &hash).await?;

    info!(admin_id = auth.employee_id, "Password reset by admin");
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated" })))
}

#[utoipa::path(
    get,
    path = "/api/admin/summary",
    responses(
        (status = 200, body = AdminSummary),
        (status = 403, description = "Forbidden: Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let (employee_count, active_employee_count) = directory::headcount(pool.get_ref()).await?;
    let today_attendance_count =
        attendance::count_checked_in_on(pool.get_ref(), Local::now().date_naive()).await?;

    Ok(HttpResponse::Ok().json(AdminSummary {
        employee_count,
        active_employee_count,
        today_attendance_count,
        late_count: 0,
    }))
}

#[cfg(test)]
mod tests {
    use crate::auth::password::verify_password;
    use crate::model::role::Role;
    use crate::service::{attendance, directory};
    use crate::test_utils::{
        bearer, create_test_employee, peer, setup_test_db, test_app, test_config, token_for,
    };
    use actix_web::{http::StatusCode, test};
    use chrono::Local;
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn summary_counts_directory_and_today() {
        let pool = setup_test_db().await;
        let config = test_config();
        let admin = create_test_employee(&pool, "admin@x.io", 0.0, Role::Admin).await;
        let gone = create_test_employee(&pool, "gone@x.io", 0.0, Role::Employee).await;
        directory::deactivate(&pool, gone).await.unwrap();
        attendance::check_in(&pool, admin, Local::now().naive_local())
            .await
            .unwrap();
        let token = token_for(&config, admin, "admin@x.io", Role::Admin);
        let app = test_app!(pool, config);

        let req = test::TestRequest::get()
            .uri("/api/admin/summary")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body,
            json!({
                "employeeCount": 2,
                "activeEmployeeCount": 1,
                "todayAttendanceCount": 1,
                "lateCount": 0
            })
        );
    }

    #[actix_web::test]
    async fn reset_password_by_email() {
        let pool = setup_test_db().await;
        let config = test_config();
        let admin = create_test_employee(&pool, "admin@x.io", 0.0, Role::Admin).await;
        let worker = create_test_employee(&pool, "w@x.io", 0.0, Role::Employee).await;
        let token = token_for(&config, admin, "admin@x.io", Role::Admin);
        let app = test_app!(pool, config);

        let req = test::TestRequest::post()
            .uri("/api/admin/reset-password")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({ "email": "W@x.io", "new_password": "fresh-start" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = directory::find_by_id(&pool, worker).await.unwrap().unwrap();
        assert!(verify_password("fresh-start", &stored.password_hash).is_ok());

        let req = test::TestRequest::post()
            .uri("/api/admin/reset-password")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({ "email": "nobody@x.io", "new_password": "x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
