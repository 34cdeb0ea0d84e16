use actix_web::{HttpResponse, Responder, http::header, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::payslip::{Payslip, PayslipFilter},
    service::payroll,
};

#[derive(Deserialize, ToSchema)]
pub struct GeneratePayslips {
    #[schema(example = "2024-02")]
    pub month: String,

    /// Restrict generation to one employee
    #[schema(example = 1)]
    pub employee_id: Option<i64>,
}

#[derive(Serialize, ToSchema)]
pub struct GeneratePayslipsResponse {
    #[schema(example = "Payslips generated")]
    pub message: String,
    #[schema(example = "2024-02")]
    pub month: String,
    #[schema(example = json!([7, 8]))]
    pub payslip_ids: Vec<i64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayslip {
    #[schema(example = "Finalized")]
    pub status: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayslipQuery {
    #[schema(example = 1)]
    pub employee_id: Option<i64>,

    /// YYYY-MM
    #[schema(example = "2024-02")]
    pub month: Option<String>,

    #[schema(example = "Draft")]
    pub status: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/payslips/generate",
    request_body = GeneratePayslips,
    responses(
        (status = 200, description = "Payslips generated or refreshed", body = GeneratePayslipsResponse),
        (status = 400, description = "Invalid month format. Use YYYY-MM"),
        (status = 401),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<GeneratePayslips>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let GeneratePayslips { month, employee_id } = payload.into_inner();
    let payslip_ids = payroll::generate_payslips(
        pool.get_ref(),
        &month,
        employee_id,
        Local::now().naive_local(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(GeneratePayslipsResponse {
        message: "Payslips generated".into(),
        month,
        payslip_ids,
    }))
}

#[utoipa::path(
    get,
    path = "/api/payslips",
    params(PayslipQuery),
    responses(
        (status = 200, description = "Payslips, most recently generated first", body = [Payslip]),
        (status = 400, description = "Invalid month or status filter"),
        (status = 403, description = "Non-admin asked for another employee")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<PayslipQuery>,
) -> actix_web::Result<impl Responder> {
    let PayslipQuery {
        employee_id,
        month,
        status,
    } = query.into_inner();

    let employee_id = if auth.is_admin() {
        employee_id
    } else {
        if let Some(id) = employee_id {
            auth.require_self_or_admin(id)?;
        }
        Some(auth.employee_id)
    };

    let filter = PayslipFilter {
        employee_id,
        month,
        status,
    };
    let payslips = payroll::list(pool.get_ref(), &filter).await?;

    Ok(HttpResponse::Ok().json(payslips))
}

#[utoipa::path(
    patch,
    path = "/api/payslips/{payslip_id}",
    request_body = UpdatePayslip,
    params(
        ("payslip_id", description = "Payslip ID")
    ),
    responses(
        (status = 200, description = "Payslip updated"),
        (status = 400, description = "status must be 'Draft' or 'Finalized'"),
        (status = 404, description = "Payslip not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_status(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    payload: web::Json<UpdatePayslip>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let status = payload
        .status
        .as_deref()
        .ok_or_else(|| AppError::invalid_input("status is required"))?;
    payroll::transition_status(pool.get_ref(), path.into_inner(), status).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Payslip updated" })))
}

#[utoipa::path(
    get,
    path = "/api/payslips/{payslip_id}/export",
    params(
        ("payslip_id", description = "Payslip ID")
    ),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Payslip not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn export(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    let payslip = payroll::get(pool.get_ref(), path.into_inner()).await?;
    auth.require_self_or_admin(payslip.employee_id)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"payslip_{}.csv\"", payslip.payslip_id),
        ))
        .body(payroll::payslip_csv(&payslip)))
}

#[cfg(test)]
mod tests {
    use crate::model::role::Role;
    use crate::service::payroll;
    use crate::test_utils::{
        at, bearer, create_test_employee, peer, setup_test_db, test_app, test_config, token_for,
    };
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn export_is_limited_to_owner_and_admin() {
        let pool = setup_test_db().await;
        let config = test_config();
        let admin = create_test_employee(&pool, "admin@x.io", 0.0, Role::Admin).await;
        let owner = create_test_employee(&pool, "owner@x.io", 3000.0, Role::Employee).await;
        let other = create_test_employee(&pool, "other@x.io", 3000.0, Role::Gate).await;
        let ids = payroll::generate_payslips(&pool, "2024-02", Some(owner), at(2024, 3, 1, 8, 0))
            .await
            .unwrap();
        let uri = format!("/api/payslips/{}/export", ids[0]);

        let admin_token = token_for(&config, admin, "admin@x.io", Role::Admin);
        let owner_token = token_for(&config, owner, "owner@x.io", Role::Employee);
        let other_token = token_for(&config, other, "other@x.io", Role::Gate);
        let app = test_app!(pool, config);

        for (token, expected) in [
            (&other_token, StatusCode::FORBIDDEN),
            (&owner_token, StatusCode::OK),
            (&admin_token, StatusCode::OK),
        ] {
            let req = test::TestRequest::get()
                .uri(&uri)
                .peer_addr(peer())
                .insert_header(bearer(token))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }

    #[actix_web::test]
    async fn only_admin_generates_and_gets_ids_back() {
        let pool = setup_test_db().await;
        let config = test_config();
        let admin = create_test_employee(&pool, "admin@x.io", 0.0, Role::Admin).await;
        let worker = create_test_employee(&pool, "w@x.io", 3000.0, Role::Employee).await;
        let admin_token = token_for(&config, admin, "admin@x.io", Role::Admin);
        let worker_token = token_for(&config, worker, "w@x.io", Role::Employee);
        let app = test_app!(pool, config);

        let req = test::TestRequest::post()
            .uri("/api/payslips/generate")
            .peer_addr(peer())
            .insert_header(bearer(&worker_token))
            .set_json(json!({ "month": "2024-02" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/payslips/generate")
            .peer_addr(peer())
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "month": "2024-02", "employee_id": worker }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["month"], "2024-02");
        assert_eq!(body["payslip_ids"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri("/api/payslips/generate")
            .peer_addr(peer())
            .insert_header(bearer(&admin_token))
            .set_json(json!({ "month": "2024-2x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn malformed_requests_get_json_errors() {
        let pool = setup_test_db().await;
        let config = test_config();
        let admin = create_test_employee(&pool, "admin@x.io", 0.0, Role::Admin).await;
        let token = token_for(&config, admin, "admin@x.io", Role::Admin);
        let app = test_app!(pool, config);

        let missing_month = test::TestRequest::post()
            .uri("/api/payslips/generate")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({ "employee_id": 1 }));
        let bad_query = test::TestRequest::get()
            .uri("/api/payslips?employee_id=abc")
            .peer_addr(peer())
            .insert_header(bearer(&token));
        let bad_path = test::TestRequest::get()
            .uri("/api/payslips/abc/export")
            .peer_addr(peer())
            .insert_header(bearer(&token));

        for req in [missing_month, bad_query, bad_path] {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{body}");
        }
    }

    #[actix_web::test]
    async fn non_admin_list_sees_only_own_payslips() {
        let pool = setup_test_db().await;
        let config = test_config();
        let me = create_test_employee(&pool, "me@x.io", 1000.0, Role::Employee).await;
        let other = create_test_employee(&pool, "other@x.io", 1000.0, Role::Employee).await;
        payroll::generate_payslips(&pool, "2024-01", None, at(2024, 2, 1, 8, 0))
            .await
            .unwrap();
        let token = token_for(&config, me, "me@x.io", Role::Employee);
        let app = test_app!(pool, config);

        let req = test::TestRequest::get()
            .uri("/api/payslips")
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["employee_id"], me);

        let req = test::TestRequest::get()
            .uri(&format!("/api/payslips?employee_id={other}"))
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn invalid_status_is_rejected_over_http() {
        let pool = setup_test_db().await;
        let config = test_config();
        let admin = create_test_employee(&pool, "admin@x.io", 0.0, Role::Admin).await;
        let ids = payroll::generate_payslips(&pool, "2024-01", None, at(2024, 2, 1, 8, 0))
            .await
            .unwrap();
        let token = token_for(&config, admin, "admin@x.io", Role::Admin);
        let app = test_app!(pool, config);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/payslips/{}", ids[0]))
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({ "status": "Pending" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/payslips/{}", ids[0]))
            .peer_addr(peer())
            .insert_header(bearer(&token))
            .set_json(json!({ "status": "Finalized" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            payroll::get(&pool, ids[0]).await.unwrap().status.to_string(),
            "Finalized"
        );
    }
}
