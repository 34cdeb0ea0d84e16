use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::attendance::{AttendanceRecord, DateRange, Pagination},
    service::{attendance, directory},
    utils::tabular::{opt, render_csv},
};
use actix_web::{HttpResponse, Responder, http::header, web};
use chrono::{Local, NaiveDate};
use futures::TryStreamExt;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct AttendanceRequest {
    #[schema(example = 1)]
    pub employee_id: Option<i64>,
}

#[derive(Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Inclusive start date (YYYY-MM-DD)
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD)
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize, IntoParams)]
pub struct ExportQuery {
    /// Omit to export everyone (Admin/Gate only)
    pub employee_id: Option<i64>,
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
}

const EXPORT_HEADERS: [&str; 5] = [
    "employee_id",
    "attendance_date",
    "clock_in_time",
    "clock_out_time",
    "notes",
];

fn target_employee(payload: &AttendanceRequest) -> Result<i64, AppError> {
    payload
        .employee_id
        .ok_or_else(|| AppError::invalid_input("Employee ID is required"))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkin",
    request_body = AttendanceRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Employee 1 checked in at 09:00:00"
        })),
        (status = 400, description = "Employee ID is required"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Already checked in today", body = Object, example = json!({
            "error": "Already checked in today"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<AttendanceRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = target_employee(&payload)?;
    auth.require_self_or_staff(employee_id)?;

    let now = Local::now().naive_local();
    attendance::check_in(pool.get_ref(), employee_id, now).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Employee {employee_id} checked in at {}", now.format("%H:%M:%S"))
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/checkout",
    request_body = AttendanceRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Employee 1 checked out at 17:30:00"
        })),
        (status = 400, description = "Must check in before checking out", body = Object, example = json!({
            "error": "Must check in before checking out"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Already checked out today")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    payload: web::Json<AttendanceRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = target_employee(&payload)?;
    auth.require_self_or_staff(employee_id)?;

    let now = Local::now().naive_local();
    attendance::check_out(pool.get_ref(), employee_id, now).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Employee {employee_id} checked out at {}", now.format("%H:%M:%S"))
    })))
}

/// Attendance history, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(
        ("employee_id", description = "Employee ID"),
        HistoryQuery
    ),
    responses(
        (status = 200, body = [AttendanceRecord]),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    query: web::Query<HistoryQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_staff(employee_id)?;

    if !directory::employee_exists(pool.get_ref(), employee_id).await? {
        return Err(AppError::not_found("Employee not found").into());
    }

    let page = attendance::validate_page(Pagination {
        limit: query.limit,
        offset: query.offset,
    })?;
    let range = DateRange {
        from: query.from,
        to: query.to,
    };

    let records: Vec<AttendanceRecord> =
        attendance::history(pool.get_ref(), Some(employee_id), range, page)
            .try_collect()
            .await
            .map_err(AppError::from)?;

    Ok(HttpResponse::Ok().json(records))
}

/// Attendance as CSV
#[utoipa::path(
    get,
    path = "/api/attendance/export/csv",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export(
    auth: AuthUser,
    pool: web::Data<SqlitePool>,
    query: web::Query<ExportQuery>,
) -> actix_web::Result<impl Responder> {
    // Staff may export anyone; everyone else is pinned to their own rows.
    let employee_id = match query.employee_id {
        Some(id) => {
            auth.require_self_or_staff(id)?;
            Some(id)
        }
        None if auth.role.is_staff() => None,
        None => Some(auth.employee_id),
    };
    let range = DateRange {
        from: query.from,
        to: query.to,
    };

    let rows: Vec<Vec<String>> =
        attendance::history(pool.get_ref(), employee_id, range, Pagination::default())
            .map_ok(|r| {
                vec![
                    r.employee_id.to_string(),
                    r.attendance_date.to_string(),
                    opt(&r.clock_in_time),
                    opt(&r.clock_out_time),
                    opt(&r.notes),
                ]
            })
            .try_collect()
            .await
            .map_err(AppError::from)?;

    let filename = match employee_id {
        Some(id) => format!("attendance_{id}.csv"),
        None => "attendance.csv".to_string(),
    };

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(render_csv(&EXPORT_HEADERS, rows)))
}
