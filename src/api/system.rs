use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::{db, error::AppError};

#[derive(Serialize, ToSchema)]
pub struct Health {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub database: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    #[schema(example = "2024-03-01T09:00:00.123+06:00")]
    pub iso: String,
    pub epoch_ms: i64,
    pub offset_minutes: i32,
}

/// Liveness/readiness check
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, body = Health),
        (status = 500, description = "Database unreachable")
    ),
    tag = "System"
)]
pub async fn healthz(pool: web::Data<SqlitePool>) -> actix_web::Result<impl Responder> {
    db::ping(pool.get_ref())
        .await
        .map_err(|e| AppError::Internal(format!("healthcheck failed: {e}")))?;

    Ok(HttpResponse::Ok().json(Health {
        status: "ok".into(),
        database: "ok".into(),
    }))
}

/// Server-local clock, used by clients to detect skew
#[utoipa::path(
    get,
    path = "/api/time",
    responses((status = 200, body = ServerTime)),
    tag = "System"
)]
pub async fn server_time() -> impl Responder {
    let now = Local::now();

    HttpResponse::Ok().json(ServerTime {
        iso: now.to_rfc3339(),
        epoch_ms: now.timestamp_millis(),
        offset_minutes: now.offset().local_minus_utc() / 60,
    })
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{peer, setup_test_db, test_app, test_config};
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn health_and_time_are_public() {
        let pool = setup_test_db().await;
        let app = test_app!(pool, test_config());

        let req = test::TestRequest::get().uri("/healthz").peer_addr(peer()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "ok");

        let req = test::TestRequest::get().uri("/api/time").peer_addr(peer()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["epochMs"].as_i64().is_some());
        assert!(body["iso"].as_str().is_some());
    }
}
