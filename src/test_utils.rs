use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use crate::{
    auth::jwt::generate_access_token,
    config::Config,
    db,
    model::{employee::NewEmployee, role::Role},
};

pub const TEST_SECRET: &str = "test-secret";

/// Fresh in-memory database with the schema applied. A single connection
/// that never expires, since every connection would get its own database.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::apply_schema(&pool).await.expect("schema");
    pool
}

/// On-disk database behind the production pool settings, so several
/// connections can write at once. Keep the directory alive for the test.
pub async fn setup_file_db() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let pool = db::init_db(&url).await.expect("file sqlite");
    (pool, dir)
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        jwt_secret: TEST_SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 3600,
        rate_login_per_min: 1000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".into(),
        default_employee_password: "employee123".into(),
        admin_email: None,
        admin_password: None,
        log_dir: "logs".into(),
        log_level: "debug".into(),
    }
}

/// Inserts an active employee directly, bypassing validation and hashing.
pub async fn create_test_employee(pool: &SqlitePool, email: &str, salary: f64, role: Role) -> i64 {
    sqlx::query(
        r#"
        INSERT INTO employees (full_name, email, password_hash, gross_monthly_salary, date_of_joining, role)
        VALUES (?, ?, 'not-a-hash', ?, '2024-01-01', ?)
        "#,
    )
    .bind(format!("Test {email}"))
    .bind(email)
    .bind(salary)
    .bind(role.to_string())
    .execute(pool)
    .await
    .expect("insert employee")
    .last_insert_rowid()
}

pub fn new_employee(email: &str, salary: f64) -> NewEmployee {
    NewEmployee {
        full_name: "Jane Doe".into(),
        email: email.into(),
        password_hash: "not-a-hash".into(),
        role: Role::Employee,
        job_title: Some("Engineer".into()),
        department: None,
        phone_number: None,
        gross_monthly_salary: salary,
        date_of_joining: date(2024, 1, 1),
    }
}

pub fn token_for(config: &Config, employee_id: i64, email: &str, role: Role) -> String {
    generate_access_token(
        employee_id,
        email.to_string(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .expect("token")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).expect("valid time")
}

/// Initializes the full route table against `$pool` and `$config`.
/// Requests must set a `peer_addr`: the rate limiters key on it.
macro_rules! test_app {
    ($pool:expr, $config:expr) => {{
        let config: $crate::config::Config = $config;
        let limiters = $crate::routes::RateLimiters::from_config(&config);
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .app_data(actix_web::web::Data::new(config.clone()))
                .app_data(actix_web::web::Data::new(
                    $crate::utils::email_index::EmailIndex::new(),
                ))
                .configure(|cfg| $crate::routes::configure(cfg, &config, &limiters)),
        )
        .await
    }};
}

pub(crate) use test_app;

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

pub fn peer() -> std::net::SocketAddr {
    std::net::SocketAddr::from(([127, 0, 0, 1], 40000))
}
