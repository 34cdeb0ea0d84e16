use actix_web::middleware::{Logger, NormalizePath, from_fn};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use chrono::Local;
use dotenvy::dotenv;
use sqlx::SqlitePool;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use attendance_payroll::{
    auth::password::hash_password,
    config::Config,
    db::init_db,
    docs::ApiDoc,
    model::{employee::NewEmployee, role::Role},
    routes::{self, RateLimiters},
    service::directory,
    utils::{email_index::EmailIndex, request_id::request_id},
};

/// Seeds an Admin from `ADMIN_EMAIL`/`ADMIN_PASSWORD` when the directory has none.
async fn bootstrap_admin(
    pool: &SqlitePool,
    index: &EmailIndex,
    config: &Config,
) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(());
    };
    if directory::has_admin(pool).await? {
        return Ok(());
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!("{e}"))?;
    let employee_id = directory::create(
        pool,
        index,
        NewEmployee {
            full_name: "Administrator".into(),
            email: email.clone(),
            password_hash,
            role: Role::Admin,
            job_title: None,
            department: None,
            phone_number: None,
            gross_monthly_salary: 0.0,
            date_of_joining: Local::now().date_naive(),
        },
    )
    .await?;

    info!(employee_id, "Bootstrap admin created");
    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(
            config
                .log_level
                .parse::<tracing::Level>()
                .unwrap_or(tracing::Level::INFO),
        )
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let email_index = Data::new(EmailIndex::new());

    if let Err(e) = bootstrap_admin(&pool, &email_index, &config).await {
        warn!(error = %e, "Admin bootstrap skipped");
    }

    let index_for_warmup = email_index.clone();
    let pool_for_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = index_for_warmup.warmup(&pool_for_warmup, 250).await {
            warn!(error = %e, "Failed to warm up email index");
        }
    });

    let server_addr = config.server_addr.clone();
    let limiters = RateLimiters::from_config(&config);
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(from_fn(request_id))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(config_data.clone())
            .app_data(email_index.clone())
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
