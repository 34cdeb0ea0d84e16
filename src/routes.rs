use crate::{
    api::{admin, attendance, employee, payslip, system},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::{json_error_handler, path_error_handler, query_error_handler},
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Built once per server so every worker shares the same buckets.
#[derive(Clone)]
pub struct RateLimiters {
    login: Limiter,
    protected: Limiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Self {
        Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)),
        }
    }
}

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    let prefix = config.api_prefix.trim_end_matches('/');

    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler));

    // Public routes, registered ahead of the authenticated scope sharing the prefix.
    cfg.service(web::resource("/healthz").route(web::get().to(system::healthz)))
        .service(
            web::resource(format!("{prefix}/login"))
                .wrap(limiters.login.clone())
                .route(web::post().to(handlers::login)),
        )
        .service(web::resource(format!("{prefix}/time")).route(web::get().to(system::server_time)));

    // Protected routes
    cfg.service(
        web::scope(prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(
                web::resource("/me")
                    .route(web::get().to(handlers::me))
                    .route(web::patch().to(handlers::update_me)),
            )
            .service(
                web::resource("/me/change-password")
                    .route(web::post().to(handlers::change_password)),
            )
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::deactivate_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("/checkin").route(web::post().to(attendance::check_in)))
                    .service(
                        web::resource("/checkout").route(web::post().to(attendance::check_out)),
                    )
                    // before /{employee_id} so "export" is not taken for an id
                    .service(
                        web::resource("/export/csv").route(web::get().to(attendance::export)),
                    )
                    .service(
                        web::resource("/{employee_id}").route(web::get().to(attendance::history)),
                    ),
            )
            .service(
                web::scope("/payslips")
                    // /payslips
                    .service(web::resource("").route(web::get().to(payslip::list)))
                    .service(web::resource("/generate").route(web::post().to(payslip::generate)))
                    // /payslips/{id}
                    .service(
                        web::resource("/{id}").route(web::patch().to(payslip::update_status)),
                    )
                    .service(web::resource("/{id}/export").route(web::get().to(payslip::export))),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/reset-password")
                            .route(web::post().to(admin::reset_password)),
                    )
                    .service(web::resource("/summary").route(web::get().to(admin::summary))),
            ),
    );
}
