use anyhow::{Context, anyhow};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Password given to employees created without one.
    pub default_employee_password: String,
    /// Seeds an Admin account when the directory has none.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,

    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    /// Reads the process environment; `main` loads `.env` beforehand.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "0.0.0.0:8000"),
            database_url: var_or("DATABASE_URL", "sqlite://employee.db"),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: parse_or("ACCESS_TOKEN_TTL", 8 * 60 * 60)?, // 8h

            rate_login_per_min: parse_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: parse_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: var_or("API_PREFIX", "/api"),

            default_employee_password: var_or("DEFAULT_EMPLOYEE_PASSWORD", "employee123"),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),

            log_dir: var_or("LOG_DIR", "logs"),
            log_level: var_or("LOG_LEVEL", "info"),
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
