use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// Verified caller identity.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: i64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already verified by the auth middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        ready(authenticate(req).map_err(Into::into))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal("Config missing".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

    Ok(AuthUser {
        employee_id: claims.employee_id,
        email: claims.sub,
        role: claims.role,
    })
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Forbidden: Admins only"))
        }
    }

    /// Admin and Gate act for anyone; everybody else only for themselves.
    pub fn require_self_or_staff(&self, employee_id: i64) -> Result<(), AppError> {
        if self.role.is_staff() || self.employee_id == employee_id {
            Ok(())
        } else {
            Err(AppError::forbidden("Forbidden"))
        }
    }

    pub fn require_self_or_admin(&self, employee_id: i64) -> Result<(), AppError> {
        if self.role == Role::Admin || self.employee_id == employee_id {
            Ok(())
        } else {
            Err(AppError::forbidden("Forbidden: You can only access your own records"))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
