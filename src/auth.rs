// src/auth.rs
//
// Admin session guard. The session is a JWT carried in an HttpOnly cookie;
// the guard validates it, then cross-checks the claims against the admins
// table so a token minted for a deleted or demoted account stops working.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::models::{AdminPrincipal, AdminRole};
use crate::AppState;

pub const ADMIN_COOKIE: &str = "adminToken";

const SESSION_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: i32,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

/// Tagged authorization decision. Handlers either get a principal or a
/// machine-readable denial they convert straight into a response.
#[derive(Debug)]
pub enum AdminAuth {
    Authorized(AdminPrincipal),
    Denied { reason: String, status: u16 },
}

impl AdminAuth {
    fn denied(status: u16, reason: &str) -> Self {
        AdminAuth::Denied {
            reason: reason.to_string(),
            status,
        }
    }
}

pub fn denial_response(status: u16, reason: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": reason });
    match status {
        401 => HttpResponse::Unauthorized().json(body),
        403 => HttpResponse::Forbidden().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

pub fn issue_admin_token(
    config: &Config,
    admin_id: i32,
    email: &str,
    role: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(SESSION_HOURS))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = AdminClaims {
        sub: admin_id,
        email: email.to_string(),
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
}

pub fn decode_admin_token(
    secret: &str,
    token: &str,
) -> Result<AdminClaims, jsonwebtoken::errors::Error> {
    decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn admin_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build(ADMIN_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production)
        .max_age(CookieDuration::hours(SESSION_HOURS))
        .finish()
}

pub fn clear_admin_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build(ADMIN_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.production)
        .max_age(CookieDuration::ZERO)
        .finish()
}

pub async fn authenticate_admin(req: &HttpRequest, state: &AppState) -> AdminAuth {
    let Some(cookie) = req.cookie(ADMIN_COOKIE) else {
        return AdminAuth::denied(401, "missing admin session");
    };

    // Fail closed: never accept sessions signed with the shipped dev secret
    // on a production deployment.
    if state.config.production && state.config.jwt_secret_is_insecure() {
        log::error!("admin auth refused: JWT_SECRET left at insecure default in production");
        return AdminAuth::denied(500, "server auth misconfigured");
    }

    let claims = match decode_admin_token(&state.config.jwt_secret, cookie.value()) {
        Ok(c) => c,
        Err(_) => return AdminAuth::denied(401, "invalid or expired token"),
    };

    if AdminRole::parse(&claims.role).is_none() {
        return AdminAuth::denied(403, "insufficient role");
    }

    let account = match crate::db::get_admin_by_id(&state.pool, claims.sub).await {
        Ok(Some(a)) => a,
        Ok(None) => return AdminAuth::denied(401, "unknown admin account"),
        Err(e) => {
            log::error!("admin lookup error: {e}");
            return AdminAuth::denied(500, "auth lookup failed");
        }
    };

    if !account.is_active {
        return AdminAuth::denied(401, "account deactivated");
    }

    // Stale or forged token: claims must match what the store says today.
    if account.email != claims.email || account.role != claims.role {
        return AdminAuth::denied(401, "session does not match account");
    }

    let expires_in_secs = claims.exp as i64 - Utc::now().timestamp();

    AdminAuth::Authorized(AdminPrincipal {
        id: account.id,
        email: account.email,
        name: account.name,
        role: account.role,
        expires_in_secs,
    })
}
