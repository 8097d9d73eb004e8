// src/api/admin_auth.rs

use actix_web::{post, web, HttpResponse, Responder};
use bcrypt::verify;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::{auth, db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session cookie set"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Server error")
    )
)]
#[post("/api/admin/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<AdminLoginRequest>,
) -> impl Responder {
    let account = match db::get_admin_by_email(&state.pool, payload.email.trim()).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(json!({"error": "invalid credentials"}));
        }
        Err(e) => {
            eprintln!("admin login db error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if !account.is_active {
        return HttpResponse::Unauthorized().json(json!({"error": "invalid credentials"}));
    }

    match verify(&payload.password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::Unauthorized().json(json!({"error": "invalid credentials"}));
        }
        Err(e) => {
            eprintln!("bcrypt verify error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    let token = match auth::issue_admin_token(&state.config, account.id, &account.email, &account.role)
    {
        Ok(t) => t,
        Err(e) => {
            eprintln!("jwt encode error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok()
        .cookie(auth::admin_cookie(&state.config, token))
        .json(json!({
            "success": true,
            "admin": { "id": account.id, "email": account.email, "name": account.name, "role": account.role }
        }))
}

#[post("/api/admin/logout")]
pub async fn logout(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok()
        .cookie(auth::clear_admin_cookie(&state.config))
        .json(json!({ "success": true }))
}
