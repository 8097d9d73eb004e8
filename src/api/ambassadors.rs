// src/api/ambassadors.rs

use actix_web::{post, web, HttpResponse, Responder};
use bcrypt::verify;
use serde::Deserialize;
use serde_json::json;
use sqlx::Row;
use uuid::Uuid;

use crate::notify::sms::normalize_phone;
use crate::{api, AppState};

#[derive(Debug, Deserialize)]
pub struct AmbassadorApplication {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[post("/api/ambassador/apply")]
pub async fn apply(
    state: web::Data<AppState>,
    payload: web::Json<AmbassadorApplication>,
) -> impl Responder {
    let name = payload.name.trim();
    let email = payload.email.trim();

    if name.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "name is required" }));
    }
    if !api::is_valid_email(email) {
        return HttpResponse::BadRequest().json(json!({ "error": "invalid email" }));
    }
    let Some(phone) = normalize_phone(&payload.phone) else {
        return HttpResponse::BadRequest().json(json!({ "error": "invalid phone number" }));
    };

    let promo_code = format!(
        "AMB-{}",
        &Uuid::new_v4().simple().to_string()[..8].to_uppercase()
    );

    let row = match sqlx::query(
        r#"INSERT INTO ambassadors (name, email, phone, promo_code, status)
           VALUES ($1, $2, $3, $4, 'PENDING')
           RETURNING id"#,
    )
    .bind(name)
    .bind(email)
    .bind(&phone)
    .bind(&promo_code)
    .fetch_one(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => {
            // only a duplicate application is the caller's fault
            if e.as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                return HttpResponse::BadRequest().json(json!({
                    "error": "application already exists"
                }));
            }
            eprintln!("ambassador apply db error: {e}");
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "failed to save application" }));
        }
    };

    let ambassador_id: i32 = row.get("id");

    HttpResponse::Ok().json(json!({
        "success": true,
        "ambassadorId": ambassador_id,
        "status": "PENDING",
    }))
}

#[derive(Debug, Deserialize)]
pub struct AmbassadorLoginRequest {
    pub email: String,
    pub password: String,
}

#[post("/api/ambassador/login")]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<AmbassadorLoginRequest>,
) -> impl Responder {
    let row = match sqlx::query(
        "SELECT id, name, promo_code, status, password_hash FROM ambassadors WHERE email = $1",
    )
    .bind(payload.email.trim())
    .fetch_optional(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ambassador login db error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let Some(row) = row else {
        return HttpResponse::Unauthorized().json(json!({ "error": "invalid credentials" }));
    };

    let status: String = row.get("status");
    if status != "APPROVED" {
        return HttpResponse::Forbidden().json(json!({ "error": "application not approved" }));
    }

    let Some(password_hash) = row.get::<Option<String>, _>("password_hash") else {
        return HttpResponse::Unauthorized().json(json!({ "error": "invalid credentials" }));
    };

    match verify(&payload.password, &password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::Unauthorized().json(json!({ "error": "invalid credentials" }));
        }
        Err(e) => {
            eprintln!("bcrypt verify error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    }

    HttpResponse::Ok().json(json!({
        "success": true,
        "ambassadorId": row.get::<i32, _>("id"),
        "name": row.get::<String, _>("name"),
        "promoCode": row.get::<String, _>("promo_code"),
    }))
}
