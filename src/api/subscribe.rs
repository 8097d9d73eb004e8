// src/api/subscribe.rs

use actix_web::{post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::notify::sms::normalize_phone;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub phone: String,
}

#[utoipa::path(
    post,
    path = "/api/subscribe",
    tag = "public",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Phone registered"),
        (status = 400, description = "Invalid phone number"),
        (status = 500, description = "Server error")
    )
)]
#[post("/api/subscribe")]
pub async fn subscribe_phone(
    state: web::Data<AppState>,
    payload: web::Json<SubscribeRequest>,
) -> impl Responder {
    let Some(phone) = normalize_phone(&payload.phone) else {
        return HttpResponse::BadRequest().json(json!({ "error": "invalid phone number" }));
    };

    if let Err(e) = sqlx::query(
        "INSERT INTO phone_subscribers (phone) VALUES ($1) ON CONFLICT (phone) DO NOTHING",
    )
    .bind(&phone)
    .execute(&state.pool)
    .await
    {
        eprintln!("subscribe db error: {e}");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok().json(json!({ "success": true, "phone": phone }))
}
