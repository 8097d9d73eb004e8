// src/api/passes.rs

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;

use crate::auth::{self, AdminAuth};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EventPassView {
    pub id: i32,
    pub event_id: i32,
    pub name: String,
    pub price: String,
    pub max_quantity: Option<i32>,
    pub sold_quantity: i32,
    pub remaining_quantity: Option<i32>,
    pub is_unlimited: bool,
    pub is_active: bool,
}

fn pass_from_row(r: sqlx::postgres::PgRow) -> EventPassView {
    let max_quantity: Option<i32> = r.get("max_quantity");
    let sold_quantity: i32 = r.get("sold_quantity");
    EventPassView {
        id: r.get("id"),
        event_id: r.get("event_id"),
        name: r.get("name"),
        price: r.get("price"),
        remaining_quantity: max_quantity.map(|m| m - sold_quantity),
        is_unlimited: max_quantity.is_none(),
        max_quantity,
        sold_quantity,
        is_active: r.get("is_active"),
    }
}

const PASS_COLUMNS: &str =
    "id, event_id, name, price::text as price, max_quantity, sold_quantity, is_active";

#[get("/api/admin/passes/{event_id}")]
pub async fn list_event_passes(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> impl Responder {
    if let AdminAuth::Denied { reason, status } = auth::authenticate_admin(&req, &state).await {
        return auth::denial_response(status, &reason);
    }

    let event_id = path.into_inner();
    let rows = match sqlx::query(&format!(
        "SELECT {PASS_COLUMNS} FROM event_passes WHERE event_id = $1 ORDER BY id"
    ))
    .bind(event_id)
    .fetch_all(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("list passes db error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let passes: Vec<EventPassView> = rows.into_iter().map(pass_from_row).collect();
    HttpResponse::Ok().json(json!({ "success": true, "passes": passes }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStockRequest {
    /// None switches the pass to unlimited stock.
    pub max_quantity: Option<i32>,
}

#[post("/api/admin/passes/{id}/stock")]
pub async fn update_pass_stock(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    payload: web::Json<UpdateStockRequest>,
) -> impl Responder {
    if let AdminAuth::Denied { reason, status } = auth::authenticate_admin(&req, &state).await {
        return auth::denial_response(status, &reason);
    }

    let pass_id = path.into_inner();

    let sold: i32 = match sqlx::query("SELECT sold_quantity FROM event_passes WHERE id = $1")
        .bind(pass_id)
        .fetch_optional(&state.pool)
        .await
    {
        Ok(Some(r)) => r.get("sold_quantity"),
        Ok(None) => return HttpResponse::NotFound().json(json!({ "error": "pass not found" })),
        Err(e) => {
            eprintln!("pass stock read error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Some(max) = payload.max_quantity {
        if max < sold {
            return HttpResponse::BadRequest().json(json!({
                "error": "max_quantity below sold quantity",
                "details": format!("{} already sold", sold),
            }));
        }
    }

    let row = match sqlx::query(&format!(
        "UPDATE event_passes SET max_quantity = $1 WHERE id = $2 RETURNING {PASS_COLUMNS}"
    ))
    .bind(payload.max_quantity)
    .bind(pass_id)
    .fetch_one(&state.pool)
    .await
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("pass stock update error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(json!({ "success": true, "pass": pass_from_row(row) }))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[post("/api/admin/passes/{id}/activate")]
pub async fn set_pass_active(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    payload: web::Json<SetActiveRequest>,
) -> impl Responder {
    if let AdminAuth::Denied { reason, status } = auth::authenticate_admin(&req, &state).await {
        return auth::denial_response(status, &reason);
    }

    let pass_id = path.into_inner();
    let row = match sqlx::query(&format!(
        "UPDATE event_passes SET is_active = $1 WHERE id = $2 RETURNING {PASS_COLUMNS}"
    ))
    .bind(payload.is_active)
    .bind(pass_id)
    .fetch_optional(&state.pool)
    .await
    {
        Ok(Some(r)) => r,
        Ok(None) => return HttpResponse::NotFound().json(json!({ "error": "pass not found" })),
        Err(e) => {
            eprintln!("pass activate error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(json!({ "success": true, "pass": pass_from_row(row) }))
}
