// src/api/orders.rs

use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::{self, AdminAuth};
use crate::fulfillment::{self, best_effort, ApprovalError};
use crate::{api, db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SkipConfirmationRequest {
    #[serde(rename = "orderId")]
    pub order_id: i32,
    pub reason: Option<String>,
}

/// Admin approval of a cash / pending order: transitions it to PAID and
/// runs ticket fulfillment. Partial fulfillment failures come back in the
/// body, never as an error status, once the transition itself succeeded.
#[utoipa::path(
    post,
    path = "/api/admin-skip-ambassador-confirmation",
    tag = "admin",
    request_body = SkipConfirmationRequest,
    responses(
        (status = 200, description = "Order approved; body carries the fulfillment summary"),
        (status = 400, description = "Invalid order status"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Server error")
    )
)]
#[post("/api/admin-skip-ambassador-confirmation")]
pub async fn skip_ambassador_confirmation(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<SkipConfirmationRequest>,
) -> impl Responder {
    let admin = match auth::authenticate_admin(&req, &state).await {
        AdminAuth::Authorized(p) => p,
        AdminAuth::Denied { reason, status } => return auth::denial_response(status, &reason),
    };

    let outcome = match fulfillment::approve_order(
        &state,
        payload.order_id,
        &admin,
        payload.reason.as_deref(),
    )
    .await
    {
        Ok(o) => o,
        Err(ApprovalError::NotFound) => {
            return HttpResponse::NotFound().json(json!({ "error": "Order not found" }));
        }
        Err(ApprovalError::InvalidStatus { current }) => {
            return HttpResponse::BadRequest().json(json!({
                "error": "Invalid order status",
                "details": current,
            }));
        }
        Err(ApprovalError::Db(e)) => {
            log::error!("approve order db error: {e}");
            return HttpResponse::InternalServerError().json(json!({ "error": "database error" }));
        }
    };

    HttpResponse::Ok().json(json!({
        "success": true,
        "orderId": outcome.order_id,
        "oldStatus": outcome.old_status,
        "newStatus": outcome.new_status,
        "idempotent": outcome.idempotent,
        "ticketsGenerated": outcome.fulfillment.tickets_generated,
        "ticketsAlreadyGenerated": outcome.fulfillment.tickets_already_generated,
        "ticketsCount": outcome.fulfillment.tickets_count,
        "emailSent": outcome.fulfillment.email_sent,
        "smsSent": outcome.fulfillment.sms_sent,
        "ticketError": outcome.fulfillment.error,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderEmailRequest {
    #[serde(rename = "orderId")]
    pub order_id: i32,
    #[serde(rename = "newEmail")]
    pub new_email: String,
}

#[post("/api/admin/update-order-email")]
pub async fn update_order_email(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<UpdateOrderEmailRequest>,
) -> impl Responder {
    let admin = match auth::authenticate_admin(&req, &state).await {
        AdminAuth::Authorized(p) => p,
        AdminAuth::Denied { reason, status } => return auth::denial_response(status, &reason),
    };

    let new_email = payload.new_email.trim().to_string();
    if !api::is_valid_email(&new_email) {
        return HttpResponse::BadRequest().json(json!({ "error": "invalid email" }));
    }

    let order = match db::get_order(&state.pool, payload.order_id).await {
        Ok(Some(o)) => o,
        Ok(None) => return HttpResponse::NotFound().json(json!({ "error": "Order not found" })),
        Err(e) => {
            eprintln!("update order email read error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = sqlx::query(
        "UPDATE orders SET buyer_email = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(&new_email)
    .bind(order.id)
    .execute(&state.pool)
    .await
    {
        eprintln!("update order email write error: {e}");
        return HttpResponse::InternalServerError().finish();
    }

    best_effort(
        "order email update log",
        db::insert_order_log(
            &state.pool,
            order.id,
            "order_email_updated",
            &admin.id.to_string(),
            "admin",
            json!({
                "old_email": order.buyer_email,
                "new_email": new_email,
                "admin_email": admin.email,
            }),
        ),
    )
    .await;

    HttpResponse::Ok().json(json!({
        "success": true,
        "orderId": order.id,
        "oldEmail": order.buyer_email,
        "newEmail": new_email,
    }))
}
