// src/fulfillment.rs
//
// Order Fulfillment Workflow: guarded status transition to PAID, then
// ticket generation, QR upload, email and SMS delivery, and an order log.
// The transition is the only hard-failure point; everything after it is
// accumulated into a summary the caller inspects, never an overall error.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::future::Future;
use uuid::Uuid;

use crate::models::{AdminPrincipal, Order, OrderPass, OrderStatus};
use crate::{db, notify, qr, AppState};

pub const ACTION_SKIP_AMBASSADOR_CONFIRMATION: &str = "skip_ambassador_confirmation";

const ACCESS_TOKEN_FALLBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedTicket {
    pub pass_type: String,
    pub secure_token: String,
    pub qr_image_url: String,
}

#[derive(Debug)]
pub enum TicketError {
    Qr(String),
    Upload(String),
    Insert(sqlx::Error),
    /// The (order_pass_id, unit_seq) slot was already claimed by a
    /// concurrent fulfillment.
    Duplicate,
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketError::Qr(e) => write!(f, "qr: {e}"),
            TicketError::Upload(e) => write!(f, "upload: {e}"),
            TicketError::Insert(e) => write!(f, "insert: {e}"),
            TicketError::Duplicate => write!(f, "unit already issued"),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct FulfillmentSummary {
    pub tickets_generated: bool,
    pub tickets_count: i64,
    pub tickets_already_generated: bool,
    pub email_sent: bool,
    pub sms_sent: bool,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ApprovalOutcome {
    pub order_id: i32,
    pub old_status: String,
    pub new_status: &'static str,
    pub idempotent: bool,
    pub fulfillment: FulfillmentSummary,
}

#[derive(Debug)]
pub enum ApprovalError {
    NotFound,
    InvalidStatus { current: String },
    Db(sqlx::Error),
}

impl fmt::Display for ApprovalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalError::NotFound => write!(f, "order not found"),
            ApprovalError::InvalidStatus { current } => {
                write!(f, "invalid order status: {current}")
            }
            ApprovalError::Db(e) => write!(f, "db error: {e}"),
        }
    }
}

impl From<sqlx::Error> for ApprovalError {
    fn from(value: sqlx::Error) -> Self {
        Self::Db(value)
    }
}

/// Runs an operation whose failure must never abort the workflow. Used for
/// every audit write so the intent is visible at the call site.
pub async fn best_effort<T, E, F>(what: &str, op: F)
where
    E: fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    if let Err(e) = op.await {
        log::warn!("best-effort {what} failed: {e}");
    }
}

pub async fn approve_order(
    state: &AppState,
    order_id: i32,
    admin: &AdminPrincipal,
    reason: Option<&str>,
) -> Result<ApprovalOutcome, ApprovalError> {
    let Some(order) = db::get_order(&state.pool, order_id).await? else {
        return Err(ApprovalError::NotFound);
    };
    let old_status = order.status.clone();

    let parsed = OrderStatus::parse(&order.status);
    let approvable = parsed.map(|s| s.approvable()).unwrap_or(false);
    let already_paid = parsed == Some(OrderStatus::Paid);

    if !approvable && !already_paid {
        record_invalid_transition(state, order_id, &old_status, admin).await;
        return Err(ApprovalError::InvalidStatus { current: old_status });
    }

    let mut idempotent = already_paid;
    if !already_paid {
        let updated = db::transition_order_to_paid(&state.pool, order_id).await?;
        if updated == 0 {
            // Lost the conditional update to a concurrent request; re-read
            // to tell an idempotent repeat from a genuinely bad state.
            let Some(current) = db::get_order(&state.pool, order_id).await? else {
                return Err(ApprovalError::NotFound);
            };
            if OrderStatus::parse(&current.status) != Some(OrderStatus::Paid) {
                record_invalid_transition(state, order_id, &current.status, admin).await;
                return Err(ApprovalError::InvalidStatus {
                    current: current.status,
                });
            }
            idempotent = true;
        }
    }

    let fulfillment = fulfill(state, &order).await;

    best_effort(
        "order approval log",
        db::insert_order_log(
            &state.pool,
            order_id,
            ACTION_SKIP_AMBASSADOR_CONFIRMATION,
            &admin.id.to_string(),
            "admin",
            json!({
                "old_status": old_status,
                "new_status": OrderStatus::Paid.as_str(),
                "tickets_generated": fulfillment.tickets_generated,
                "tickets_count": fulfillment.tickets_count,
                "email_sent": fulfillment.email_sent,
                "sms_sent": fulfillment.sms_sent,
                "reason": reason,
                "admin_email": admin.email,
                "idempotent": idempotent,
            }),
        ),
    )
    .await;

    Ok(ApprovalOutcome {
        order_id,
        old_status,
        new_status: OrderStatus::Paid.as_str(),
        idempotent,
        fulfillment,
    })
}

async fn record_invalid_transition(
    state: &AppState,
    order_id: i32,
    current_status: &str,
    admin: &AdminPrincipal,
) {
    best_effort(
        "invalid transition audit",
        db::insert_security_audit(
            &state.pool,
            "invalid_status_transition",
            Some(admin.id),
            json!({
                "order_id": order_id,
                "current_status": current_status,
                "attempted_status": OrderStatus::Paid.as_str(),
                "admin_email": admin.email,
            }),
        ),
    )
    .await;
}

/// The post-transition sequence. Each step is individually idempotent; a
/// re-entered PAID order with tickets already issued short-circuits at the
/// first check.
async fn fulfill(state: &AppState, order: &Order) -> FulfillmentSummary {
    let mut summary = FulfillmentSummary::default();
    let mut errors: Vec<String> = Vec::new();

    match db::count_tickets(&state.pool, order.id).await {
        Ok(n) if n > 0 => {
            summary.tickets_already_generated = true;
            summary.tickets_count = n;
            return summary;
        }
        Ok(_) => {}
        Err(e) => {
            summary.error = Some(format!("ticket pre-check: {e}"));
            return summary;
        }
    }

    let passes = match db::list_order_passes(&state.pool, order.id).await {
        Ok(p) => p,
        Err(e) => {
            summary.error = Some(format!("read order passes: {e}"));
            return summary;
        }
    };
    if passes.is_empty() {
        summary.error = Some("order has no passes".to_string());
        return summary;
    }

    let access_token = Uuid::new_v4().simple().to_string();
    let expires_at = access_token_expiry(
        db::event_date_for_order(&state.pool, order.id)
            .await
            .unwrap_or_else(|e| {
                log::warn!("event date lookup failed order_id={}: {e}", order.id);
                None
            }),
    );
    if let Err(e) = db::set_order_access_token(&state.pool, order.id, &access_token, expires_at).await {
        errors.push(format!("access token: {e}"));
    }

    let mut generated: Vec<GeneratedTicket> = Vec::new();
    let mut failed_units = 0usize;
    for pass in &passes {
        for seq in 0..pass.quantity {
            match generate_unit(state, order.id, pass, seq).await {
                Ok(ticket) => generated.push(ticket),
                Err(TicketError::Duplicate) => {}
                Err(e) => {
                    failed_units += 1;
                    log::warn!(
                        "ticket unit failed order_id={} pass_id={} seq={seq}: {e}",
                        order.id,
                        pass.id
                    );
                }
            }
        }
    }

    summary.tickets_count = generated.len() as i64;
    summary.tickets_generated = !generated.is_empty();

    if generated.is_empty() {
        errors.push("ticket generation produced zero tickets".to_string());
        summary.error = Some(errors.join("; "));
        return summary;
    }
    if failed_units > 0 {
        errors.push(format!("{failed_units} ticket unit(s) failed"));
    }

    if order.buyer_email.is_some() {
        if let Some(smtp) = &state.config.smtp {
            match notify::email::send_tickets(smtp, order, &passes, &generated).await {
                Ok(()) => {
                    summary.email_sent = true;
                    best_effort(
                        "mark tickets delivered",
                        db::mark_tickets_delivered(&state.pool, order.id),
                    )
                    .await;
                    best_effort(
                        "email delivery log",
                        db::insert_order_log(
                            &state.pool,
                            order.id,
                            "tickets_email_sent",
                            "system",
                            "system",
                            json!({
                                "recipient": order.buyer_email,
                                "tickets": generated.len(),
                            }),
                        ),
                    )
                    .await;
                }
                Err(e) => errors.push(format!("email: {e}")),
            }
        }
    }

    if order.buyer_phone.is_some() {
        if let Some(sms) = &state.config.sms {
            match notify::sms::send_confirmation(sms, order).await {
                Ok(true) => {
                    summary.sms_sent = true;
                    best_effort(
                        "sms log",
                        db::insert_order_log(
                            &state.pool,
                            order.id,
                            "confirmation_sms_sent",
                            "system",
                            "system",
                            json!({ "phone": order.buyer_phone }),
                        ),
                    )
                    .await;
                }
                Ok(false) => {}
                Err(e) => errors.push(format!("sms: {e}")),
            }
        }
    }

    if !errors.is_empty() {
        summary.error = Some(errors.join("; "));
    }

    summary
}

/// Order access tokens outlive the event by one day, or default to 30 days
/// when the order is not tied to a dated event.
pub fn access_token_expiry(event_date: Option<NaiveDate>) -> chrono::DateTime<Utc> {
    event_date
        .and_then(|d| d.succ_opt())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| Utc::now() + Duration::days(ACCESS_TOKEN_FALLBACK_DAYS))
}

async fn generate_unit(
    state: &AppState,
    order_id: i32,
    pass: &OrderPass,
    seq: i32,
) -> Result<GeneratedTicket, TicketError> {
    let token = Uuid::new_v4().simple().to_string();

    let png = qr::encode_png(&token).map_err(TicketError::Qr)?;
    let key = qr::ticket_key(order_id, &token);
    let url = qr::upload_ticket_image(state, &key, png)
        .await
        .map_err(TicketError::Upload)?;

    let inserted = db::insert_ticket(&state.pool, order_id, pass.id, seq, &token, &url)
        .await
        .map_err(TicketError::Insert)?;
    if !inserted {
        return Err(TicketError::Duplicate);
    }

    Ok(GeneratedTicket {
        pass_type: pass.pass_type.clone(),
        secure_token: token,
        qr_image_url: url,
    })
}
