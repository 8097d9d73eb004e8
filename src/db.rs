// src/db.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Row};

use crate::models::{AdminAccount, Order, OrderPass};

fn order_from_row(r: sqlx::postgres::PgRow) -> Order {
    Order {
        id: r.get("id"),
        status: r.get("status"),
        payment_status: r.get("payment_status"),
        source: r.get("source"),
        buyer_name: r.get("buyer_name"),
        buyer_email: r.get("buyer_email"),
        buyer_phone: r.get("buyer_phone"),
        total_price: r.get("total_price"),
        event_id: r.get("event_id"),
        qr_access_token: r.get("qr_access_token"),
        qr_access_expires_at: r.get("qr_access_expires_at"),
        approved_at: r.get("approved_at"),
        created_at: r.get("created_at"),
    }
}

pub async fn get_order(pool: &PgPool, order_id: i32) -> Result<Option<Order>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, status, payment_status, source, buyer_name, buyer_email, buyer_phone,
                  total_price::text as total_price, event_id, qr_access_token,
                  qr_access_expires_at, approved_at, created_at
           FROM orders
           WHERE id = $1"#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(order_from_row))
}

/// Conditional transition to PAID. The `status IN (...)` guard is the only
/// thing standing between two racing approval requests; the loser matches
/// zero rows and the caller re-reads to decide whether that was idempotent.
pub async fn transition_order_to_paid(pool: &PgPool, order_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE orders
           SET status = 'PAID', payment_status = 'PAID', approved_at = NOW(), updated_at = NOW()
           WHERE id = $1 AND status IN ('PENDING_CASH', 'PENDING_ADMIN_APPROVAL')"#,
    )
    .bind(order_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_order_passes(pool: &PgPool, order_id: i32) -> Result<Vec<OrderPass>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, order_id, pass_type, unit_price::text as unit_price, quantity
           FROM order_passes
           WHERE order_id = $1
           ORDER BY id"#,
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| OrderPass {
            id: r.get("id"),
            order_id: r.get("order_id"),
            pass_type: r.get("pass_type"),
            unit_price: r.get("unit_price"),
            quantity: r.get("quantity"),
        })
        .collect())
}

pub async fn count_tickets(pool: &PgPool, order_id: i32) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) as n FROM tickets WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await?;

    Ok(row.get("n"))
}

/// Inserts one ticket unit. Returns false when another fulfillment already
/// claimed this (order_pass_id, unit_seq) slot.
pub async fn insert_ticket(
    pool: &PgPool,
    order_id: i32,
    order_pass_id: i32,
    unit_seq: i32,
    secure_token: &str,
    qr_image_url: &str,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(
        r#"INSERT INTO tickets (order_id, order_pass_id, unit_seq, secure_token, qr_image_url, status)
           VALUES ($1, $2, $3, $4, $5, 'GENERATED')
           ON CONFLICT (order_pass_id, unit_seq) DO NOTHING
           RETURNING id"#,
    )
    .bind(order_id)
    .bind(order_pass_id)
    .bind(unit_seq)
    .bind(secure_token)
    .bind(qr_image_url)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

pub async fn mark_tickets_delivered(pool: &PgPool, order_id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE tickets
           SET status = 'DELIVERED', delivered_at = NOW()
           WHERE order_id = $1 AND status = 'GENERATED'"#,
    )
    .bind(order_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_order_access_token(
    pool: &PgPool,
    order_id: i32,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"UPDATE orders
           SET qr_access_token = $1, qr_access_expires_at = $2, qr_accessed = FALSE, updated_at = NOW()
           WHERE id = $3"#,
    )
    .bind(token)
    .bind(expires_at)
    .bind(order_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn event_date_for_order(
    pool: &PgPool,
    order_id: i32,
) -> Result<Option<NaiveDate>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT e.event_date
           FROM orders o
           JOIN events e ON e.id = o.event_id
           WHERE o.id = $1"#,
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|r| r.get("event_date")))
}

pub async fn insert_order_log(
    pool: &PgPool,
    order_id: i32,
    action: &str,
    performed_by: &str,
    performed_by_type: &str,
    details: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO order_logs (order_id, action, performed_by, performed_by_type, details)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(order_id)
    .bind(action)
    .bind(performed_by)
    .bind(performed_by_type)
    .bind(details)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_security_audit(
    pool: &PgPool,
    event_type: &str,
    admin_id: Option<i32>,
    details: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO security_audit_logs (event_type, admin_id, details)
           VALUES ($1, $2, $3)"#,
    )
    .bind(event_type)
    .bind(admin_id)
    .bind(details)
    .execute(pool)
    .await?;

    Ok(())
}

fn admin_from_row(r: sqlx::postgres::PgRow) -> AdminAccount {
    AdminAccount {
        id: r.get("id"),
        email: r.get("email"),
        password_hash: r.get("password_hash"),
        name: r.get("name"),
        role: r.get("role"),
        is_active: r.get("is_active"),
    }
}

pub async fn get_admin_by_id(pool: &PgPool, admin_id: i32) -> Result<Option<AdminAccount>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, email, password_hash, name, role, is_active FROM admins WHERE id = $1",
    )
    .bind(admin_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(admin_from_row))
}

pub async fn get_admin_by_email(pool: &PgPool, email: &str) -> Result<Option<AdminAccount>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT id, email, password_hash, name, role, is_active FROM admins WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(admin_from_row))
}
