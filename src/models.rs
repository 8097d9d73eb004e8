// src/models.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Order lifecycle as this service sees it. The fulfillment workflow only
/// accepts the two pending states and moves them to PAID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    PendingCash,
    PendingAdminApproval,
    Paid,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingCash => "PENDING_CASH",
            OrderStatus::PendingAdminApproval => "PENDING_ADMIN_APPROVAL",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING_CASH" => Some(OrderStatus::PendingCash),
            "PENDING_ADMIN_APPROVAL" => Some(OrderStatus::PendingAdminApproval),
            "PAID" => Some(OrderStatus::Paid),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "REJECTED" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }

    /// States the approval action may transition from.
    pub fn approvable(&self) -> bool {
        matches!(self, OrderStatus::PendingCash | OrderStatus::PendingAdminApproval)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AdminRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(AdminRole::Admin),
            "super_admin" => Some(AdminRole::SuperAdmin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i32,
    pub status: String,
    pub payment_status: String,
    pub source: Option<String>,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_phone: Option<String>,
    pub total_price: String,
    pub event_id: Option<i32>,
    pub qr_access_token: Option<String>,
    pub qr_access_expires_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderPass {
    pub id: i32,
    pub order_id: i32,
    pub pass_type: String,
    pub unit_price: String,
    pub quantity: i32,
}

/// Admin row as stored; the guard cross-checks token claims against it.
#[derive(Debug)]
pub struct AdminAccount {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
}

/// Authenticated admin identity. Only used for audit attribution, never
/// persisted by the workflow itself.
#[derive(Debug, Clone, Serialize)]
pub struct AdminPrincipal {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    pub expires_in_secs: i64,
}
