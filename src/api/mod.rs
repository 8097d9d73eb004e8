// src/api/mod.rs

pub mod admin_auth;
pub mod ambassadors;
pub mod orders;
pub mod passes;
pub mod subscribe;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(admin_auth::login)
        .service(admin_auth::logout)
        .service(orders::skip_ambassador_confirmation)
        .service(orders::update_order_email)
        .service(passes::list_event_passes)
        .service(passes::update_pass_stock)
        .service(passes::set_pass_active)
        .service(ambassadors::apply)
        .service(ambassadors::login)
        .service(subscribe::subscribe_phone);
}

/// Basic shape check used where an email enters the system: one '@', a
/// non-empty local part, a dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}
