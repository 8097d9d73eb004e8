use actix_web::cookie::{Cookie, SameSite};
use actix_web::test::TestRequest;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use eventpass::auth::{
    admin_cookie, authenticate_admin, clear_admin_cookie, decode_admin_token, issue_admin_token,
    AdminAuth, ADMIN_COOKIE,
};
use eventpass::config::{Config, INSECURE_DEV_SECRET};
use eventpass::AppState;

fn config_with_secret(secret: &str, production: bool) -> Config {
    Config {
        jwt_secret: secret.to_string(),
        production,
        s3_bucket: "b".to_string(),
        s3_public_base_url: "http://localhost".to_string(),
        mock_storage: true,
        smtp: None,
        sms: None,
    }
}

#[test]
fn admin_token_round_trips_claims() {
    let config = config_with_secret("unit-test-secret", false);
    let token = issue_admin_token(&config, 7, "admin@example.com", "admin").expect("issue");

    let claims = decode_admin_token(&config.jwt_secret, &token).expect("decode");
    assert_eq!(claims.sub, 7);
    assert_eq!(claims.email, "admin@example.com");
    assert_eq!(claims.role, "admin");
}

#[test]
fn admin_token_rejects_wrong_secret() {
    let config = config_with_secret("secret-a", false);
    let token = issue_admin_token(&config, 7, "admin@example.com", "admin").expect("issue");

    assert!(decode_admin_token("secret-b", &token).is_err());
}

#[test]
fn session_cookie_is_httponly_lax_and_secure_in_production() {
    let dev = config_with_secret("s", false);
    let prod = config_with_secret("s", true);

    let dev_cookie = admin_cookie(&dev, "tok".to_string());
    assert_eq!(dev_cookie.name(), ADMIN_COOKIE);
    assert_eq!(dev_cookie.http_only(), Some(true));
    assert_eq!(dev_cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(dev_cookie.secure(), Some(false));

    let prod_cookie = admin_cookie(&prod, "tok".to_string());
    assert_eq!(prod_cookie.secure(), Some(true));
}

#[test]
fn logout_cookie_expires_immediately() {
    let config = config_with_secret("s", false);
    let cookie = clear_admin_cookie(&config);
    assert_eq!(cookie.name(), ADMIN_COOKIE);
    assert_eq!(cookie.value(), "");
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::ZERO)
    );
}

/// The misconfiguration branch fires before any query, so a lazy pool that
/// never connects is enough state to drive the guard.
async fn state_with_config(config: Config) -> AppState {
    let pool = PgPool::connect_lazy("postgres://localhost/never-connected").expect("lazy pool");

    let region_provider = RegionProviderChain::default_provider().or_else("eu-west-1");
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let s3_client = S3Client::from_conf(aws_sdk_s3::config::Builder::from(&aws_config).build());

    AppState {
        pool,
        s3_client,
        config,
    }
}

#[tokio::test]
async fn guard_refuses_dev_secret_in_production() {
    let config = config_with_secret(INSECURE_DEV_SECRET, true);
    // validly signed with the secret the server itself is using
    let token = issue_admin_token(&config, 1, "admin@example.com", "admin").expect("issue");
    let state = state_with_config(config).await;

    let req = TestRequest::default()
        .cookie(Cookie::new(ADMIN_COOKIE, token))
        .to_http_request();

    match authenticate_admin(&req, &state).await {
        AdminAuth::Denied { status, reason } => {
            assert_eq!(status, 500);
            assert!(reason.contains("misconfigured"));
        }
        AdminAuth::Authorized(p) => panic!("dev secret accepted in production: {p:?}"),
    }
}

#[tokio::test]
async fn guard_accepts_dev_secret_outside_production() {
    // same setup, production flag off: the guard must get past the
    // misconfiguration branch (and then fail on the token, not with a 500)
    let config = config_with_secret(INSECURE_DEV_SECRET, false);
    let state = state_with_config(config).await;

    let req = TestRequest::default()
        .cookie(Cookie::new(ADMIN_COOKIE, "garbage-token"))
        .to_http_request();

    match authenticate_admin(&req, &state).await {
        AdminAuth::Denied { status, .. } => assert_eq!(status, 401),
        AdminAuth::Authorized(p) => panic!("garbage token accepted: {p:?}"),
    }
}

#[test]
fn dev_secret_is_flagged_insecure() {
    assert!(config_with_secret(INSECURE_DEV_SECRET, true).jwt_secret_is_insecure());
    assert!(config_with_secret("", true).jwt_secret_is_insecure());
    assert!(!config_with_secret("real-secret", true).jwt_secret_is_insecure());
}
