// src/config.rs

use std::env;

/// Placeholder secret shipped in .env.example. The admin guard refuses to
/// authenticate anyone in production while this value is still in use.
pub const INSECURE_DEV_SECRET: &str = "dev-secret-change-me";

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub from_name: String,
}

#[derive(Clone)]
pub struct SmsConfig {
    pub base_url: String,
    pub api_key: String,
    pub sender: String,
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub production: bool,
    pub s3_bucket: String,
    pub s3_public_base_url: String,
    /// When set (MOCK_S3=true) ticket images are not uploaded; the public URL
    /// is still recorded so DB-only test runs exercise the full workflow.
    pub mock_storage: bool,
    pub smtp: Option<SmtpConfig>,
    pub sms: Option<SmsConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        let s3_bucket = env::var("S3_BUCKET").unwrap_or_else(|_| "eventpass".to_string());
        let s3_public_base_url = env::var("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", s3_bucket));

        let smtp = match (
            env::var("SMTP_HOST"),
            env::var("SMTP_USERNAME"),
            env::var("SMTP_PASSWORD"),
        ) {
            (Ok(host), Ok(username), Ok(password)) => Some(SmtpConfig {
                from_address: env::var("SMTP_FROM").unwrap_or_else(|_| username.clone()),
                from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "EventPass".to_string()),
                host,
                username,
                password,
            }),
            _ => None,
        };

        let sms = match (env::var("SMS_API_URL"), env::var("SMS_API_KEY")) {
            (Ok(base_url), Ok(api_key)) => Some(SmsConfig {
                sender: env::var("SMS_SENDER").unwrap_or_else(|_| "EventPass".to_string()),
                base_url,
                api_key,
            }),
            _ => None,
        };

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| INSECURE_DEV_SECRET.to_string()),
            production: env::var("APP_ENV").unwrap_or_default() == "production",
            s3_bucket,
            s3_public_base_url,
            mock_storage: env::var("MOCK_S3").unwrap_or_default() == "true",
            smtp,
            sms,
        }
    }

    pub fn jwt_secret_is_insecure(&self) -> bool {
        self.jwt_secret == INSECURE_DEV_SECRET || self.jwt_secret.is_empty()
    }
}
