pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod fulfillment;
pub mod models;
pub mod notify;
pub mod qr;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub s3_client: S3Client,
    pub config: Config,
}
