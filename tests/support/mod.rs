use aws_config::meta::region::RegionProviderChain;
use aws_sdk_s3::Client as S3Client;
use sqlx::{PgPool, Row};
use std::env;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};

use eventpass::config::Config;
use eventpass::{auth, AppState};

fn split_db_url(url: &str) -> Result<(String, String), String> {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base.to_string(), Some(query)),
        None => (url.to_string(), None),
    };

    let db_start = base
        .rfind('/')
        .ok_or_else(|| "invalid database url".to_string())?;
    if db_start + 1 >= base.len() {
        return Err("database name is empty".to_string());
    }

    let db_name = base[db_start + 1..].to_string();
    let mut admin_url = format!("{}postgres", &base[..db_start + 1]);
    if let Some(query) = query {
        admin_url = format!("{admin_url}?{query}");
    }

    Ok((admin_url, db_name))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Recreates the test database and runs migrations. Returns None (and the
/// test should bail out) when TEST_DATABASE_URL is not configured.
pub async fn init_test_db() -> Option<TestDb> {
    dotenvy::dotenv().ok();
    let Ok(test_url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping db-backed test");
        return None;
    };
    let (admin_url, db_name) = split_db_url(&test_url).expect("invalid TEST_DATABASE_URL format");

    let lock = TEST_DB_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().await;

    let admin_pool = PgPool::connect(&admin_url).await.expect("connect admin db");

    let _ = sqlx::query("SELECT pg_advisory_lock(733100)")
        .execute(&admin_pool)
        .await;

    let quoted_name = quote_identifier(&db_name);
    let drop_sql = format!("DROP DATABASE IF EXISTS {quoted_name} WITH (FORCE)");
    let create_sql = format!("CREATE DATABASE {quoted_name}");

    let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
    if let Err(e) = sqlx::query(&create_sql).execute(&admin_pool).await {
        eprintln!("create test db error: {e}");
        let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
        sqlx::query(&create_sql)
            .execute(&admin_pool)
            .await
            .expect("create test db retry");
    }

    let _ = sqlx::query("SELECT pg_advisory_unlock(733100)")
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;

    let pool = PgPool::connect(&test_url).await.expect("connect test db");
    sqlx::migrate!().run(&pool).await.expect("migrations");

    Some(TestDb {
        pool,
        _guard: guard,
    })
}

pub fn test_config() -> Config {
    Config {
        jwt_secret: "test-secret".to_string(),
        production: false,
        s3_bucket: "test-bucket".to_string(),
        s3_public_base_url: "http://localhost/files".to_string(),
        mock_storage: true,
        smtp: None,
        sms: None,
    }
}

pub async fn build_state(pool: PgPool) -> AppState {
    let region_provider = RegionProviderChain::default_provider().or_else("eu-west-1");
    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    let s3_client = S3Client::from_conf(aws_sdk_s3::config::Builder::from(&aws_config).build());

    AppState {
        pool,
        s3_client,
        config: test_config(),
    }
}

/// Inserts an active admin and returns (id, session cookie value).
pub async fn seed_admin(pool: &PgPool, email: &str, role: &str) -> (i32, String) {
    let admin_id: i32 = sqlx::query(
        r#"INSERT INTO admins (email, password_hash, name, role, is_active)
           VALUES ($1, 'unused-hash', 'Test Admin', $2, TRUE)
           RETURNING id"#,
    )
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("insert admin")
    .get("id");

    let token = auth::issue_admin_token(&test_config(), admin_id, email, role).expect("issue token");
    (admin_id, token)
}

pub async fn seed_order(pool: &PgPool, status: &str, total_price: &str) -> i32 {
    sqlx::query(
        r#"INSERT INTO orders (status, payment_status, source, buyer_name, buyer_email, buyer_phone, total_price)
           VALUES ($1, 'PENDING', 'cod', 'Test Buyer', 'buyer@example.com', '20123456', $2::numeric)
           RETURNING id"#,
    )
    .bind(status)
    .bind(total_price)
    .fetch_one(pool)
    .await
    .expect("insert order")
    .get("id")
}

pub async fn seed_order_pass(pool: &PgPool, order_id: i32, pass_type: &str, quantity: i32, unit_price: &str) -> i32 {
    sqlx::query(
        r#"INSERT INTO order_passes (order_id, pass_type, unit_price, quantity)
           VALUES ($1, $2, $3::numeric, $4)
           RETURNING id"#,
    )
    .bind(order_id)
    .bind(pass_type)
    .bind(unit_price)
    .bind(quantity)
    .fetch_one(pool)
    .await
    .expect("insert order pass")
    .get("id")
}
