use actix_web::test::TestRequest;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use sqlx::Row;

use eventpass::api::admin_auth::{login as admin_login, logout as admin_logout};
use eventpass::api::ambassadors::{apply, login};
use eventpass::api::subscribe::subscribe_phone;
use eventpass::auth::ADMIN_COOKIE;

mod support;

#[actix_web::test]
async fn admin_login_sets_session_cookie_and_logout_clears_it() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let hash = bcrypt::hash("hunter2", 4).expect("hash");
    sqlx::query(
        r#"INSERT INTO admins (email, password_hash, name, role, is_active)
           VALUES ('root@eventpass.tn', $1, 'Root', 'super_admin', TRUE)"#,
    )
    .bind(&hash)
    .execute(pool)
    .await
    .expect("seed admin");

    let state = web::Data::new(support::build_state(pool.clone()).await);
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .service(admin_login)
            .service(admin_logout),
    )
    .await;

    let req = TestRequest::post()
        .uri("/api/admin/login")
        .set_json(json!({ "email": "root@eventpass.tn", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    let req = TestRequest::post()
        .uri("/api/admin/login")
        .set_json(json!({ "email": "root@eventpass.tn", "password": "hunter2" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == ADMIN_COOKIE)
        .expect("session cookie");
    assert!(!session.value().is_empty());
    assert_eq!(session.http_only(), Some(true));

    let req = TestRequest::post().uri("/api/admin/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == ADMIN_COOKIE)
        .expect("cleared cookie");
    assert_eq!(cleared.value(), "");
}

#[actix_web::test]
async fn subscribe_normalizes_phone_and_deduplicates() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let state = web::Data::new(support::build_state(pool.clone()).await);
    let app = test::init_service(App::new().app_data(state.clone()).service(subscribe_phone)).await;

    for raw in ["20123456", "+216 20 123 456"] {
        let req = TestRequest::post()
            .uri("/api/subscribe")
            .set_json(json!({ "phone": raw }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["phone"], json!("+21620123456"));
    }

    let count: i64 = sqlx::query("SELECT COUNT(*) as n FROM phone_subscribers")
        .fetch_one(pool)
        .await
        .expect("count subscribers")
        .get("n");
    assert_eq!(count, 1);

    let req = TestRequest::post()
        .uri("/api/subscribe")
        .set_json(json!({ "phone": "70123456" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn ambassador_application_validates_and_rejects_duplicates() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let state = web::Data::new(support::build_state(pool.clone()).await);
    let app = test::init_service(App::new().app_data(state.clone()).service(apply)).await;

    let req = TestRequest::post()
        .uri("/api/ambassador/apply")
        .set_json(json!({ "name": "Sana", "email": "not-an-email", "phone": "20123456" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);

    let req = TestRequest::post()
        .uri("/api/ambassador/apply")
        .set_json(json!({ "name": "Sana", "email": "sana@example.com", "phone": "20123456" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], json!("PENDING"));

    // same email again: a unique violation is the caller's fault, not a 500
    let req = TestRequest::post()
        .uri("/api/ambassador/apply")
        .set_json(json!({ "name": "Sana", "email": "sana@example.com", "phone": "20123456" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("application already exists"));
}

#[actix_web::test]
async fn ambassador_login_requires_approval() {
    let Some(test_db) = support::init_test_db().await else {
        return;
    };
    let pool = &test_db.pool;

    let hash = bcrypt::hash("ambpass", 4).expect("hash");
    sqlx::query(
        r#"INSERT INTO ambassadors (name, email, phone, promo_code, status, password_hash)
           VALUES ('Pending P', 'pending@example.com', '+21620123456', 'AMB-AAAA1111', 'PENDING', $1),
                  ('Approved A', 'approved@example.com', '+21620123457', 'AMB-BBBB2222', 'APPROVED', $1)"#,
    )
    .bind(&hash)
    .execute(pool)
    .await
    .expect("seed ambassadors");

    let state = web::Data::new(support::build_state(pool.clone()).await);
    let app = test::init_service(App::new().app_data(state.clone()).service(login)).await;

    let req = TestRequest::post()
        .uri("/api/ambassador/login")
        .set_json(json!({ "email": "pending@example.com", "password": "ambpass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 403);

    let req = TestRequest::post()
        .uri("/api/ambassador/login")
        .set_json(json!({ "email": "approved@example.com", "password": "ambpass" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["promoCode"], json!("AMB-BBBB2222"));

    let req = TestRequest::post()
        .uri("/api/ambassador/login")
        .set_json(json!({ "email": "approved@example.com", "password": "wrong" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);
}
