mod common;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use rust_decimal_macros::dec;

use lectern_api::services::gateway::{
    webhook_digest, GatewayError, GatewayPayment, GatewayPaymentStatus, PaymentGateway,
};

/// Programmable stand-in for the external gateway.
#[derive(Default)]
struct TestGateway {
    payments: Mutex<HashMap<String, GatewayPayment>>,
}

impl TestGateway {
    fn set(&self, payment: GatewayPayment) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.merchant_uid.clone(), payment);
    }
}

#[async_trait::async_trait]
impl PaymentGateway for TestGateway {
    async fn fetch_payment(&self, merchant_uid: &str) -> Result<GatewayPayment, GatewayError> {
        self.payments
            .lock()
            .unwrap()
            .get(merchant_uid)
            .cloned()
            .ok_or_else(|| GatewayError::PaymentNotFound(merchant_uid.to_string()))
    }
}

const WEBHOOK_SECRET: &str = "hook-secret";

static GATEWAY: OnceLock<Arc<TestGateway>> = OnceLock::new();

/// Install the test gateway and webhook secret before the server first
/// touches the config singleton.
fn test_gateway() -> Arc<TestGateway> {
    GATEWAY
        .get_or_init(|| {
            std::env::set_var("PAYMENT_WEBHOOK_SECRET", WEBHOOK_SECRET);
            let gw = Arc::new(TestGateway::default());
            let dyn_gw: Arc<dyn PaymentGateway> = gw.clone();
            let _ = lectern_api::services::gateway::install(dyn_gw);
            gw
        })
        .clone()
}

async fn open_order(
    client: &reqwest::Client,
    base_url: &str,
    teacher_token: &str,
    student_token: &str,
) -> Result<(i64, String)> {
    let lecture: serde_json::Value = client
        .post(format!("{}/api/lectures", base_url))
        .bearer_auth(teacher_token)
        .json(&serde_json::json!({ "title": "Paid course", "price": "30.00" }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let lecture_id = lecture["id"].as_i64().context("lecture id")?;

    let order: serde_json::Value = client
        .post(format!("{}/api/payments/orders", base_url))
        .bearer_auth(student_token)
        .json(&serde_json::json!({ "lecture_id": lecture_id }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(order["status"], serde_json::json!("pending"));
    let merchant_uid = order["merchant_uid"]
        .as_str()
        .context("merchant_uid")?
        .to_string();

    Ok((lecture_id, merchant_uid))
}

async fn post_webhook(
    client: &reqwest::Client,
    base_url: &str,
    merchant_uid: &str,
) -> Result<reqwest::Response> {
    let body = serde_json::json!({ "merchant_uid": merchant_uid }).to_string();
    let signature = webhook_digest(body.as_bytes(), WEBHOOK_SECRET);
    Ok(client
        .post(format!("{}/payments/webhook", base_url))
        .header("content-type", "application/json")
        .header("x-webhook-signature", signature)
        .body(body)
        .send()
        .await?)
}

#[tokio::test]
async fn paid_callback_settles_the_order_and_records_the_purchase() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let gateway = test_gateway();
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let pool = common::test_pool().await?;

    let (_tid, teacher) = common::register_and_login(&client, &server.base_url, "teacher").await?;
    let (student_id, student) =
        common::register_and_login(&client, &server.base_url, "student").await?;
    let (lecture_id, merchant_uid) =
        open_order(&client, &server.base_url, &teacher, &student).await?;

    gateway.set(GatewayPayment {
        merchant_uid: merchant_uid.clone(),
        status: GatewayPaymentStatus::Paid,
        amount: dec!(30.00),
        fail_reason: None,
    });

    let resp = post_webhook(&client, &server.base_url, &merchant_uid).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body, serde_json::json!({ "ok": true }));

    let order: serde_json::Value = client
        .get(format!("{}/api/payments/orders/{}", server.base_url, merchant_uid))
        .bearer_auth(&student)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(order["status"], serde_json::json!("success"));

    let (purchases,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM purchases WHERE user_id = $1 AND lecture_id = $2",
    )
    .bind(student_id)
    .bind(lecture_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(purchases, 1);

    // A duplicate delivery is a no-op success.
    let resp = post_webhook(&client, &server.base_url, &merchant_uid).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let (purchases,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM purchases WHERE user_id = $1 AND lecture_id = $2",
    )
    .bind(student_id)
    .bind(lecture_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(purchases, 1);

    Ok(())
}

#[tokio::test]
async fn failed_and_mismatched_payments_do_not_create_purchases() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let gateway = test_gateway();
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let pool = common::test_pool().await?;

    let (_tid, teacher) = common::register_and_login(&client, &server.base_url, "teacher").await?;
    let (student_id, student) =
        common::register_and_login(&client, &server.base_url, "student").await?;

    // Gateway reports failure.
    let (lecture_id, failed_uid) =
        open_order(&client, &server.base_url, &teacher, &student).await?;
    gateway.set(GatewayPayment {
        merchant_uid: failed_uid.clone(),
        status: GatewayPaymentStatus::Failed,
        amount: dec!(30.00),
        fail_reason: Some("card declined".to_string()),
    });
    let resp = post_webhook(&client, &server.base_url, &failed_uid).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let order: serde_json::Value = client
        .get(format!("{}/api/payments/orders/{}", server.base_url, failed_uid))
        .bearer_auth(&student)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(order["status"], serde_json::json!("failed"));
    assert_eq!(order["fail_reason"], serde_json::json!("card declined"));

    // Gateway claims paid but for the wrong amount.
    let (_lid2, short_uid) = open_order(&client, &server.base_url, &teacher, &student).await?;
    gateway.set(GatewayPayment {
        merchant_uid: short_uid.clone(),
        status: GatewayPaymentStatus::Paid,
        amount: dec!(1.00),
        fail_reason: None,
    });
    let resp = post_webhook(&client, &server.base_url, &short_uid).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let order: serde_json::Value = client
        .get(format!("{}/api/payments/orders/{}", server.base_url, short_uid))
        .bearer_auth(&student)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(order["status"], serde_json::json!("failed"));
    assert_eq!(order["fail_reason"], serde_json::json!("amount mismatch"));

    let (purchases,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM purchases WHERE user_id = $1 AND lecture_id = $2")
            .bind(student_id)
            .bind(lecture_id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(purchases, 0);

    Ok(())
}

#[tokio::test]
async fn webhook_rejects_bad_signatures_and_unknown_orders() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let _gateway = test_gateway();
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // No signature header at all.
    let resp = client
        .post(format!("{}/payments/webhook", server.base_url))
        .header("content-type", "application/json")
        .body(r#"{"merchant_uid":"ord_whatever"}"#)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Wrong signature.
    let resp = client
        .post(format!("{}/payments/webhook", server.base_url))
        .header("content-type", "application/json")
        .header("x-webhook-signature", "deadbeef")
        .body(r#"{"merchant_uid":"ord_whatever"}"#)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Valid signature but no such order.
    let resp = post_webhook(&client, &server.base_url, "ord_does_not_exist").await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn orders_are_private_to_their_buyer() -> Result<()> {
    if !common::db_available() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let _gateway = test_gateway();
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_tid, teacher) = common::register_and_login(&client, &server.base_url, "teacher").await?;
    let (_sid, student) = common::register_and_login(&client, &server.base_url, "student").await?;
    let (_other_id, other) = common::register_and_login(&client, &server.base_url, "other").await?;
    let (_lecture_id, merchant_uid) =
        open_order(&client, &server.base_url, &teacher, &student).await?;

    let resp = client
        .get(format!("{}/api/payments/orders/{}", server.base_url, merchant_uid))
        .bearer_auth(&other)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}
