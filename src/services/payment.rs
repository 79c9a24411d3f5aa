use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{PaymentOrder, PaymentStatus};
use crate::services::gateway::{GatewayError, GatewayPaymentStatus, PaymentGateway};

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment order not found")]
    OrderNotFound,

    #[error("unknown lecture")]
    UnknownLecture,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open a pending order for one lecture. The amount is snapshotted from the
/// lecture's current price so later price edits don't move the goalposts.
pub async fn create_order(
    pool: &PgPool,
    user_id: i64,
    lecture_id: i64,
) -> Result<PaymentOrder, PaymentError> {
    let price: Option<(rust_decimal::Decimal,)> =
        sqlx::query_as("SELECT price FROM lectures WHERE id = $1")
            .bind(lecture_id)
            .fetch_optional(pool)
            .await?;
    let (amount,) = price.ok_or(PaymentError::UnknownLecture)?;

    let merchant_uid = format!("ord_{}", Uuid::new_v4().simple());

    let order = sqlx::query_as::<_, PaymentOrder>(
        "INSERT INTO payment_orders (merchant_uid, user_id, lecture_id, amount) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&merchant_uid)
    .bind(user_id)
    .bind(lecture_id)
    .bind(amount)
    .fetch_one(pool)
    .await?;

    info!(merchant_uid = %order.merchant_uid, user_id, lecture_id, "payment order opened");
    Ok(order)
}

pub async fn find_order(
    pool: &PgPool,
    merchant_uid: &str,
) -> Result<Option<PaymentOrder>, sqlx::Error> {
    sqlx::query_as::<_, PaymentOrder>("SELECT * FROM payment_orders WHERE merchant_uid = $1")
        .bind(merchant_uid)
        .fetch_optional(pool)
        .await
}

#[derive(Debug, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Order reached success/failed during this call.
    Settled(PaymentStatus),
    /// Order was already in a terminal state; nothing changed.
    AlreadySettled(PaymentStatus),
    /// Gateway still reports the payment as in flight.
    StillPending,
}

/// Settle an order from a gateway callback.
///
/// The callback itself is untrusted beyond its digest: the payment state is
/// re-read from the gateway, and the announced amount must match the order's
/// snapshot. Success transitions the order and records the purchase in the
/// same transaction; the status update is guarded on `pending` so duplicate
/// deliveries settle exactly once.
pub async fn settle_order(
    pool: &PgPool,
    gateway: &dyn PaymentGateway,
    merchant_uid: &str,
) -> Result<SettleOutcome, PaymentError> {
    let order = find_order(pool, merchant_uid)
        .await?
        .ok_or(PaymentError::OrderNotFound)?;

    if let Some(status) = order.status() {
        if status.is_terminal() {
            return Ok(SettleOutcome::AlreadySettled(status));
        }
    }

    let payment = gateway.fetch_payment(merchant_uid).await?;

    let (next, fail_reason) = match payment.status {
        GatewayPaymentStatus::Pending => return Ok(SettleOutcome::StillPending),
        GatewayPaymentStatus::Failed => (
            PaymentStatus::Failed,
            payment.fail_reason.unwrap_or_else(|| "payment failed".to_string()),
        ),
        GatewayPaymentStatus::Paid if payment.amount != order.amount => {
            warn!(
                merchant_uid,
                expected = %order.amount,
                announced = %payment.amount,
                "gateway amount mismatch"
            );
            (PaymentStatus::Failed, "amount mismatch".to_string())
        }
        GatewayPaymentStatus::Paid => (PaymentStatus::Success, String::new()),
    };

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE payment_orders SET status = $2, fail_reason = NULLIF($3, ''), updated_at = now() \
         WHERE merchant_uid = $1 AND status = 'pending'",
    )
    .bind(merchant_uid)
    .bind(next.as_str())
    .bind(&fail_reason)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Another delivery settled the order first.
        tx.rollback().await?;
        let current = find_order(pool, merchant_uid)
            .await?
            .and_then(|o| o.status())
            .unwrap_or(PaymentStatus::Pending);
        return Ok(SettleOutcome::AlreadySettled(current));
    }

    if next == PaymentStatus::Success {
        // Same idempotency as the purchase endpoint, expressed as ON CONFLICT
        // because a swallowed constraint error would abort the transaction.
        sqlx::query(
            "INSERT INTO purchases (user_id, lecture_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, lecture_id) DO NOTHING",
        )
        .bind(order.user_id)
        .bind(order.lecture_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(merchant_uid, status = next.as_str(), "payment order settled");
    Ok(SettleOutcome::Settled(next))
}
