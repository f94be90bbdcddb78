//! Fire-and-forget student notifications
//!
//! Dispatch runs on a spawned task. A failure is logged and never reaches
//! the operation that triggered it.

use campus_common::db::models::PaymentRecord;
use campus_common::{ids, Result};
use sqlx::SqlitePool;
use tracing::{debug, error};

use crate::db::{notifications, students};

pub const KIND_PAYMENT: &str = "payment";

/// Tell the payer their payment arrived and awaits verification
pub fn payment_received(pool: SqlitePool, payment: PaymentRecord) {
    tokio::spawn(async move {
        if let Err(e) = deliver_payment_received(&pool, &payment).await {
            error!(
                payment_id = %payment.payment_id,
                error = %e,
                "Payment notification failed"
            );
        }
    });
}

async fn deliver_payment_received(pool: &SqlitePool, payment: &PaymentRecord) -> Result<()> {
    let Some(registration_number) = payment.registration_number.as_deref() else {
        debug!(payment_id = %payment.payment_id, "Payment without registration number, no notification");
        return Ok(());
    };
    let Some(student) = students::find_by_registration(pool, registration_number).await? else {
        debug!(registration_number, "No student for registration number, no notification");
        return Ok(());
    };

    let message = format!(
        "Payment of Rs. {:.2} received for {}. It will be confirmed after verification.",
        payment.final_fees,
        payment.course_name.as_deref().unwrap_or("your course")
    );
    notifications::insert(
        pool,
        &ids::generate(),
        &student.student_id,
        &message,
        KIND_PAYMENT,
        Some(&payment.payment_id),
    )
    .await?;

    debug!(payment_id = %payment.payment_id, student_id = %student.student_id, "Payment notification stored");
    Ok(())
}
