//! Course payment rows
//!
//! `payment_id` is the primary key, so a replayed webhook, a verify call
//! racing the webhook and a manual sync all collapse onto one row.

use campus_common::db::models::PaymentRecord;
use campus_common::Result;
use sqlx::SqlitePool;

/// Values for a new payment row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPayment {
    pub payment_id: String,
    pub order_id: Option<String>,
    pub enrollment_id: Option<String>,
    pub registration_number: Option<String>,
    pub student_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub course_name: Option<String>,
    pub course_duration: i64,
    pub original_fees: f64,
    pub discount_percentage: f64,
    pub final_fees: f64,
    pub payment_type: String,
    pub emi_duration: Option<i64>,
    pub current_emi: Option<i64>,
    pub bank_rrn: Option<String>,
    pub status: bool,
}

/// Insert unless the payment id is already recorded; true when inserted
pub async fn insert_if_absent(pool: &SqlitePool, payment: &NewPayment) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO student_course_payments (
            payment_id, order_id, enrollment_id, registration_number, student_name,
            email, contact, course_name, course_duration, original_fees,
            discount_percentage, final_fees, payment_type, emi_duration, current_emi,
            bank_rrn, status
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(payment_id) DO NOTHING
        "#,
    )
    .bind(&payment.payment_id)
    .bind(&payment.order_id)
    .bind(&payment.enrollment_id)
    .bind(&payment.registration_number)
    .bind(&payment.student_name)
    .bind(&payment.email)
    .bind(&payment.contact)
    .bind(&payment.course_name)
    .bind(payment.course_duration)
    .bind(payment.original_fees)
    .bind(payment.discount_percentage)
    .bind(payment.final_fees)
    .bind(&payment.payment_type)
    .bind(payment.emi_duration)
    .bind(payment.current_emi)
    .bind(&payment.bank_rrn)
    .bind(payment.status)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find(pool: &SqlitePool, payment_id: &str) -> Result<Option<PaymentRecord>> {
    let row = sqlx::query_as::<_, PaymentRecord>(
        "SELECT * FROM student_course_payments WHERE payment_id = ?",
    )
    .bind(payment_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// A student's transactions, newest first
pub async fn list_for_registration(
    pool: &SqlitePool,
    registration_number: &str,
) -> Result<Vec<PaymentRecord>> {
    let rows = sqlx::query_as::<_, PaymentRecord>(
        r#"
        SELECT * FROM student_course_payments
        WHERE registration_number = ?
        ORDER BY created_at DESC, payment_id DESC
        "#,
    )
    .bind(registration_number)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
