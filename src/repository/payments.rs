use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::Payment;

pub async fn insert(
    conn: &mut PgConnection,
    booking_id: Uuid,
    processor_ref: &str,
    amount_cents: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO payments (booking_id, processor_ref, amount_cents, status)
         VALUES ($1, $2, $3, 'pending_auth')",
    )
    .bind(booking_id)
    .bind(processor_ref)
    .bind(amount_cents)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_by_booking(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "SELECT id, booking_id, processor_ref, amount_cents, status, created_at, updated_at
         FROM payments WHERE booking_id = $1",
    )
    .bind(booking_id)
    .fetch_optional(conn)
    .await
}

/// Returns the number of rows flipped; zero means the processor reference
/// is unknown in this partition (a replayed or misrouted event).
pub async fn mark_authorized(conn: &mut PgConnection, processor_ref: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE payments SET status = 'authorized', updated_at = now() WHERE processor_ref = $1",
    )
    .bind(processor_ref)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn mark_captured(
    conn: &mut PgConnection,
    processor_ref: &str,
    amount_cents: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE payments SET status = 'captured', amount_cents = $1, updated_at = now()
         WHERE processor_ref = $2",
    )
    .bind(amount_cents)
    .bind(processor_ref)
    .execute(conn)
    .await?;
    Ok(())
}
