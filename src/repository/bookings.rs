use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus};

/// Everything the return flow needs in one locked read: the booking row
/// joined with its payment and car. `FOR UPDATE OF b` serializes
/// concurrent returns of the same booking.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettlementRow {
    pub id: Uuid,
    pub car_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub processor_ref: String,
    pub daily_rate_cents: i64,
}

pub async fn insert(
    conn: &mut PgConnection,
    car_id: Uuid,
    customer_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO bookings (car_id, customer_id, start_time, end_time, status)
         VALUES ($1, $2, $3, $4, 'pending')
         RETURNING id",
    )
    .bind(car_id)
    .bind(customer_id)
    .bind(start_time)
    .bind(end_time)
    .fetch_one(conn)
    .await
}

pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(
        "SELECT id, car_id, customer_id, start_time, end_time, status,
                final_odometer, damage_cost_cents, total_amount_cents, created_at, updated_at
         FROM bookings WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn lock_settlement(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<SettlementRow>, sqlx::Error> {
    sqlx::query_as::<_, SettlementRow>(
        "SELECT b.id, b.car_id, b.start_time, b.end_time, b.status,
                p.processor_ref, c.daily_rate_cents
         FROM bookings b
         JOIN payments p ON p.booking_id = b.id
         JOIN cars c ON c.id = b.car_id
         WHERE b.id = $1
         FOR UPDATE OF b",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn complete(
    conn: &mut PgConnection,
    id: Uuid,
    final_odometer: i64,
    damage_cost_cents: i64,
    total_amount_cents: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE bookings
         SET status = 'completed', final_odometer = $1, damage_cost_cents = $2,
             total_amount_cents = $3, updated_at = now()
         WHERE id = $4",
    )
    .bind(final_odometer)
    .bind(damage_cost_cents)
    .bind(total_amount_cents)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}
