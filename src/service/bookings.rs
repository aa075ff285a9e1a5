use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde_json::json;
use uuid::Uuid;

use crate::db::TenantDb;
use crate::error::AppError;
use crate::models::CarStatus;
use crate::payments::PaymentProcessor;
use crate::repository::{bookings, cars, payments};
use crate::tenant::SchemaName;
use crate::webhooks::WebhookNotifier;

#[derive(Debug, Clone, Copy)]
pub struct CreateBooking {
    pub car_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnCar {
    pub final_odometer: i64,
    pub damage_cost_cents: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct ReturnOutcome {
    pub booking_id: Uuid,
    pub billed_days: i64,
    pub total_amount_cents: i64,
    pub car_status: CarStatus,
}

/// Whole 24h units of the rental interval, truncated, never below one
/// billable day.
pub(crate) fn billed_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days().max(1)
}

/// Owns the reservation lifecycle. The booking status and (through the
/// return flow) the car status are written nowhere else.
#[derive(Clone)]
pub struct BookingService {
    db: TenantDb,
    processor: Arc<dyn PaymentProcessor>,
    notifier: WebhookNotifier,
}

impl BookingService {
    pub fn new(db: TenantDb, processor: Arc<dyn PaymentProcessor>, notifier: WebhookNotifier) -> Self {
        Self { db, processor, notifier }
    }

    /// Reserves a car. Inside one transaction: the car row is locked, its
    /// availability checked under the lock, the booking inserted as
    /// `pending`, and the car flipped to `rented`. Of N concurrent callers
    /// for the same car, the first to acquire the lock wins; every other
    /// observes a non-available status and gets a conflict.
    pub async fn create_booking(
        &self,
        tenant: &SchemaName,
        req: CreateBooking,
    ) -> Result<Uuid, AppError> {
        if req.end_time <= req.start_time {
            return Err(AppError::Validation("end_time must be after start_time".to_string()));
        }

        let booking_id = self
            .db
            .run_scoped(tenant, move |conn| {
                async move {
                    let car = cars::lock_for_update(conn, req.car_id)
                        .await?
                        .ok_or_else(|| AppError::NotFound(format!("car {} not found", req.car_id)))?;

                    if car.status != CarStatus::Available {
                        return Err(AppError::Conflict(format!(
                            "car is not available (status: {})",
                            car.status
                        )));
                    }

                    let booking_id = bookings::insert(
                        conn,
                        req.car_id,
                        req.customer_id,
                        req.start_time,
                        req.end_time,
                    )
                    .await?;

                    cars::set_status(conn, req.car_id, CarStatus::Rented).await?;
                    Ok(booking_id)
                }
                .boxed()
            })
            .await?;

        tracing::info!("Created booking {} for car {}", booking_id, req.car_id);
        self.notifier.notify(
            tenant,
            "booking.created",
            json!({
                "booking_id": booking_id,
                "car_id": req.car_id,
                "customer_id": req.customer_id,
                "start_time": req.start_time,
                "end_time": req.end_time,
            }),
        );
        Ok(booking_id)
    }

    /// Settles a booking. The damage-cost precondition is checked before
    /// any transaction opens; the rest runs in one unit under the booking
    /// row lock: terminal-state guard, pricing, external capture (keyed by
    /// a deterministic idempotency token so a retried return can never
    /// double-capture), then booking/car/payment writes. The commit only
    /// happens after the capture succeeded; on capture failure every
    /// write is rolled back and the booking stays returnable.
    pub async fn return_car(
        &self,
        tenant: &SchemaName,
        booking_id: Uuid,
        req: ReturnCar,
    ) -> Result<ReturnOutcome, AppError> {
        if req.damage_cost_cents < 0 {
            return Err(AppError::Validation("damage cost cannot be negative".to_string()));
        }

        let processor = Arc::clone(&self.processor);
        let outcome = self
            .db
            .run_scoped(tenant, move |conn| {
                async move {
                    let settlement = bookings::lock_settlement(conn, booking_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::NotFound(format!(
                                "booking {booking_id} not found or payment missing"
                            ))
                        })?;

                    if settlement.status.is_terminal() {
                        return Err(AppError::Conflict(format!(
                            "booking is already {}",
                            settlement.status
                        )));
                    }

                    let days = billed_days(settlement.start_time, settlement.end_time);
                    let rental_cost = days * settlement.daily_rate_cents;
                    let total = rental_cost + req.damage_cost_cents;

                    // Capture runs under the row lock, before commit: a
                    // completed booking can never be recorded without
                    // captured funds.
                    let idempotency_key = format!("capture_{booking_id}");
                    processor
                        .capture(&settlement.processor_ref, total, &idempotency_key)
                        .await
                        .map_err(|e| AppError::Settlement(e.to_string()))?;

                    bookings::complete(conn, booking_id, req.final_odometer, req.damage_cost_cents, total)
                        .await?;

                    let car_status = CarStatus::after_return(req.damage_cost_cents);
                    cars::set_status_and_odometer(conn, settlement.car_id, car_status, req.final_odometer)
                        .await?;

                    payments::mark_captured(conn, &settlement.processor_ref, total).await?;

                    Ok(ReturnOutcome {
                        booking_id,
                        billed_days: days,
                        total_amount_cents: total,
                        car_status,
                    })
                }
                .boxed()
            })
            .await?;

        tracing::info!(
            "Completed booking {} ({} days, {} cents)",
            booking_id,
            outcome.billed_days,
            outcome.total_amount_cents
        );
        self.notifier.notify(
            tenant,
            "booking.completed",
            json!({
                "booking_id": booking_id,
                "total_amount_cents": outcome.total_amount_cents,
                "car_status": outcome.car_status,
            }),
        );
        Ok(outcome)
    }

    /// Plain read of current booking state.
    pub async fn get_booking(
        &self,
        tenant: &SchemaName,
        booking_id: Uuid,
    ) -> Result<crate::models::Booking, AppError> {
        self.db
            .run_scoped(tenant, move |conn| {
                async move {
                    bookings::find(conn, booking_id)
                        .await?
                        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))
                }
                .boxed()
            })
            .await
    }
}
