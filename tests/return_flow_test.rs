mod common;

use chrono::{Duration, Utc};

use common::TestContext;
use rental_saas::error::AppError;
use rental_saas::models::{BookingStatus, CarStatus};
use rental_saas::service::{CreateBooking, ReturnCar};
use uuid::Uuid;

/// Books a 2-day rental and creates its manual-capture authorization.
async fn booked_two_days(ctx: &TestContext, daily_rate_cents: i64) -> (Uuid, Uuid) {
    let car_id = common::create_car(ctx, daily_rate_cents).await;
    let customer_id = common::create_customer(ctx).await;

    let start = Utc::now();
    let booking_id = ctx
        .bookings
        .create_booking(
            &ctx.schema,
            CreateBooking {
                car_id,
                customer_id,
                start_time: start,
                end_time: start + Duration::hours(48),
            },
        )
        .await
        .expect("booking should succeed");

    ctx.payments
        .create_intent(&ctx.schema, booking_id, daily_rate_cents)
        .await
        .expect("intent creation should succeed");

    (booking_id, car_id)
}

#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn clean_return_bills_two_days_and_frees_the_car() {
    let ctx = common::setup().await;
    let (booking_id, car_id) = booked_two_days(&ctx, 10_000).await;

    let outcome = ctx
        .bookings
        .return_car(&ctx.schema, booking_id, ReturnCar { final_odometer: 12_500, damage_cost_cents: 0 })
        .await
        .expect("return should succeed");

    assert_eq!(outcome.billed_days, 2);
    assert_eq!(outcome.total_amount_cents, 20_000);
    assert_eq!(outcome.car_status, CarStatus::Available);

    let car = common::find_car(&ctx, &ctx.schema, car_id).await.expect("car exists");
    assert_eq!(car.status, CarStatus::Available);
    assert_eq!(car.odometer, 12_500);
    assert_eq!(ctx.processor.charge_count(), 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn damaged_return_adds_cost_and_routes_to_maintenance() {
    let ctx = common::setup().await;
    let (booking_id, car_id) = booked_two_days(&ctx, 10_000).await;

    let outcome = ctx
        .bookings
        .return_car(&ctx.schema, booking_id, ReturnCar { final_odometer: 12_500, damage_cost_cents: 500 })
        .await
        .expect("return should succeed");

    assert_eq!(outcome.total_amount_cents, 20_500);
    assert_eq!(outcome.car_status, CarStatus::Maintenance);

    let car = common::find_car(&ctx, &ctx.schema, car_id).await.expect("car exists");
    assert_eq!(car.status, CarStatus::Maintenance);
}

/// A return that dies on the external capture leaves no trace: every
/// database write rolls back and the booking stays returnable. The retry
/// then captures exactly once; the idempotency key is derived from the
/// booking id, so even a capture that had gone through on the processor
/// side could not be charged twice.
#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn failed_settlement_rolls_back_and_retry_captures_once() {
    let ctx = common::setup().await;
    let (booking_id, car_id) = booked_two_days(&ctx, 10_000).await;

    ctx.processor.fail_next_capture();
    let err = ctx
        .bookings
        .return_car(&ctx.schema, booking_id, ReturnCar { final_odometer: 12_500, damage_cost_cents: 0 })
        .await;
    assert!(matches!(err, Err(AppError::Settlement(_))));
    assert_eq!(ctx.processor.charge_count(), 0);

    // Nothing was applied: the car is still out, the booking not terminal.
    let car = common::find_car(&ctx, &ctx.schema, car_id).await.expect("car exists");
    assert_eq!(car.status, CarStatus::Rented);
    let booking = ctx.bookings.get_booking(&ctx.schema, booking_id).await.expect("booking exists");
    assert_eq!(booking.status, BookingStatus::Pending);

    // Retry settles normally.
    let outcome = ctx
        .bookings
        .return_car(&ctx.schema, booking_id, ReturnCar { final_odometer: 12_500, damage_cost_cents: 0 })
        .await
        .expect("retry should succeed");
    assert_eq!(outcome.total_amount_cents, 20_000);
    assert_eq!(ctx.processor.charge_count(), 1);

    // A second (duplicate) return is rejected without touching the
    // processor again.
    let err = ctx
        .bookings
        .return_car(&ctx.schema, booking_id, ReturnCar { final_odometer: 12_500, damage_cost_cents: 0 })
        .await;
    assert!(matches!(err, Err(AppError::Conflict(_))));
    assert_eq!(ctx.processor.charge_count(), 1);
}

/// The damage-cost precondition fires before any transaction opens: zero
/// database writes, booking and car untouched.
#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn negative_damage_cost_is_rejected_with_no_writes() {
    let ctx = common::setup().await;
    let (booking_id, car_id) = booked_two_days(&ctx, 10_000).await;

    let err = ctx
        .bookings
        .return_car(&ctx.schema, booking_id, ReturnCar { final_odometer: 12_500, damage_cost_cents: -1 })
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));
    assert_eq!(ctx.processor.charge_count(), 0);

    let booking = ctx.bookings.get_booking(&ctx.schema, booking_id).await.expect("booking exists");
    assert_eq!(booking.status, BookingStatus::Pending);
    assert!(booking.final_odometer.is_none());

    let car = common::find_car(&ctx, &ctx.schema, car_id).await.expect("car exists");
    assert_eq!(car.status, CarStatus::Rented);
    assert_eq!(car.odometer, 0);
}

/// The administrative update path cannot short-circuit a rented car back
/// to available; that edge belongs to the return flow alone.
#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn admin_path_cannot_release_a_rented_car() {
    let ctx = common::setup().await;
    let (_booking_id, car_id) = booked_two_days(&ctx, 10_000).await;

    let err = ctx
        .cars
        .update_car(
            &ctx.schema,
            car_id,
            rental_saas::service::UpdateCarRequest {
                status: Some(CarStatus::Available),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(err, Err(AppError::InvalidTransition { .. })));

    let car = common::find_car(&ctx, &ctx.schema, car_id).await.expect("car exists");
    assert_eq!(car.status, CarStatus::Rented);
}
