mod common;

use chrono::{Duration, Utc};

use rental_saas::error::AppError;
use rental_saas::models::CarStatus;
use rental_saas::service::CreateBooking;

/// N concurrent reservation attempts for one car: exactly one caller may
/// win, every loser must see a conflict, and exactly one booking row may
/// exist afterwards.
#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn concurrent_bookings_have_exactly_one_winner() {
    let ctx = common::setup().await;
    let car_id = common::create_car(&ctx, 10_000).await;
    let customer_id = common::create_customer(&ctx).await;

    let workers = 10;
    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let svc = ctx.bookings.clone();
        let schema = ctx.schema.clone();
        handles.push(tokio::spawn(async move {
            svc.create_booking(
                &schema,
                CreateBooking {
                    car_id,
                    customer_id,
                    start_time: Utc::now(),
                    end_time: Utc::now() + Duration::hours(24),
                },
            )
            .await
        }));
    }

    let mut success_count = 0;
    let mut conflict_count = 0;
    let mut other_count = 0;
    for handle in handles {
        match handle.await.expect("worker panicked") {
            Ok(_) => success_count += 1,
            Err(AppError::Conflict(_)) => conflict_count += 1,
            Err(_) => other_count += 1,
        }
    }

    println!("Race results: success={success_count}, conflict={conflict_count}, other={other_count}");
    assert_eq!(success_count, 1, "expected exactly 1 success");
    assert_eq!(conflict_count, workers - 1, "expected {} conflicts", workers - 1);
    assert_eq!(other_count, 0);

    // No lost update: the winner's effects are all there.
    let car = common::find_car(&ctx, &ctx.schema, car_id).await.expect("car exists");
    assert_eq!(car.status, CarStatus::Rented);
    assert_eq!(common::booking_count(&ctx, car_id).await, 1);
}

/// A booking against a missing car is a clean not-found, not a conflict.
#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn booking_a_missing_car_is_not_found() {
    let ctx = common::setup().await;
    let customer_id = common::create_customer(&ctx).await;

    let err = ctx
        .bookings
        .create_booking(
            &ctx.schema,
            CreateBooking {
                car_id: uuid::Uuid::new_v4(),
                customer_id,
                start_time: Utc::now(),
                end_time: Utc::now() + Duration::hours(24),
            },
        )
        .await;
    assert!(matches!(err, Err(AppError::NotFound(_))));
}

/// An inverted interval never opens a transaction.
#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn inverted_interval_is_rejected() {
    let ctx = common::setup().await;
    let car_id = common::create_car(&ctx, 10_000).await;
    let customer_id = common::create_customer(&ctx).await;

    let start = Utc::now();
    let err = ctx
        .bookings
        .create_booking(
            &ctx.schema,
            CreateBooking {
                car_id,
                customer_id,
                start_time: start,
                end_time: start - Duration::hours(1),
            },
        )
        .await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    let car = common::find_car(&ctx, &ctx.schema, car_id).await.expect("car exists");
    assert_eq!(car.status, CarStatus::Available);
}
