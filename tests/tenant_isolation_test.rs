mod common;

use rental_saas::error::AppError;

/// A car created in tenant A's partition must be invisible (not found,
/// not a different row) from tenant B's partition.
#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn rows_never_cross_partitions() {
    let ctx = common::setup().await;
    let tenant_b = common::provision_test_tenant(&ctx.pool).await;

    let car_id = common::create_car(&ctx, 5_000).await;

    // Visible where it was created.
    assert!(common::find_car(&ctx, &ctx.schema, car_id).await.is_some());

    // Invisible from the other partition, through the repository and
    // through the service surface alike.
    assert!(common::find_car(&ctx, &tenant_b, car_id).await.is_none());
    let err = ctx.cars.get_car(&tenant_b, car_id).await;
    assert!(matches!(err, Err(AppError::NotFound(_))));

    // And the other partition's listing stays empty.
    let listed = ctx.cars.list_cars(&tenant_b).await.expect("list should succeed");
    assert!(listed.is_empty());
}

/// The partition is selected per transaction, not per pooled connection:
/// interleaved work for two tenants on the same small pool never leaks
/// rows between them.
#[tokio::test]
#[ignore = "requires a running Postgres; see tests/common/mod.rs"]
async fn interleaved_scopes_do_not_leak_search_path() {
    let ctx = common::setup().await;
    let tenant_b = common::provision_test_tenant(&ctx.pool).await;

    for _ in 0..5 {
        let a_car = common::create_car_in(&ctx, &ctx.schema, 1_000).await;
        let b_car = common::create_car_in(&ctx, &tenant_b, 2_000).await;

        assert!(common::find_car(&ctx, &ctx.schema, a_car).await.is_some());
        assert!(common::find_car(&ctx, &tenant_b, b_car).await.is_some());
        assert!(common::find_car(&ctx, &ctx.schema, b_car).await.is_none());
        assert!(common::find_car(&ctx, &tenant_b, a_car).await.is_none());
    }
}
