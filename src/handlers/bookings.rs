use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::post,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::service::{CreateBooking, ReturnCar};
use crate::tenant::TenantSchema;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/:id/return", post(return_car))
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub car_id: Uuid,
    pub customer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

async fn create_booking(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let booking_id = state
        .bookings
        .create_booking(
            &tenant,
            CreateBooking {
                car_id: req.car_id,
                customer_id: req.customer_id,
                start_time: req.start_time,
                end_time: req.end_time,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "booking_id": booking_id
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ReturnCarRequest {
    pub final_odometer: i64,
    pub damage_cost_cents: i64,
}

async fn return_car(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
    Path(id): Path<Uuid>,
    Json(req): Json<ReturnCarRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome = state
        .bookings
        .return_car(
            &tenant,
            id,
            ReturnCar {
                final_odometer: req.final_odometer,
                damage_cost_cents: req.damage_cost_cents,
            },
        )
        .await?;

    Ok(Json(json!({
        "status": "success",
        "booking_id": outcome.booking_id,
        "billed_days": outcome.billed_days,
        "total_amount_cents": outcome.total_amount_cents,
        "car_status": outcome.car_status
    })))
}
