use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::error::AppError;
use crate::models::CarStatus;
use crate::service::{NewCarRequest, UpdateCarRequest};
use crate::tenant::TenantSchema;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cars).post(create_car))
        .route("/:id", get(get_car).put(update_car))
}

#[derive(Debug, Deserialize)]
pub struct CreateCarRequest {
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub license_plate: String,
    #[serde(default)]
    pub daily_rate_cents: i64,
    pub image_url: Option<String>,
}

async fn create_car(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
    Json(req): Json<CreateCarRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let car = state
        .cars
        .create_car(
            &tenant,
            NewCarRequest {
                make: req.make,
                model: req.model,
                year: req.year,
                license_plate: req.license_plate,
                daily_rate_cents: req.daily_rate_cents,
                image_url: req.image_url,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "status": "success", "data": car }))))
}

async fn list_cars(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
) -> Result<Json<serde_json::Value>, AppError> {
    let cars = state.cars.list_cars(&tenant).await?;
    Ok(Json(json!({ "status": "success", "data": cars })))
}

async fn get_car(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let car = state.cars.get_car(&tenant, id).await?;
    Ok(Json(json!({ "status": "success", "data": car })))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCarBody {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub license_plate: Option<String>,
    pub daily_rate_cents: Option<i64>,
    pub status: Option<CarStatus>,
    pub image_url: Option<String>,
}

async fn update_car(
    State(state): State<AppState>,
    TenantSchema(tenant): TenantSchema,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCarBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let car = state
        .cars
        .update_car(
            &tenant,
            id,
            UpdateCarRequest {
                make: req.make,
                model: req.model,
                year: req.year,
                license_plate: req.license_plate,
                daily_rate_cents: req.daily_rate_cents,
                status: req.status,
                image_url: req.image_url,
            },
        )
        .await?;

    Ok(Json(json!({ "status": "success", "data": car })))
}
