use futures::FutureExt;
use uuid::Uuid;

use crate::db::TenantDb;
use crate::error::AppError;
use crate::models::{Car, CarStatus};
use crate::repository::cars;
use crate::tenant::SchemaName;

#[derive(Debug, Clone)]
pub struct NewCarRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub daily_rate_cents: i64,
    pub image_url: Option<String>,
}

/// Partial administrative update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateCarRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub license_plate: Option<String>,
    pub daily_rate_cents: Option<i64>,
    pub status: Option<CarStatus>,
    pub image_url: Option<String>,
}

/// Administrative surface of the asset registry. Status changes through
/// this path go through the central transition table; in particular a
/// rented car can never be set back to available here; only the return
/// flow does that.
#[derive(Clone)]
pub struct CarService {
    db: TenantDb,
}

impl CarService {
    pub fn new(db: TenantDb) -> Self {
        Self { db }
    }

    pub async fn create_car(&self, tenant: &SchemaName, req: NewCarRequest) -> Result<Car, AppError> {
        if req.make.is_empty() || req.model.is_empty() {
            return Err(AppError::Validation("make and model are required".to_string()));
        }
        if req.daily_rate_cents < 0 {
            return Err(AppError::Validation("daily rate cannot be negative".to_string()));
        }

        let car = self
            .db
            .run_scoped(tenant, move |conn| {
                async move {
                    let new_car = cars::NewCar {
                        make: req.make,
                        model: req.model,
                        year: req.year,
                        license_plate: req.license_plate,
                        daily_rate_cents: req.daily_rate_cents,
                        image_url: req.image_url,
                    };
                    Ok(cars::insert(conn, &new_car).await?)
                }
                .boxed()
            })
            .await?;

        tracing::info!("Created car {} ({} {})", car.id, car.make, car.model);
        Ok(car)
    }

    pub async fn list_cars(&self, tenant: &SchemaName) -> Result<Vec<Car>, AppError> {
        self.db
            .run_scoped(tenant, |conn| async move { Ok(cars::list(conn).await?) }.boxed())
            .await
    }

    pub async fn get_car(&self, tenant: &SchemaName, id: Uuid) -> Result<Car, AppError> {
        self.db
            .run_scoped(tenant, move |conn| {
                async move {
                    cars::find(conn, id)
                        .await?
                        .ok_or_else(|| AppError::NotFound(format!("car {id} not found")))
                }
                .boxed()
            })
            .await
    }

    /// Updates attributes and, optionally, status. The whole update runs
    /// under the row lock so the transition check and the write see the
    /// same state even against a concurrent booking.
    pub async fn update_car(
        &self,
        tenant: &SchemaName,
        id: Uuid,
        req: UpdateCarRequest,
    ) -> Result<Car, AppError> {
        self.db
            .run_scoped(tenant, move |conn| {
                async move {
                    let mut car = cars::lock_for_update(conn, id)
                        .await?
                        .ok_or_else(|| AppError::NotFound(format!("car {id} not found")))?;

                    if let Some(next) = req.status {
                        car.status = car.status.admin_transition(next)?;
                    }
                    if let Some(make) = req.make {
                        car.make = make;
                    }
                    if let Some(model) = req.model {
                        car.model = model;
                    }
                    if let Some(year) = req.year {
                        car.year = year;
                    }
                    if let Some(plate) = req.license_plate {
                        car.license_plate = plate;
                    }
                    if let Some(rate) = req.daily_rate_cents {
                        if rate < 0 {
                            return Err(AppError::Validation(
                                "daily rate cannot be negative".to_string(),
                            ));
                        }
                        car.daily_rate_cents = rate;
                    }
                    if let Some(url) = req.image_url {
                        car.image_url = Some(url);
                    }

                    Ok(cars::update(conn, &car).await?)
                }
                .boxed()
            })
            .await
    }
}
