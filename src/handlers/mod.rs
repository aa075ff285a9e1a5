pub mod bookings;
pub mod cars;
pub mod health;
pub mod payments;
pub mod settings;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::db::TenantDb;
use crate::service::{BookingService, CarService, PaymentService};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: PgPool,
    pub db: TenantDb,
    pub bookings: BookingService,
    pub payments: PaymentService,
    pub cars: CarService,
}
