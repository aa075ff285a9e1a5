use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::{Car, CarStatus};

pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub daily_rate_cents: i64,
    pub image_url: Option<String>,
}

const CAR_COLUMNS: &str =
    "id, make, model, year, license_plate, status, daily_rate_cents, odometer, image_url, created_at, updated_at";

pub async fn insert(conn: &mut PgConnection, car: &NewCar) -> Result<Car, sqlx::Error> {
    sqlx::query_as::<_, Car>(&format!(
        "INSERT INTO cars (make, model, year, license_plate, daily_rate_cents, image_url)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {CAR_COLUMNS}"
    ))
    .bind(&car.make)
    .bind(&car.model)
    .bind(car.year)
    .bind(&car.license_plate)
    .bind(car.daily_rate_cents)
    .bind(&car.image_url)
    .fetch_one(conn)
    .await
}

pub async fn list(conn: &mut PgConnection) -> Result<Vec<Car>, sqlx::Error> {
    sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars ORDER BY created_at"))
        .fetch_all(conn)
        .await
}

pub async fn find(conn: &mut PgConnection, id: Uuid) -> Result<Option<Car>, sqlx::Error> {
    sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Reads the car row under an exclusive row lock held until the enclosing
/// transaction commits or rolls back. Competing reservation attempts on
/// the same car serialize here.
pub async fn lock_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Car>, sqlx::Error> {
    sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1 FOR UPDATE"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Plain status write; only valid on the transaction that holds the row lock.
pub async fn set_status(conn: &mut PgConnection, id: Uuid, status: CarStatus) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE cars SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_status_and_odometer(
    conn: &mut PgConnection,
    id: Uuid,
    status: CarStatus,
    odometer: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE cars SET status = $1, odometer = $2, updated_at = now() WHERE id = $3")
        .bind(status)
        .bind(odometer)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn update(conn: &mut PgConnection, car: &Car) -> Result<Car, sqlx::Error> {
    sqlx::query_as::<_, Car>(&format!(
        "UPDATE cars
         SET make = $1, model = $2, year = $3, license_plate = $4, status = $5,
             daily_rate_cents = $6, image_url = $7, updated_at = now()
         WHERE id = $8
         RETURNING {CAR_COLUMNS}"
    ))
    .bind(&car.make)
    .bind(&car.model)
    .bind(car.year)
    .bind(&car.license_plate)
    .bind(car.status)
    .bind(car.daily_rate_cents)
    .bind(&car.image_url)
    .bind(car.id)
    .fetch_one(conn)
    .await
}
