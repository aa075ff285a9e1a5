use sqlx::PgConnection;

use crate::models::Customer;

pub async fn insert(
    conn: &mut PgConnection,
    email: &str,
    first_name: &str,
    last_name: &str,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (email, first_name, last_name) VALUES ($1, $2, $3)
         RETURNING id, email, first_name, last_name, created_at",
    )
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .fetch_one(conn)
    .await
}
