use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::Tenant;

/// A validated Postgres schema identifier naming one tenant partition.
///
/// Raw identifiers are never trusted: construction enforces the allow-list
/// `[a-z_][a-z0-9_]{0,62}` (no `pg_` prefix), and interpolation into the
/// partition-selection statement additionally double-quotes the name, so a
/// value that somehow slipped past validation still cannot terminate the
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaName(String);

impl SchemaName {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let valid_len = !raw.is_empty() && raw.len() <= 63;
        let mut chars = raw.chars();
        let valid_first = chars.next().is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !(valid_len && valid_first && valid_rest) || raw.starts_with("pg_") {
            return Err(AppError::TenantScope(format!("invalid schema identifier: {raw:?}")));
        }
        Ok(SchemaName(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The quoted form spliced into `SET LOCAL search_path`.
    pub(crate) fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl std::fmt::Display for SchemaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the inbound Host header to a tenant partition.
///
/// `tenant.example.com` selects the tenant registered under `tenant`;
/// bare domains and localhost fall through to the shared `public`
/// partition. An unknown subdomain fails closed with `TenantNotFound`.
pub async fn resolve_host(pool: &PgPool, host: &str) -> Result<SchemaName, AppError> {
    let host = host.split(':').next().unwrap_or(host);
    let parts: Vec<&str> = host.split('.').collect();

    let subdomain = if parts.len() > 2 { parts[0] } else { "public" };
    if subdomain == "public" || host == "localhost" {
        return SchemaName::parse("public");
    }

    let tenant: Option<Tenant> = sqlx::query_as::<_, Tenant>(
        "SELECT id, subdomain, schema_name, created_at FROM public.tenants WHERE subdomain = $1",
    )
    .bind(subdomain)
    .fetch_optional(pool)
    .await?;

    match tenant {
        Some(tenant) => SchemaName::parse(&tenant.schema_name),
        None => Err(AppError::TenantNotFound(format!("no tenant for subdomain {subdomain}"))),
    }
}

/// Axum extractor that resolves the request's tenant partition before the
/// handler runs. Handlers receive an already-validated `SchemaName`.
#[derive(Debug, Clone)]
pub struct TenantSchema(pub SchemaName);

#[async_trait]
impl<S> FromRequestParts<S> for TenantSchema
where
    PgPool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = PgPool::from_ref(state);
        let host = parts
            .headers
            .get(axum::http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Validation("missing Host header".to_string()))?;

        let schema = resolve_host(&pool, host).await?;
        tracing::debug!("Resolved tenant schema: {}", schema);
        Ok(TenantSchema(schema))
    }
}

/// Per-tenant table DDL, applied schema-qualified so provisioning needs no
/// search_path of its own.
const TENANT_TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "{schema}".cars (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        make TEXT NOT NULL,
        model TEXT NOT NULL,
        year INT NOT NULL DEFAULT 0,
        license_plate TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'available',
        daily_rate_cents BIGINT NOT NULL DEFAULT 0,
        odometer BIGINT NOT NULL DEFAULT 0,
        image_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "{schema}".customers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email TEXT NOT NULL,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "{schema}".bookings (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        car_id UUID NOT NULL REFERENCES "{schema}".cars (id),
        customer_id UUID NOT NULL REFERENCES "{schema}".customers (id),
        start_time TIMESTAMPTZ NOT NULL,
        end_time TIMESTAMPTZ NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        final_odometer BIGINT,
        damage_cost_cents BIGINT,
        total_amount_cents BIGINT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "{schema}".payments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        booking_id UUID NOT NULL UNIQUE REFERENCES "{schema}".bookings (id),
        processor_ref TEXT NOT NULL UNIQUE,
        amount_cents BIGINT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending_auth',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS "{schema}".webhooks (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        url TEXT NOT NULL,
        events TEXT[] NOT NULL,
        secret_key TEXT NOT NULL,
        active BOOLEAN NOT NULL DEFAULT true,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
];

/// Creates a tenant: directory row, schema, and tables, atomically.
/// Re-running for an existing tenant is a no-op apart from the directory
/// conflict check.
pub async fn provision_tenant(
    pool: &PgPool,
    subdomain: &str,
    schema: &SchemaName,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO public.tenants (subdomain, schema_name) VALUES ($1, $2)
         ON CONFLICT (subdomain) DO NOTHING",
    )
    .bind(subdomain)
    .bind(schema.as_str())
    .execute(&mut *tx)
    .await?;

    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema.quoted()))
        .execute(&mut *tx)
        .await?;

    for ddl in TENANT_TABLES {
        sqlx::query(&ddl.replace("\"{schema}\"", &schema.quoted()))
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!("Provisioned tenant {} (schema {})", subdomain, schema);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for s in ["public", "tenant_a", "_x", "t1"] {
            assert_eq!(SchemaName::parse(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn rejects_injection_shaped_identifiers() {
        for s in [
            "",
            "Tenant",
            "tenant-a",
            "tenant a",
            "1tenant",
            "x\"; DROP TABLE cars; --",
            "x;select",
            "pg_catalog",
        ] {
            assert!(SchemaName::parse(s).is_err(), "{s:?} should be rejected");
        }
    }

    #[test]
    fn rejects_overlong_identifiers() {
        let long = "a".repeat(64);
        assert!(SchemaName::parse(&long).is_err());
        let ok = "a".repeat(63);
        assert!(SchemaName::parse(&ok).is_ok());
    }

    #[test]
    fn quoted_form_wraps_identifier() {
        let s = SchemaName::parse("tenant_a").unwrap();
        assert_eq!(s.quoted(), "\"tenant_a\"");
    }
}
