use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directory row mapping an external tenant identity (subdomain) to the
/// schema that holds the tenant's data. Stored in the shared public
/// schema, outside every tenant partition.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub subdomain: String,
    pub schema_name: String,
    pub created_at: DateTime<Utc>,
}
