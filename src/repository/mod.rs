//! Per-entity SQL. Every function takes the `&mut PgConnection` handed out
//! by the transactional unit, so no query can run outside a tenant-scoped
//! transaction. Table names are unqualified on purpose: the transaction's
//! search_path is the partition.

pub mod bookings;
pub mod cars;
pub mod customers;
pub mod payments;
pub mod webhooks;
