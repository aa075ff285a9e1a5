//! Multi-tenant car-rental core: schema-per-tenant isolation over one
//! shared Postgres, pessimistic-locked booking lifecycle, and a two-phase
//! (authorize-then-capture) payment flow with exactly-once settlement.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payments;
pub mod repository;
pub mod service;
pub mod tenant;
pub mod webhooks;
