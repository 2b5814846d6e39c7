//! Sea-ORM description of the session table.
//!
//! The store builds its own SQL and never goes through these entities, but
//! host applications and tests can use them with `sea_orm::Schema` to create
//! a table that matches what the store expects.

/// Session table entity for the default `shopify_sessions` table.
pub mod session;
