//! Core of the business directory, independent of the web framework.
//! - Registration writes an owner account and its business atomically.
//! - Login checks credentials and issues signed tokens; verification needs no store access.
//! - Persistence sits behind the `store` traits, with SeaORM and in-memory implementations.

pub mod errors;
pub mod validation;
pub mod domain;
pub mod store;
pub mod auth;
pub mod business;
pub mod directory;
