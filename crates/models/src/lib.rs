//! SeaORM entities and connection helpers for the directory schema.

pub mod errors;
pub mod db;
pub mod user;
pub mod business;

#[cfg(test)]
mod tests;
