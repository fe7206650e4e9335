//! SeaORM entities for the catalog tables.
//!
//! The in-memory store keeps the same `Model` rows, so projections are built
//! from one representation regardless of backend.

pub mod brand;
pub mod category;
pub mod product;
pub mod product_image;
pub mod product_variant;
