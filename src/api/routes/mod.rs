//! Route handlers, grouped by resource.

pub mod cache;
pub mod containers;
pub mod depots;
pub mod families;
pub mod health;
pub mod lookups;
