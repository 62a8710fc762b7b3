//! Database models for locally stored records.

pub mod container;
pub mod depot;
pub mod lookup;

pub use container::{Container, ContainerFilter, ContainerInput};
pub use depot::{Depot, DepotInput};
pub use lookup::{LookupRecord, OrderStatus, ShippingLine};
