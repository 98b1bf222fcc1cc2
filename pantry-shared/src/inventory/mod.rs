//! Pure inventory logic
//!
//! Nothing in here touches the database. Models load rows and hand them to
//! these functions to derive the values that are never persisted:
//!
//! - [`stock`]: low-stock / out-of-stock flags for an item
//! - [`location`]: breadcrumb path from the owning space down to an item
//! - [`pricing`]: purchase line totals

pub mod location;
pub mod pricing;
pub mod stock;

pub use location::{Breadcrumb, BreadcrumbKind, Location, SpaceRef, StorageNode, StorageTree};
pub use stock::{StockLevels, StockStatus};
