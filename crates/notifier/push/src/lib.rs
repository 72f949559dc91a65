//! Notifier Push Delivery
//!
//! Delivery-provider contract, the APNs implementation, and the per-tenant
//! client registry.

mod apns;
mod error;
mod tenants;
mod traits;

pub use apns::*;
pub use error::*;
pub use tenants::*;
pub use traits::*;
