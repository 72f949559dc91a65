//! Notifier Service Layer
//!
//! Target registry operations, notification resolution, and tenant
//! provisioning.

mod error;
mod notify;
mod provision;
mod targets;

pub use error::*;
pub use notify::Notifier;
pub use provision::{Provisioner, TenantStatus};
pub use targets::{DeviceRegistration, TargetRegistry};
