//! Subscription layer.
//!
//! Owns the route -> listeners registry and the opaque handles used to undo a
//! single subscription without touching its siblings.

pub(crate) mod subscription_handle;
pub(crate) mod subscription_registry;
