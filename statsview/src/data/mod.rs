//! Registries
//!
//! - `views` - metric definitions keyed by name
//! - `importers` - backend plugins in registration order
//!
//! Both are explicit objects shared through `Arc`. They are filled during
//! setup and read by the resolver afterwards; reads take a snapshot so no
//! lock is held while backends are queried.

mod error;
mod importers;
mod views;

pub use error::RegistryError;
pub use importers::ImporterRegistry;
pub use views::ViewRegistry;
