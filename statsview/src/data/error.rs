//! Registry error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{kind} name must not be empty")]
    InvalidName { kind: &'static str },
}
