//! Utility functions shared by the backend clients

pub mod retry;
pub mod time;
