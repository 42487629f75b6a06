//! Utilities module
//!
//! Contains error handling, input validation and logging helpers

pub mod error;
pub mod error_handler;
pub mod logging;
pub mod validation;
