//! # Domain Layer
//!
//! Request and view types, the unit state machine and alert construction.

pub mod alerts;
pub mod entities;
pub mod errors;
pub mod transitions;
