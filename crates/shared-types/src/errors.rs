//! # Error Types
//!
//! Errors shared across subsystems.

use crate::actor::{Capability, Role};
use thiserror::Error;

/// Errors raised by the actor capability check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorError {
    /// No actor context was supplied for an operation that needs one.
    #[error("Authentication required")]
    Unauthenticated,

    /// The actor's role does not grant the capability.
    #[error("Role {role} is not allowed to {capability}")]
    Forbidden { role: Role, capability: Capability },

    /// The actor is acting on a record owned by someone else.
    #[error("Actor {actor_id} does not own {resource}")]
    NotOwner { actor_id: u64, resource: String },
}

/// A string could not be parsed into one of the shared enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
