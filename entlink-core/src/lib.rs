//! # entlink-core
//!
//! Core types for entlink: the data structures shared by the pipeline crate
//! and the command-line driver.
//!
//! This crate provides:
//! - **Identifiers**: `KbId`, the knowledge-base sense identifier
//! - **Inputs**: `Mention`, `EntityType`, `Origin`
//! - **Hypotheses**: `Candidate`, `Category`
//! - **Outputs**: `LinkedEntity`
//!
//! An unresolved mention carries `Option::<KbId>::None`; there is no sentinel
//! identifier.

pub mod entity;
pub mod error;

pub use entity::{
    arity, Candidate, Category, EntityType, KbId, LinkedEntity, Mention, Origin,
};
pub use error::{Error, Result};
