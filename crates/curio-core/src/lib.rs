//! Core types and trait definitions for the Curio listing pipeline.
//!
//! No HTTP, database or runtime dependencies. Everything here is a plain
//! data type, a pure function or a collaborator trait implemented in
//! another crate.

// Trait futures carry explicit `Send` bounds where they matter.
#![allow(async_fn_in_trait)]

pub mod analysis;
pub mod candidate;
pub mod catalog;
pub mod category;
pub mod error;
pub mod identifier;
pub mod pricing;
pub mod schema;
pub mod store;

pub use error::{Error, ErrorKind, Result};
