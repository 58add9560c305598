//! Domain types shared across Postbox services and daemons.
//!
//! This crate contains only pure types with no framework dependencies.
//! Import in `usecase/` and `domain/` layers; infra adapters convert to and
//! from these at the edges.

pub mod id;
pub mod pagination;
pub mod status;
