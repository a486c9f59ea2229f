//! Core types shared across NestCanvas facilities
//!
//! The error facility and the logging facility both key their structured
//! output off the constants in [`schema`], so they live in a crate with no
//! dependencies of its own.

pub mod schema;
