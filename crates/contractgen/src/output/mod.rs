//! Output backends.
//!
//! Each backend lives behind its own feature gate so downstream crates
//! pay only for the targets they emit.

#[cfg(feature = "backend-dart")]
pub mod dart;

#[cfg(feature = "backend-kotlin")]
pub mod kotlin;

#[cfg(feature = "backend-dart")]
pub use dart::{DartBackend, DartOptions, generate_dart};

#[cfg(feature = "backend-kotlin")]
pub use kotlin::{KotlinBackend, KotlinOptions, generate_kotlin};
