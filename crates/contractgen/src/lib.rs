//! Wire-compatible contract bindings from a schema IR.
//!
//! `contractgen` turns one schema of data shapes and operations into
//! idiomatic source files for multiple target languages. Every target
//! is generated from the same IR with the same naming and serialization
//! rules, so independently generated files interoperate over a
//! map-shaped wire format.
//!
//! # Architecture
//!
//! ```text
//! Schema IR                     Output Backends
//! ─────────────────────────     ─────────────────────────────
//! enums, interfaces,        ┌─> Dart classes + map codecs
//! objects, inputs,   ───────┤
//! unions, operations        └─> Kotlin classes + map codecs
//! (ir.rs)
//! ```
//!
//! Generation is deterministic: identical schemas yield byte-identical
//! files, and section order is fixed (enums, interfaces, objects,
//! inputs, unions, operations, handlers) so regeneration diffs reflect
//! schema changes only.
//!
//! # Example
//!
//! ```
//! use contractgen::ir::{IrField, IrObject, IrSchema, IrType};
//!
//! let mut schema = IrSchema::new();
//! schema.objects.push(
//!     IrObject::new("Product")
//!         .with_field(IrField::new("id", IrType::scalar("ID"))),
//! );
//! schema.validate().unwrap();
//!
//! # #[cfg(feature = "backend-dart")] {
//! let dart = contractgen::generate_dart(&schema, &Default::default());
//! assert!(dart.contains("class Product {"));
//! # }
//! ```
//!
//! # Using the Backend Registry
//!
//! ```ignore
//! use contractgen::{backend_names, get_backend};
//!
//! for name in backend_names() {
//!     println!("Backend: {}", name);
//! }
//!
//! if let Some(backend) = get_backend("kotlin") {
//!     let output = backend.generate(&schema);
//!     println!("{}", output);
//! }
//! ```
//!
//! # Feature Flags
//!
//! Backend flags (use `backend-*` prefix):
//! - `backend-dart` - Dart classes, sealed unions, map codecs
//! - `backend-kotlin` - Kotlin classes, sealed unions, map codecs
//!
//! Language umbrella flags (convenience):
//! - `dart` - backend-dart
//! - `kotlin` - backend-kotlin

pub mod emit;
pub mod ir;
pub mod naming;
pub mod output;
pub mod registry;
pub mod traits;

// Re-export traits
pub use traits::Backend;

// Re-export registry functions
pub use registry::{
    backend_names, backends, backends_for_language, get_backend, register_backend,
};

// Re-export generators
#[cfg(feature = "backend-dart")]
pub use output::{DartOptions, generate_dart};

#[cfg(feature = "backend-kotlin")]
pub use output::{KotlinOptions, generate_kotlin};

// Re-export backend structs
#[cfg(feature = "backend-dart")]
pub use output::dart::DartBackend;

#[cfg(feature = "backend-kotlin")]
pub use output::kotlin::KotlinBackend;
