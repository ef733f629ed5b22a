//! Traits for code generation backends.

use crate::ir::{IrSchema, IrType};
use crate::naming;
use std::borrow::Cow;

/// A code generation backend.
///
/// Backends transform an IR [`IrSchema`] into wire-compatible source
/// code for one target language. Generation is a pure function of the
/// schema: identical input yields byte-identical output, and backends
/// share no mutable state, so configured targets can run in parallel.
///
/// # Implementing Custom Backends
///
/// ```ignore
/// use contractgen::{Backend, ir::IrSchema, register_backend};
///
/// struct SwiftBackend;
///
/// impl Backend for SwiftBackend {
///     fn name(&self) -> &'static str { "swift" }
///     fn language(&self) -> &'static str { "swift" }
///     fn extension(&self) -> &'static str { "swift" }
///     fn keywords(&self) -> &'static [&'static str] { &["class", "enum"] }
///     fn scalar_type(&self, scalar: &str) -> Option<&'static str> { /* ... */ }
///     fn type_name(&self, ty: &IrType, schema: &IrSchema) -> String { /* ... */ }
///     fn generate(&self, schema: &IrSchema) -> String { /* ... */ }
/// }
///
/// // Register before first use
/// register_backend(&SwiftBackend);
/// ```
pub trait Backend: Send + Sync {
    /// Unique backend identifier (e.g., "dart", "kotlin").
    fn name(&self) -> &'static str;

    /// Target language (e.g., "dart", "kotlin").
    fn language(&self) -> &'static str;

    /// File extension for generated code (e.g., "dart", "kt").
    fn extension(&self) -> &'static str;

    /// The target's reserved words. Immutable configuration supplied at
    /// construction; [`Backend::escape_keyword`] consults it.
    fn keywords(&self) -> &'static [&'static str];

    /// Map a scalar name to the target's type, or `None` when the
    /// backend has no explicit mapping and must fall back to its most
    /// permissive type.
    fn scalar_type(&self, scalar: &str) -> Option<&'static str>;

    /// Render a type occurrence (including nullability) in the target's
    /// syntax.
    fn type_name(&self, ty: &IrType, schema: &IrSchema) -> String;

    /// Escape a name that collides with the target's reserved words.
    fn escape_keyword<'a>(&self, name: &'a str) -> Cow<'a, str> {
        naming::escape_keyword(name, self.keywords())
    }

    /// Idiomatic casing for an enum wire tag. Identical across backends
    /// for the same input.
    fn enum_value_case(&self, raw: &str) -> String {
        naming::enum_value_case(raw)
    }

    /// Generate code from the IR schema. Infallible on a schema that
    /// passed [`IrSchema::validate`](crate::ir::IrSchema::validate).
    fn generate(&self, schema: &IrSchema) -> String;
}
