//! Maps clang's AST of a C header to the table of declarations h2yaml prints.
//!
//! The walk visits the top-level declarations of the translation unit that come from
//! interesting headers. Structs, unions and enums are visited on first use and memoized, named
//! ones are hoisted to their own table entries and anonymous ones are inlined where they are
//! used.

mod compat;
mod declarator;
mod filter;
mod index;
mod mapper;
pub mod model;
mod spelling;
mod tokens;

pub use filter::HeaderFilter;
pub use mapper::map_translation_unit;
pub use model::Declarations;

/// Output conventions.
#[derive(Clone, Copy, Debug, Default)]
pub struct MapOptions {
    /// Name anonymous parameters `_arg<i>`.
    pub canonicalization: bool,
    /// Mimic the legacy cast-to-yaml output: `int` spelled out in integer type names, and
    /// array lengths, enumerator values and initializers written as normalized source text.
    pub compat_cast_to_yaml: bool,
}
