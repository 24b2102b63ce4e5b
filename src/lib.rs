//! # qblower
//!
//! The intrinsic lowering layer of a multi-backend BASIC compiler.
//!
//! A BASIC program calls built-in routines (`Len`, `Mid$`, `HttpGet`,
//! `DrawText`, ...). This crate knows every one of them and turns each call
//! into code for one of four targets:
//!
//! ```text
//!                                      ┌─ managed   (C#)
//!                                      ├─ native    (C++20)
//! Intrinsic call ──→ LoweringRegistry ─┼─ ir        (LLVM IR)
//!                                      └─ bytecode  (CIL)
//! ```
//!
//! Modules:
//!
//! - [`intrinsics`] - The catalog: names, categories, parameters
//! - [`lowering`] - Per-backend providers and the registry that picks one
//! - [`compat`] - Whole-program check of call sites against a backend
//! - [`lexer`] - Finds intrinsic call sites in BASIC source
//! - [`span`] - Source locations
//!
//! ## Example
//!
//! ```
//! use qblower::lowering::{Backend, LoweringRegistry};
//!
//! let registry = LoweringRegistry::standard();
//! let args = vec!["s".to_string(), "t".to_string()];
//!
//! let code = registry.emit(Backend::Managed, "InStr", &args).unwrap();
//! assert_eq!(code, "(s.IndexOf(t, StringComparison.Ordinal) + 1)");
//! ```

pub mod compat;
pub mod intrinsics;
pub mod lexer;
pub mod lowering;
pub mod span;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::compat::{check_compatibility, check_source, CallSiteRef, Diagnostic};
    pub use crate::intrinsics::{Arity, Category, Intrinsic, ValueType};
    pub use crate::lexer::{scan_call_sites, Lexer, Token, TokenKind};
    pub use crate::lowering::{
        Backend, CallSite, HelperRoutine, LoweringError, LoweringProvider, LoweringRegistry,
        Priority, UnitRequirements,
    };
    pub use crate::span::Span;
}
