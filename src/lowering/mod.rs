//! Standard-library lowering for the four code generation backends.
//!
//! This module turns intrinsic calls into target code text. The same
//! abstract operation is lowered very differently per backend:
//!
//! ```text
//! Mid(s, 3, 4)
//!   managed   →  __blMid(s, 3 - 1, 4)
//!   native    →  s.substr(3 - 1, 4)
//!   ir        →  %r.start = sub i32 3, 1
//!                %r = call ptr @bl_str_mid(ptr %s, i32 %r.start, i32 4)
//!   bytecode  →  <push s> <push 3> ldc.i4.1 sub <push 4> call __bl_mid
//! ```
//!
//! # Architecture
//!
//! ```text
//! Driver ──► LoweringRegistry::resolve(backend, name)
//!                 │   (specialized tier first, then general)
//!                 ▼
//!            LoweringProvider::emit(intrinsic, call) ──► text
//! ```
//!
//! Providers are stateless and hold their rules in an exhaustive `match`
//! over [`Intrinsic`], so the set of intrinsics a provider claims and the
//! set it can emit are the same match arm by construction.
//!
//! # Providers
//!
//! - [`ManagedProvider`] - C# source
//! - [`NativeProvider`] - C++20 source
//! - [`IrProvider`] - LLVM textual IR
//! - [`BytecodeProvider`] - CIL assembler text
//! - [`EngineBindingProvider`] - game-engine pass-through on the managed backend

mod bytecode;
mod engine;
mod error;
mod ir;
mod managed;
mod native;
mod registry;
mod requirements;
mod rule;

pub use bytecode::BytecodeProvider;
pub use engine::EngineBindingProvider;
pub use error::{LoweringError, ParseBackendError};
pub use ir::IrProvider;
pub use managed::ManagedProvider;
pub use native::NativeProvider;
pub use registry::{LoweringRegistry, Priority};
pub use requirements::UnitRequirements;

use std::fmt;
use std::str::FromStr;

use crate::intrinsics::Intrinsic;

/// A compilation target the lowering layer can emit code for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    /// Managed object-oriented source (C#).
    Managed,
    /// Native systems-language source (C++20).
    Native,
    /// Textual SSA intermediate representation (LLVM IR).
    Ir,
    /// Stack-based bytecode (CIL).
    Bytecode,
}

impl Backend {
    /// Every backend, in registry order.
    pub const ALL: [Backend; 4] = [
        Backend::Managed,
        Backend::Native,
        Backend::Ir,
        Backend::Bytecode,
    ];

    /// Identifier used on the command line and in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Managed => "managed",
            Backend::Native => "native",
            Backend::Ir => "ir",
            Backend::Bytecode => "bytecode",
        }
    }

    /// Name of the emitted language.
    pub fn target_language(&self) -> &'static str {
        match self {
            Backend::Managed => "C#",
            Backend::Native => "C++20",
            Backend::Ir => "LLVM IR",
            Backend::Bytecode => "CIL",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "managed" | "csharp" | "cs" => Ok(Backend::Managed),
            "native" | "cpp" | "c++" => Ok(Backend::Native),
            "ir" | "llvm" => Ok(Backend::Ir),
            "bytecode" | "cil" | "msil" => Ok(Backend::Bytecode),
            _ => Err(ParseBackendError(s.to_string())),
        }
    }
}

/// One intrinsic call site as seen by a provider.
///
/// `args` are already-lowered target fragments; providers position them
/// into their templates without parsing them. `result` is the name the
/// driver wants the call's value bound to. Only the IR backend reads it:
/// an IR fragment defines `%{result}` with its last instruction and names
/// every temporary `%{result}.<role>`, so the emitted text depends on the
/// inputs alone.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    args: &'a [String],
    result: &'a str,
}

impl<'a> CallSite<'a> {
    /// Result name used when the driver does not pick one.
    pub const DEFAULT_RESULT: &'static str = "result";

    /// Creates a call site with the default result name.
    pub fn new(args: &'a [String]) -> Self {
        Self {
            args,
            result: Self::DEFAULT_RESULT,
        }
    }

    /// Sets the name the call's value is bound to (IR only).
    pub fn with_result(mut self, result: &'a str) -> Self {
        self.result = result;
        self
    }

    pub fn args(&self) -> &'a [String] {
        self.args
    }

    pub fn result(&self) -> &'a str {
        self.result
    }
}

/// A self-contained routine a backend injects once per compilation unit.
///
/// `name` is the deduplication key. Several intrinsics may share a helper
/// (the managed `Rnd` and `Randomize` share one generator field), and the
/// driver emits each name once no matter how many call sites need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelperRoutine {
    pub name: &'static str,
    /// Complete definition text.
    pub body: &'static str,
}

/// Lowers intrinsic calls for one backend.
///
/// Implementations are stateless after construction and shared by the whole
/// compilation, hence `Send + Sync`.
///
/// # Example Implementation
///
/// ```
/// use qblower::intrinsics::Intrinsic;
/// use qblower::lowering::{Backend, CallSite, HelperRoutine, LoweringError, LoweringProvider};
///
/// struct LenOnly;
///
/// impl LoweringProvider for LenOnly {
///     fn name(&self) -> &str { "len-only" }
///     fn backend(&self) -> Backend { Backend::Managed }
///     fn handles(&self, intrinsic: Intrinsic) -> bool { intrinsic == Intrinsic::Len }
///     fn emit(&self, _: Intrinsic, call: &CallSite<'_>) -> Result<String, LoweringError> {
///         Ok(format!("{}.Length", call.args()[0]))
///     }
///     fn required_declarations(&self, _: Intrinsic) -> Vec<String> { Vec::new() }
///     fn helper_definition(&self, _: Intrinsic) -> Option<HelperRoutine> { None }
/// }
///
/// assert!(LenOnly.handles_name("LEN"));
/// ```
pub trait LoweringProvider: Send + Sync {
    /// Provider name for diagnostics and logging.
    fn name(&self) -> &str;

    /// The backend this provider emits code for.
    fn backend(&self) -> Backend;

    /// Returns true if this provider has an emission rule for `intrinsic`.
    fn handles(&self, intrinsic: Intrinsic) -> bool;

    /// Name-based form of [`handles`](Self::handles), ignoring ASCII case.
    fn handles_name(&self, name: &str) -> bool {
        Intrinsic::from_name(name).is_some_and(|i| self.handles(i))
    }

    /// Emits the target code implementing one call.
    ///
    /// The registry checks the argument count against the catalog before
    /// calling this, so implementations may index declared positions.
    fn emit(&self, intrinsic: Intrinsic, call: &CallSite<'_>) -> Result<String, LoweringError>;

    /// Preamble fragments the emitted code needs. Safe to deduplicate by text.
    fn required_declarations(&self, intrinsic: Intrinsic) -> Vec<String>;

    /// Helper routine to inject once per unit, when the backend has no
    /// native equivalent for the operation.
    fn helper_definition(&self, intrinsic: Intrinsic) -> Option<HelperRoutine>;

    /// Returns true if the emitted code calls into the separately linked
    /// BASIC runtime library.
    fn requires_runtime(&self, _intrinsic: Intrinsic) -> bool {
        false
    }
}
