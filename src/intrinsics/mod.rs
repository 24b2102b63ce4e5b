//! Intrinsic catalog for the BASIC standard library.
//!
//! Intrinsics are the built-in operations the compiler lowers specially
//! (PRINT, string slicing, math, collections, file and network I/O, ...).
//! This module is the single source of truth for what exists: the closed
//! [`Intrinsic`] enum, and one immutable [`IntrinsicDescriptor`] per variant
//! describing its category and signature.
//!
//! # Name Resolution
//!
//! Names follow BASIC tradition:
//! - Lookups ignore ASCII case (`mid`, `MID`, `Mid` are the same)
//! - A trailing `$` string suffix is accepted (`MID$` resolves to `Mid`)
//!
//! A name is resolved to an [`Intrinsic`] once; everything downstream
//! (providers, registry) matches on the enum rather than on text.
//!
//! # Example
//!
//! ```
//! use qblower::intrinsics::{lookup, Category, Intrinsic};
//!
//! let mid = lookup("MID$").unwrap();
//! assert_eq!(mid.intrinsic, Intrinsic::Mid);
//! assert_eq!(mid.category, Category::String);
//! assert_eq!(mid.arity().min, 2);
//! ```

mod catalog;
pub mod types;

pub use types::{Arity, Category, Param, ValueType};

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use catalog::CATALOG;

/// Closed set of known intrinsics.
///
/// Variants are declared in catalog order; [`Intrinsic::descriptor`] relies
/// on that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Intrinsic {
    // IO
    Print,
    PrintLine,
    Input,
    ReadLine,
    // ConsoleOps
    Cls,
    Locate,
    Color,
    Beep,
    InKey,
    // FileIO
    FileExists,
    ReadAllText,
    WriteAllText,
    AppendAllText,
    DeleteFile,
    DirectoryExists,
    CreateDirectory,
    // String
    Len,
    Left,
    Right,
    Mid,
    InStr,
    UCase,
    LCase,
    Trim,
    LTrim,
    RTrim,
    Replace,
    Chr,
    Asc,
    Space,
    StrReverse,
    // Math
    Abs,
    Sqr,
    Sin,
    Cos,
    Tan,
    Atn,
    Log,
    Exp,
    Int,
    Fix,
    Sgn,
    Round,
    Min,
    Max,
    Pow,
    Rnd,
    Randomize,
    // Conversion
    CInt,
    CLng,
    CDbl,
    CStr,
    CBool,
    Val,
    Str,
    Hex,
    // ArrayOps
    UBound,
    LBound,
    ArraySort,
    ArrayReverse,
    // DateTime
    Now,
    Timer,
    Year,
    Month,
    Day,
    // Collections
    CreateList,
    ListAdd,
    ListGet,
    ListSet,
    ListCount,
    ListRemoveAt,
    ListClear,
    ListContains,
    CreateDictionary,
    DictSet,
    DictGet,
    DictContainsKey,
    DictRemove,
    DictCount,
    CreateSet,
    SetAdd,
    SetContains,
    SetCount,
    // Networking
    HttpGet,
    HttpPost,
    TcpConnect,
    TcpSend,
    TcpReceive,
    TcpClose,
    // Json
    JsonSerialize,
    JsonDeserialize,
    // Regex
    RegexMatch,
    RegexReplace,
    RegexFind,
    // EnvironmentOps
    GetEnv,
    SetEnv,
    CommandLine,
    // ProcessOps
    Shell,
    Sleep,
    ExitProcess,
    // Crypto
    Md5,
    Sha256,
    NewGuid,
    // EngineBinding
    InitWindow,
    CloseWindow,
    WindowShouldClose,
    BeginDrawing,
    EndDrawing,
    ClearBackground,
    DrawText,
}

impl Intrinsic {
    /// Number of intrinsics in the catalog.
    pub const COUNT: usize = 110;

    /// Resolves a BASIC name to an intrinsic.
    ///
    /// Comparison ignores ASCII case and a single trailing `$`.
    pub fn from_name(name: &str) -> Option<Intrinsic> {
        static BY_NAME: OnceLock<HashMap<String, Intrinsic>> = OnceLock::new();
        let map = BY_NAME.get_or_init(|| {
            CATALOG
                .iter()
                .map(|d| (d.name.to_ascii_lowercase(), d.intrinsic))
                .collect()
        });
        let base = name.strip_suffix('$').unwrap_or(name);
        map.get(&base.to_ascii_lowercase()).copied()
    }

    /// Returns this intrinsic's catalog entry.
    pub fn descriptor(self) -> &'static IntrinsicDescriptor {
        let descriptor = &CATALOG[self as usize];
        debug_assert_eq!(descriptor.intrinsic, self, "catalog out of order");
        descriptor
    }

    /// Canonical spelling of the name.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn category(self) -> Category {
        self.descriptor().category
    }

    /// Accepted argument-count range, derived from the declared parameters.
    pub fn arity(self) -> Arity {
        self.descriptor().arity()
    }

    /// Iterates over every intrinsic in catalog order.
    pub fn all() -> impl Iterator<Item = Intrinsic> {
        CATALOG.iter().map(|d| d.intrinsic)
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of one intrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrinsicDescriptor {
    pub intrinsic: Intrinsic,
    /// Canonical spelling; lookups are case-insensitive.
    pub name: &'static str,
    pub category: Category,
    /// Declared parameters in call order. Optional ones trail.
    pub params: &'static [Param],
    /// Result type; [`ValueType::Void`] for statement-like intrinsics.
    pub returns: ValueType,
}

impl IntrinsicDescriptor {
    /// Accepted argument-count range.
    pub fn arity(&self) -> Arity {
        Arity::of(self.params)
    }

    /// Human-readable BASIC-style signature, e.g.
    /// `Mid(s AS STRING, start AS INTEGER, [length AS INTEGER]) AS STRING`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                if p.optional {
                    format!("[{} AS {}]", p.name, p.ty)
                } else {
                    format!("{} AS {}", p.name, p.ty)
                }
            })
            .collect();
        let mut sig = format!("{}({})", self.name, params.join(", "));
        if self.returns != ValueType::Void {
            sig.push_str(&format!(" AS {}", self.returns));
        }
        sig
    }
}

/// Looks up an intrinsic's descriptor by name.
///
/// Returns `None` for names that are not intrinsics. This is a query, not a
/// precondition: callers use it to tell user functions from built-ins.
pub fn lookup(name: &str) -> Option<&'static IntrinsicDescriptor> {
    Intrinsic::from_name(name).map(Intrinsic::descriptor)
}

/// Every known name, sorted case-insensitively.
///
/// The iterator is lazy and finite; call again to restart.
pub fn all_names() -> impl Iterator<Item = &'static str> {
    static SORTED: OnceLock<Vec<&'static str>> = OnceLock::new();
    SORTED
        .get_or_init(|| {
            let mut names: Vec<&'static str> = CATALOG.iter().map(|d| d.name).collect();
            names.sort_by_key(|n| n.to_ascii_lowercase());
            names
        })
        .iter()
        .copied()
}

/// Names in one category, sorted case-insensitively.
pub fn names_by_category(category: Category) -> impl Iterator<Item = &'static str> {
    all_names().filter(move |name| {
        lookup(name).is_some_and(|d| d.category == category)
    })
}
