//! Type tags and parameter metadata for the intrinsic catalog.
//!
//! These are *semantic* tags: they describe what an intrinsic accepts and
//! produces in BASIC terms. Each backend maps them to its own representation
//! (see the type tables in the individual lowering providers).
//!
//! # Type Tags
//!
//! | Tag          | Meaning                                        |
//! |--------------|------------------------------------------------|
//! | `Void`       | no value (SUB-like intrinsics)                 |
//! | `Boolean`    | truth value                                    |
//! | `Integer`    | 32-bit signed integer                          |
//! | `Long`       | 64-bit signed integer                          |
//! | `Double`     | 64-bit IEEE float                              |
//! | `String`     | variable-length string                         |
//! | `Date`       | point in time                                  |
//! | `Array`      | BASIC array                                    |
//! | `List`       | growable list of universal values              |
//! | `Dictionary` | map from universal value to universal value    |
//! | `Set`        | set of universal values                        |
//! | `Object`     | opaque handle (socket, JSON node, ...)         |
//! | `Any`        | universal value; boxed where the target needs  |

use std::fmt;

/// Semantic type tag for intrinsic parameters and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// No value. Only valid as a return type.
    Void,
    Boolean,
    /// 32-bit signed integer.
    Integer,
    /// 64-bit signed integer.
    Long,
    Double,
    String,
    Date,
    Array,
    List,
    Dictionary,
    Set,
    /// Opaque handle owned by the target runtime.
    Object,
    /// Universal value type.
    Any,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Void => write!(f, "VOID"),
            ValueType::Boolean => write!(f, "BOOLEAN"),
            ValueType::Integer => write!(f, "INTEGER"),
            ValueType::Long => write!(f, "LONG"),
            ValueType::Double => write!(f, "DOUBLE"),
            ValueType::String => write!(f, "STRING"),
            ValueType::Date => write!(f, "DATE"),
            ValueType::Array => write!(f, "ARRAY"),
            ValueType::List => write!(f, "LIST"),
            ValueType::Dictionary => write!(f, "DICTIONARY"),
            ValueType::Set => write!(f, "SET"),
            ValueType::Object => write!(f, "OBJECT"),
            ValueType::Any => write!(f, "ANY"),
        }
    }
}

/// Classification of an intrinsic's semantics.
///
/// Categories belong to the intrinsic, not to a backend: every provider that
/// supports a name agrees on its category because the category is read from
/// the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    IO,
    FileIO,
    String,
    Math,
    ArrayOps,
    Conversion,
    DateTime,
    Collections,
    Networking,
    Json,
    Regex,
    EnvironmentOps,
    ConsoleOps,
    ProcessOps,
    Crypto,
    EngineBinding,
}

impl Category {
    /// Every category, in catalog order.
    pub const ALL: [Category; 16] = [
        Category::IO,
        Category::FileIO,
        Category::String,
        Category::Math,
        Category::ArrayOps,
        Category::Conversion,
        Category::DateTime,
        Category::Collections,
        Category::Networking,
        Category::Json,
        Category::Regex,
        Category::EnvironmentOps,
        Category::ConsoleOps,
        Category::ProcessOps,
        Category::Crypto,
        Category::EngineBinding,
    ];

    /// Returns the display name used by the CLI and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::IO => "IO",
            Category::FileIO => "FileIO",
            Category::String => "String",
            Category::Math => "Math",
            Category::ArrayOps => "ArrayOps",
            Category::Conversion => "Conversion",
            Category::DateTime => "DateTime",
            Category::Collections => "Collections",
            Category::Networking => "Networking",
            Category::Json => "Json",
            Category::Regex => "Regex",
            Category::EnvironmentOps => "EnvironmentOps",
            Category::ConsoleOps => "ConsoleOps",
            Category::ProcessOps => "ProcessOps",
            Category::Crypto => "Crypto",
            Category::EngineBinding => "EngineBinding",
        }
    }

    /// Parses a category name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared intrinsic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    /// Parameter name, for signatures and diagnostics.
    pub name: &'static str,
    /// Semantic type of the argument.
    pub ty: ValueType,
    /// Optional parameters may be omitted; they always trail the required ones.
    pub optional: bool,
}

impl Param {
    /// A required parameter.
    pub const fn required(name: &'static str, ty: ValueType) -> Self {
        Self {
            name,
            ty,
            optional: false,
        }
    }

    /// An optional trailing parameter.
    pub const fn optional(name: &'static str, ty: ValueType) -> Self {
        Self {
            name,
            ty,
            optional: true,
        }
    }
}

/// Accepted argument-count range for an intrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    /// Number of required arguments.
    pub min: usize,
    /// Required plus optional arguments.
    pub max: usize,
}

impl Arity {
    /// Computes the arity from a parameter list.
    pub fn of(params: &[Param]) -> Self {
        let min = params.iter().filter(|p| !p.optional).count();
        Self {
            min,
            max: params.len(),
        }
    }

    /// Returns true if `count` arguments satisfy this arity.
    pub fn accepts(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{} to {}", self.min, self.max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_from_params() {
        let params = [
            Param::required("s", ValueType::String),
            Param::required("start", ValueType::Integer),
            Param::optional("length", ValueType::Integer),
        ];
        let arity = Arity::of(&params);
        assert_eq!(arity, Arity { min: 2, max: 3 });
        assert!(!arity.accepts(1));
        assert!(arity.accepts(2));
        assert!(arity.accepts(3));
        assert!(!arity.accepts(4));
    }

    #[test]
    fn test_arity_display() {
        assert_eq!(Arity { min: 1, max: 1 }.to_string(), "1");
        assert_eq!(Arity { min: 0, max: 2 }.to_string(), "0 to 2");
    }

    #[test]
    fn test_category_from_name() {
        assert_eq!(Category::from_name("networking"), Some(Category::Networking));
        assert_eq!(Category::from_name("FILEIO"), Some(Category::FileIO));
        assert_eq!(Category::from_name("Graphics"), None);
    }
}
