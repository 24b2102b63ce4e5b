//! The static intrinsic table.
//!
//! Entries are listed in the same order as the variants of [`Intrinsic`], so
//! `CATALOG[intrinsic as usize]` is that intrinsic's descriptor. A test in
//! the parent module checks the correspondence.

use super::types::{Category, Param, ValueType};
use super::{Intrinsic, IntrinsicDescriptor};

use ValueType as T;

/// Builds a descriptor whose canonical name is the variant's own spelling,
/// so the enum and the table cannot disagree on names.
macro_rules! entry {
    ($intrinsic:ident, $category:ident, $params:expr, $returns:ident) => {
        IntrinsicDescriptor {
            intrinsic: Intrinsic::$intrinsic,
            name: stringify!($intrinsic),
            category: Category::$category,
            params: $params,
            returns: ValueType::$returns,
        }
    };
}

const fn req(name: &'static str, ty: ValueType) -> Param {
    Param::required(name, ty)
}

const fn opt(name: &'static str, ty: ValueType) -> Param {
    Param::optional(name, ty)
}

// Parameter lists shared by many entries.
const NONE: &[Param] = &[];
const STR: &[Param] = &[req("s", T::String)];
const PATH: &[Param] = &[req("path", T::String)];
const PATH_TEXT: &[Param] = &[req("path", T::String), req("text", T::String)];
const NUM: &[Param] = &[req("x", T::Double)];
const NUM_PAIR: &[Param] = &[req("a", T::Double), req("b", T::Double)];
const STR_COUNT: &[Param] = &[req("s", T::String), req("n", T::Integer)];
const DATE: &[Param] = &[req("d", T::Date)];
const ARRAY_DIM: &[Param] = &[req("arr", T::Array), opt("dimension", T::Integer)];
const ARRAY: &[Param] = &[req("arr", T::Array)];
const LIST: &[Param] = &[req("list", T::List)];
const LIST_VALUE: &[Param] = &[req("list", T::List), req("value", T::Any)];
const LIST_INDEX: &[Param] = &[req("list", T::List), req("index", T::Integer)];
const DICT: &[Param] = &[req("dict", T::Dictionary)];
const DICT_KEY: &[Param] = &[req("dict", T::Dictionary), req("key", T::Any)];
const SET: &[Param] = &[req("set", T::Set)];
const SET_VALUE: &[Param] = &[req("set", T::Set), req("value", T::Any)];
const CONN: &[Param] = &[req("conn", T::Object)];
const PATTERN: &[Param] = &[req("input", T::String), req("pattern", T::String)];

const COLOR_PARAMS: &[Param] = &[
    req("foreground", T::Integer),
    opt("background", T::Integer),
];
const MID_PARAMS: &[Param] = &[
    req("s", T::String),
    req("start", T::Integer),
    opt("length", T::Integer),
];
const REPLACE_PARAMS: &[Param] = &[
    req("s", T::String),
    req("find", T::String),
    req("replacement", T::String),
];
const LIST_SET_PARAMS: &[Param] = &[
    req("list", T::List),
    req("index", T::Integer),
    req("value", T::Any),
];
const DICT_SET_PARAMS: &[Param] = &[
    req("dict", T::Dictionary),
    req("key", T::Any),
    req("value", T::Any),
];
const REGEX_REPLACE_PARAMS: &[Param] = &[
    req("input", T::String),
    req("pattern", T::String),
    req("replacement", T::String),
];
const INIT_WINDOW_PARAMS: &[Param] = &[
    req("width", T::Integer),
    req("height", T::Integer),
    req("title", T::String),
];
const DRAW_TEXT_PARAMS: &[Param] = &[
    req("text", T::String),
    req("x", T::Integer),
    req("y", T::Integer),
    req("size", T::Integer),
    req("color", T::Integer),
];

/// Every known intrinsic.
pub(super) static CATALOG: [IntrinsicDescriptor; Intrinsic::COUNT] = [
    // IO
    entry!(Print, IO, &[req("value", T::Any)], Void),
    entry!(PrintLine, IO, &[opt("value", T::Any)], Void),
    entry!(Input, IO, &[opt("prompt", T::String)], String),
    entry!(ReadLine, IO, NONE, String),
    // ConsoleOps
    entry!(Cls, ConsoleOps, NONE, Void),
    entry!(Locate, ConsoleOps, &[req("row", T::Integer), req("column", T::Integer)], Void),
    entry!(Color, ConsoleOps, COLOR_PARAMS, Void),
    entry!(Beep, ConsoleOps, NONE, Void),
    entry!(InKey, ConsoleOps, NONE, String),
    // FileIO
    entry!(FileExists, FileIO, PATH, Boolean),
    entry!(ReadAllText, FileIO, PATH, String),
    entry!(WriteAllText, FileIO, PATH_TEXT, Void),
    entry!(AppendAllText, FileIO, PATH_TEXT, Void),
    entry!(DeleteFile, FileIO, PATH, Void),
    entry!(DirectoryExists, FileIO, PATH, Boolean),
    entry!(CreateDirectory, FileIO, PATH, Void),
    // String
    entry!(Len, String, STR, Integer),
    entry!(Left, String, STR_COUNT, String),
    entry!(Right, String, STR_COUNT, String),
    entry!(Mid, String, MID_PARAMS, String),
    entry!(InStr, String, &[req("s", T::String), req("find", T::String)], Integer),
    entry!(UCase, String, STR, String),
    entry!(LCase, String, STR, String),
    entry!(Trim, String, STR, String),
    entry!(LTrim, String, STR, String),
    entry!(RTrim, String, STR, String),
    entry!(Replace, String, REPLACE_PARAMS, String),
    entry!(Chr, String, &[req("code", T::Integer)], String),
    entry!(Asc, String, STR, Integer),
    entry!(Space, String, &[req("n", T::Integer)], String),
    entry!(StrReverse, String, STR, String),
    // Math
    entry!(Abs, Math, NUM, Double),
    entry!(Sqr, Math, NUM, Double),
    entry!(Sin, Math, NUM, Double),
    entry!(Cos, Math, NUM, Double),
    entry!(Tan, Math, NUM, Double),
    entry!(Atn, Math, NUM, Double),
    entry!(Log, Math, NUM, Double),
    entry!(Exp, Math, NUM, Double),
    entry!(Int, Math, NUM, Double),
    entry!(Fix, Math, NUM, Double),
    entry!(Sgn, Math, NUM, Integer),
    entry!(Round, Math, &[req("x", T::Double), opt("digits", T::Integer)], Double),
    entry!(Min, Math, NUM_PAIR, Double),
    entry!(Max, Math, NUM_PAIR, Double),
    entry!(Pow, Math, &[req("base", T::Double), req("exponent", T::Double)], Double),
    entry!(Rnd, Math, NONE, Double),
    entry!(Randomize, Math, &[opt("seed", T::Integer)], Void),
    // Conversion
    entry!(CInt, Conversion, NUM, Integer),
    entry!(CLng, Conversion, NUM, Long),
    entry!(CDbl, Conversion, &[req("x", T::Long)], Double),
    entry!(CStr, Conversion, &[req("value", T::Any)], String),
    entry!(CBool, Conversion, &[req("x", T::Long)], Boolean),
    entry!(Val, Conversion, STR, Double),
    entry!(Str, Conversion, NUM, String),
    entry!(Hex, Conversion, &[req("x", T::Long)], String),
    // ArrayOps
    entry!(UBound, ArrayOps, ARRAY_DIM, Integer),
    entry!(LBound, ArrayOps, ARRAY_DIM, Integer),
    entry!(ArraySort, ArrayOps, ARRAY, Void),
    entry!(ArrayReverse, ArrayOps, ARRAY, Void),
    // DateTime
    entry!(Now, DateTime, NONE, Date),
    entry!(Timer, DateTime, NONE, Double),
    entry!(Year, DateTime, DATE, Integer),
    entry!(Month, DateTime, DATE, Integer),
    entry!(Day, DateTime, DATE, Integer),
    // Collections
    entry!(CreateList, Collections, NONE, List),
    entry!(ListAdd, Collections, LIST_VALUE, Void),
    entry!(ListGet, Collections, LIST_INDEX, Any),
    entry!(ListSet, Collections, LIST_SET_PARAMS, Void),
    entry!(ListCount, Collections, LIST, Integer),
    entry!(ListRemoveAt, Collections, LIST_INDEX, Void),
    entry!(ListClear, Collections, LIST, Void),
    entry!(ListContains, Collections, LIST_VALUE, Boolean),
    entry!(CreateDictionary, Collections, NONE, Dictionary),
    entry!(DictSet, Collections, DICT_SET_PARAMS, Void),
    entry!(DictGet, Collections, DICT_KEY, Any),
    entry!(DictContainsKey, Collections, DICT_KEY, Boolean),
    entry!(DictRemove, Collections, DICT_KEY, Void),
    entry!(DictCount, Collections, DICT, Integer),
    entry!(CreateSet, Collections, NONE, Set),
    entry!(SetAdd, Collections, SET_VALUE, Void),
    entry!(SetContains, Collections, SET_VALUE, Boolean),
    entry!(SetCount, Collections, SET, Integer),
    // Networking
    entry!(HttpGet, Networking, &[req("url", T::String)], String),
    entry!(HttpPost, Networking, &[req("url", T::String), req("body", T::String)], String),
    entry!(TcpConnect, Networking, &[req("host", T::String), req("port", T::Integer)], Object),
    entry!(TcpSend, Networking, &[req("conn", T::Object), req("data", T::String)], Void),
    entry!(TcpReceive, Networking, CONN, String),
    entry!(TcpClose, Networking, CONN, Void),
    // Json
    entry!(JsonSerialize, Json, &[req("value", T::Any)], String),
    entry!(JsonDeserialize, Json, &[req("text", T::String)], Object),
    // Regex
    entry!(RegexMatch, Regex, PATTERN, Boolean),
    entry!(RegexReplace, Regex, REGEX_REPLACE_PARAMS, String),
    entry!(RegexFind, Regex, PATTERN, String),
    // EnvironmentOps
    entry!(GetEnv, EnvironmentOps, &[req("name", T::String)], String),
    entry!(SetEnv, EnvironmentOps, &[req("name", T::String), req("value", T::String)], Void),
    entry!(CommandLine, EnvironmentOps, NONE, String),
    // ProcessOps
    entry!(Shell, ProcessOps, &[req("command", T::String)], Integer),
    entry!(Sleep, ProcessOps, &[req("milliseconds", T::Integer)], Void),
    entry!(ExitProcess, ProcessOps, &[req("code", T::Integer)], Void),
    // Crypto
    entry!(Md5, Crypto, STR, String),
    entry!(Sha256, Crypto, STR, String),
    entry!(NewGuid, Crypto, NONE, String),
    // EngineBinding
    entry!(InitWindow, EngineBinding, INIT_WINDOW_PARAMS, Void),
    entry!(CloseWindow, EngineBinding, NONE, Void),
    entry!(WindowShouldClose, EngineBinding, NONE, Boolean),
    entry!(BeginDrawing, EngineBinding, NONE, Void),
    entry!(EndDrawing, EngineBinding, NONE, Void),
    entry!(ClearBackground, EngineBinding, &[req("color", T::Integer)], Void),
    entry!(DrawText, EngineBinding, DRAW_TEXT_PARAMS, Void),
];
