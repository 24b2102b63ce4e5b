//! Native backend: C++20 source.
//!
//! Arguments are C++ expressions. Universal values are `BasicValue`, a
//! `std::variant` alias declared in the unit preamble; collections are
//! `std::shared_ptr`s to standard containers of `BasicValue`, so copies of a
//! BASIC handle alias one container.
//!
//! Every argument expression appears exactly once in a fragment. Operations
//! that need an operand twice (`Right`, `StrReverse`, `Sgn`, list removal)
//! go through a synthesized helper that binds it to a parameter, as do the
//! string helpers the standard library lacks (case mapping, trimming,
//! replace-all). Helpers are emitted once per unit. Networking, JSON, regex,
//! process control, crypto, the random generator, `InKey` and
//! `CommandLine` have no native lowering.

use crate::intrinsics::Intrinsic;
use crate::lowering::rule::{unsupported, Emitter, Rule};
use crate::lowering::{Backend, CallSite, HelperRoutine, LoweringError, LoweringProvider};

const IOSTREAM: &[&str] = &["#include <iostream>"];
const IOSTREAM_STRING: &[&str] = &["#include <iostream>", "#include <string>"];
const FILESYSTEM: &[&str] = &["#include <filesystem>"];
const FSTREAM: &[&str] = &["#include <fstream>", "#include <sstream>", "#include <string>"];
const STRING: &[&str] = &["#include <string>"];
const STRING_ALGORITHM: &[&str] = &["#include <algorithm>", "#include <string>"];
const STRING_CASE: &[&str] = &["#include <algorithm>", "#include <cctype>", "#include <string>"];
const CMATH: &[&str] = &["#include <cmath>"];
const CSTDLIB: &[&str] = &["#include <cstdlib>", "#include <string>"];
const SSTREAM: &[&str] = &["#include <sstream>", "#include <string>"];
const ALGORITHM: &[&str] = &["#include <algorithm>"];
const CTIME: &[&str] = &["#include <ctime>"];
const VALUE_ALIAS: &str =
    "using BasicValue = std::variant<std::monostate, bool, long long, double, std::string>;";
const LIST: &[&str] = &[
    "#include <memory>",
    "#include <string>",
    "#include <variant>",
    "#include <vector>",
    VALUE_ALIAS,
];
const LIST_SEARCH: &[&str] = &[
    "#include <algorithm>",
    "#include <memory>",
    "#include <string>",
    "#include <variant>",
    "#include <vector>",
    VALUE_ALIAS,
];
const MAP: &[&str] = &[
    "#include <memory>",
    "#include <string>",
    "#include <unordered_map>",
    "#include <variant>",
    VALUE_ALIAS,
];
const SET: &[&str] = &[
    "#include <memory>",
    "#include <string>",
    "#include <unordered_set>",
    "#include <variant>",
    VALUE_ALIAS,
];

const INPUT: HelperRoutine = HelperRoutine {
    name: "bl_input",
    body: r#"static std::string bl_input(const std::string& prompt) {
    std::cout << prompt;
    std::string line;
    std::getline(std::cin, line);
    return line;
}"#,
};

const COLOR: HelperRoutine = HelperRoutine {
    name: "bl_color",
    body: r#"static void bl_color(int foreground, int background = -1) {
    static const int ansi[8] = {0, 4, 2, 6, 1, 5, 3, 7};
    std::cout << "\x1b[" << ((foreground & 8) ? 90 : 30) + ansi[foreground & 7] << "m";
    if (background >= 0) std::cout << "\x1b[" << 40 + ansi[background & 7] << "m";
}"#,
};

const READ_ALL_TEXT: HelperRoutine = HelperRoutine {
    name: "bl_read_all_text",
    body: r#"static std::string bl_read_all_text(const std::string& path) {
    std::ifstream in(path);
    std::stringstream buffer;
    buffer << in.rdbuf();
    return buffer.str();
}"#,
};

const WRITE_TEXT: HelperRoutine = HelperRoutine {
    name: "bl_write_text",
    body: r#"static void bl_write_text(const std::string& path, const std::string& text, bool append) {
    std::ofstream out(path, append ? std::ios::app : std::ios::trunc);
    out << text;
}"#,
};

const UCASE: HelperRoutine = HelperRoutine {
    name: "bl_ucase",
    body: r#"static std::string bl_ucase(std::string s) {
    std::transform(s.begin(), s.end(), s.begin(),
                   [](unsigned char c) { return static_cast<char>(std::toupper(c)); });
    return s;
}"#,
};

const LCASE: HelperRoutine = HelperRoutine {
    name: "bl_lcase",
    body: r#"static std::string bl_lcase(std::string s) {
    std::transform(s.begin(), s.end(), s.begin(),
                   [](unsigned char c) { return static_cast<char>(std::tolower(c)); });
    return s;
}"#,
};

const TRIM: HelperRoutine = HelperRoutine {
    name: "bl_trim",
    body: r#"static std::string bl_trim(const std::string& s) {
    const auto first = s.find_first_not_of(" \t\r\n");
    if (first == std::string::npos) return "";
    const auto last = s.find_last_not_of(" \t\r\n");
    return s.substr(first, last - first + 1);
}"#,
};

const LTRIM: HelperRoutine = HelperRoutine {
    name: "bl_ltrim",
    body: r#"static std::string bl_ltrim(const std::string& s) {
    const auto first = s.find_first_not_of(" \t\r\n");
    return first == std::string::npos ? "" : s.substr(first);
}"#,
};

const RTRIM: HelperRoutine = HelperRoutine {
    name: "bl_rtrim",
    body: r#"static std::string bl_rtrim(const std::string& s) {
    const auto last = s.find_last_not_of(" \t\r\n");
    return last == std::string::npos ? "" : s.substr(0, last + 1);
}"#,
};

const REPLACE: HelperRoutine = HelperRoutine {
    name: "bl_replace",
    body: r#"static std::string bl_replace(std::string s, const std::string& find, const std::string& replacement) {
    if (find.empty()) return s;
    for (auto pos = s.find(find); pos != std::string::npos; pos = s.find(find, pos + replacement.size())) {
        s.replace(pos, find.size(), replacement);
    }
    return s;
}"#,
};

const RIGHT: HelperRoutine = HelperRoutine {
    name: "bl_right",
    body: r#"static std::string bl_right(const std::string& s, long long n) {
    const auto count = std::min<std::size_t>(static_cast<std::size_t>(std::max(0LL, n)), s.size());
    return s.substr(s.size() - count);
}"#,
};

const STRREVERSE: HelperRoutine = HelperRoutine {
    name: "bl_strreverse",
    body: r#"static std::string bl_strreverse(std::string s) {
    std::reverse(s.begin(), s.end());
    return s;
}"#,
};

const SGN: HelperRoutine = HelperRoutine {
    name: "bl_sgn",
    body: r#"template <typename T>
static int bl_sgn(const T& value) {
    return (T(0) < value) - (value < T(0));
}"#,
};

const ROUND: HelperRoutine = HelperRoutine {
    name: "bl_round",
    body: r#"static double bl_round(double value, int digits) {
    const double scale = std::pow(10.0, digits);
    return std::round(value * scale) / scale;
}"#,
};

const LIST_REMOVE_AT: HelperRoutine = HelperRoutine {
    name: "bl_list_remove_at",
    body: r#"static void bl_list_remove_at(std::vector<BasicValue>& xs, long long index) {
    xs.erase(xs.begin() + index);
}"#,
};

const CSTR: HelperRoutine = HelperRoutine {
    name: "bl_cstr",
    body: r#"template <typename T>
static std::string bl_cstr(const T& value) {
    std::ostringstream out;
    out.precision(15);
    out << value;
    return out.str();
}"#,
};

const STR: HelperRoutine = HelperRoutine {
    name: "bl_str",
    body: r#"static std::string bl_str(double value) {
    std::ostringstream out;
    out.precision(15);
    out << value;
    return out.str();
}"#,
};

const HEX: HelperRoutine = HelperRoutine {
    name: "bl_hex",
    body: r#"static std::string bl_hex(long long value) {
    std::ostringstream out;
    out << std::uppercase << std::hex << value;
    return out.str();
}"#,
};

const TIMER: HelperRoutine = HelperRoutine {
    name: "bl_timer",
    body: r#"static double bl_timer() {
    const std::time_t now = std::time(nullptr);
    const std::tm local = *std::localtime(&now);
    return local.tm_hour * 3600.0 + local.tm_min * 60.0 + local.tm_sec;
}"#,
};

const DATE_PARTS: HelperRoutine = HelperRoutine {
    name: "bl_date_parts",
    body: r#"static std::tm bl_local(std::time_t t) { return *std::localtime(&t); }
static int bl_year(std::time_t t) { return bl_local(t).tm_year + 1900; }
static int bl_month(std::time_t t) { return bl_local(t).tm_mon + 1; }
static int bl_day(std::time_t t) { return bl_local(t).tm_mday; }"#,
};

const GETENV: HelperRoutine = HelperRoutine {
    name: "bl_getenv",
    body: r#"static std::string bl_getenv(const std::string& name) {
    const char* value = std::getenv(name.c_str());
    return value ? std::string(value) : std::string();
}"#,
};

const SETENV: HelperRoutine = HelperRoutine {
    name: "bl_setenv",
    body: r#"static void bl_setenv(const std::string& name, const std::string& value) {
#ifdef _WIN32
    _putenv_s(name.c_str(), value.c_str());
#else
    setenv(name.c_str(), value.c_str(), 1);
#endif
}"#,
};

/// Lowers intrinsics to C++20 expressions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeProvider;

impl NativeProvider {
    fn rule(intrinsic: Intrinsic) -> Option<Rule> {
        use Intrinsic::*;

        let rule = match intrinsic {
            // IO
            Print => Rule::template("std::cout << {0}").declares(IOSTREAM),
            PrintLine => Rule::build(print_line).declares(IOSTREAM),
            Input => Rule::build(input).declares(IOSTREAM_STRING).with_helper(INPUT),
            ReadLine => Rule::template(r#"bl_input("")"#)
                .declares(IOSTREAM_STRING)
                .with_helper(INPUT),

            // ConsoleOps
            Cls => Rule::template(r#"std::cout << "\x1b[2J\x1b[H""#).declares(IOSTREAM),
            Locate => Rule::template(r#"std::cout << "\x1b[" << {0} << ";" << {1} << "H""#)
                .declares(IOSTREAM),
            Color => Rule::build(color).declares(IOSTREAM).with_helper(COLOR),
            Beep => Rule::template(r"std::cout << '\a'").declares(IOSTREAM),
            InKey => return None,

            // FileIO
            FileExists => Rule::template("std::filesystem::is_regular_file({0})").declares(FILESYSTEM),
            ReadAllText => Rule::template("bl_read_all_text({0})")
                .declares(FSTREAM)
                .with_helper(READ_ALL_TEXT),
            WriteAllText => Rule::template("bl_write_text({0}, {1}, false)")
                .declares(FSTREAM)
                .with_helper(WRITE_TEXT),
            AppendAllText => Rule::template("bl_write_text({0}, {1}, true)")
                .declares(FSTREAM)
                .with_helper(WRITE_TEXT),
            DeleteFile => Rule::template("std::filesystem::remove({0})").declares(FILESYSTEM),
            DirectoryExists => Rule::template("std::filesystem::is_directory({0})").declares(FILESYSTEM),
            CreateDirectory => {
                Rule::template("std::filesystem::create_directories({0})").declares(FILESYSTEM)
            }

            // String
            Len => Rule::template("static_cast<int>({0}.size())").declares(STRING),
            Left => Rule::template("{0}.substr(0, {1})").declares(STRING),
            Right => Rule::template("bl_right({0}, {1})")
                .declares(STRING_ALGORITHM)
                .with_helper(RIGHT),
            Mid => Rule::build(mid).declares(STRING),
            InStr => Rule::template("static_cast<int>({0}.find({1}) + 1)").declares(STRING),
            UCase => Rule::template("bl_ucase({0})").declares(STRING_CASE).with_helper(UCASE),
            LCase => Rule::template("bl_lcase({0})").declares(STRING_CASE).with_helper(LCASE),
            Trim => Rule::template("bl_trim({0})").declares(STRING).with_helper(TRIM),
            LTrim => Rule::template("bl_ltrim({0})").declares(STRING).with_helper(LTRIM),
            RTrim => Rule::template("bl_rtrim({0})").declares(STRING).with_helper(RTRIM),
            Replace => Rule::template("bl_replace({0}, {1}, {2})").declares(STRING).with_helper(REPLACE),
            Chr => Rule::template("std::string(1, static_cast<char>({0}))").declares(STRING),
            Asc => Rule::template("static_cast<int>(static_cast<unsigned char>({0}[0]))").declares(STRING),
            Space => Rule::template("std::string({0}, ' ')").declares(STRING),
            StrReverse => Rule::template("bl_strreverse({0})")
                .declares(STRING_ALGORITHM)
                .with_helper(STRREVERSE),

            // Math
            Abs => Rule::template("std::fabs({0})").declares(CMATH),
            Sqr => Rule::template("std::sqrt({0})").declares(CMATH),
            Sin => Rule::template("std::sin({0})").declares(CMATH),
            Cos => Rule::template("std::cos({0})").declares(CMATH),
            Tan => Rule::template("std::tan({0})").declares(CMATH),
            Atn => Rule::template("std::atan({0})").declares(CMATH),
            Log => Rule::template("std::log({0})").declares(CMATH),
            Exp => Rule::template("std::exp({0})").declares(CMATH),
            Int => Rule::template("std::floor({0})").declares(CMATH),
            Fix => Rule::template("std::trunc({0})").declares(CMATH),
            Sgn => Rule::template("bl_sgn({0})").with_helper(SGN),
            Round => Rule::build(round).declares(CMATH).with_helper(ROUND),
            Min => Rule::template("std::fmin({0}, {1})").declares(CMATH),
            Max => Rule::template("std::fmax({0}, {1})").declares(CMATH),
            Pow => Rule::template("std::pow({0}, {1})").declares(CMATH),
            Rnd | Randomize => return None,

            // Conversion
            CInt => Rule::template("static_cast<int>({0})"),
            CLng => Rule::template("static_cast<long long>({0})"),
            CDbl => Rule::template("static_cast<double>({0})"),
            CStr => Rule::template("bl_cstr({0})").declares(SSTREAM).with_helper(CSTR),
            CBool => Rule::template("(({0}) != 0)"),
            Val => Rule::template("std::strtod({0}.c_str(), nullptr)").declares(CSTDLIB),
            Str => Rule::template("bl_str({0})").declares(SSTREAM).with_helper(STR),
            Hex => Rule::template("bl_hex({0})").declares(SSTREAM).with_helper(HEX),

            // ArrayOps; arrays are single-dimension vectors, the dimension
            // argument is accepted and ignored.
            UBound => Rule::template("(static_cast<int>({0}.size()) - 1)"),
            LBound => Rule::template("0"),
            ArraySort => Rule::template("std::ranges::sort({0})").declares(ALGORITHM),
            ArrayReverse => Rule::template("std::ranges::reverse({0})").declares(ALGORITHM),

            // DateTime
            Now => Rule::template("std::time(nullptr)").declares(CTIME),
            Timer => Rule::template("bl_timer()").declares(CTIME).with_helper(TIMER),
            Year => Rule::template("bl_year({0})").declares(CTIME).with_helper(DATE_PARTS),
            Month => Rule::template("bl_month({0})").declares(CTIME).with_helper(DATE_PARTS),
            Day => Rule::template("bl_day({0})").declares(CTIME).with_helper(DATE_PARTS),

            // Collections
            CreateList => Rule::template("std::make_shared<std::vector<BasicValue>>()").declares(LIST),
            ListAdd => Rule::template("{0}->push_back(BasicValue({1}))").declares(LIST),
            ListGet => Rule::template("{0}->at({1})").declares(LIST),
            ListSet => Rule::template("{0}->at({1}) = BasicValue({2})").declares(LIST),
            ListCount => Rule::template("static_cast<int>({0}->size())").declares(LIST),
            ListRemoveAt => Rule::template("bl_list_remove_at(*{0}, {1})")
                .declares(LIST)
                .with_helper(LIST_REMOVE_AT),
            ListClear => Rule::template("{0}->clear()").declares(LIST),
            ListContains => Rule::template("(std::ranges::count(*{0}, BasicValue({1})) != 0)")
                .declares(LIST_SEARCH),
            CreateDictionary => Rule::template(
                "std::make_shared<std::unordered_map<BasicValue, BasicValue>>()",
            )
            .declares(MAP),
            DictSet => Rule::template("(*{0})[BasicValue({1})] = BasicValue({2})").declares(MAP),
            DictGet => Rule::template("{0}->at(BasicValue({1}))").declares(MAP),
            DictContainsKey => Rule::template("({0}->count(BasicValue({1})) != 0)").declares(MAP),
            DictRemove => Rule::template("{0}->erase(BasicValue({1}))").declares(MAP),
            DictCount => Rule::template("static_cast<int>({0}->size())").declares(MAP),
            CreateSet => Rule::template("std::make_shared<std::unordered_set<BasicValue>>()").declares(SET),
            SetAdd => Rule::template("{0}->insert(BasicValue({1}))").declares(SET),
            SetContains => Rule::template("({0}->count(BasicValue({1})) != 0)").declares(SET),
            SetCount => Rule::template("static_cast<int>({0}->size())").declares(SET),

            // EnvironmentOps
            GetEnv => Rule::template("bl_getenv({0})").declares(CSTDLIB).with_helper(GETENV),
            SetEnv => Rule::template("bl_setenv({0}, {1})").declares(CSTDLIB).with_helper(SETENV),
            CommandLine => return None,

            HttpGet | HttpPost | TcpConnect | TcpSend | TcpReceive | TcpClose => return None,
            JsonSerialize | JsonDeserialize => return None,
            RegexMatch | RegexReplace | RegexFind => return None,
            Shell | Sleep | ExitProcess => return None,
            Md5 | Sha256 | NewGuid => return None,
            InitWindow | CloseWindow | WindowShouldClose | BeginDrawing | EndDrawing
            | ClearBackground | DrawText => return None,
        };
        Some(rule)
    }
}

fn print_line(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let text = match e.optional(0) {
        Some(value) => format!("std::cout << {} << std::endl", value),
        None => "std::cout << std::endl".to_string(),
    };
    e.line(text);
    Ok(())
}

fn input(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let prompt = e.optional(0).unwrap_or(r#""? ""#);
    e.line(format!("bl_input({})", prompt));
    Ok(())
}

fn color(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let foreground = e.arg(0)?;
    let text = match e.optional(1) {
        Some(background) => format!("bl_color({}, {})", foreground, background),
        None => format!("bl_color({})", foreground),
    };
    e.line(text);
    Ok(())
}

/// `std::string::substr` clamps the count, so only the start needs adjusting.
fn mid(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let text = if e.optional(2).is_some() {
        e.expand("{0}.substr({1} - 1, {2})")?
    } else {
        e.expand("{0}.substr({1} - 1)")?
    };
    e.line(text);
    Ok(())
}

fn round(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let text = if e.optional(1).is_some() {
        e.expand("bl_round({0}, {1})")?
    } else {
        e.expand("std::round({0})")?
    };
    e.line(text);
    Ok(())
}

impl LoweringProvider for NativeProvider {
    fn name(&self) -> &str {
        "native"
    }

    fn backend(&self) -> Backend {
        Backend::Native
    }

    fn handles(&self, intrinsic: Intrinsic) -> bool {
        Self::rule(intrinsic).is_some()
    }

    fn emit(&self, intrinsic: Intrinsic, call: &CallSite<'_>) -> Result<String, LoweringError> {
        Self::rule(intrinsic)
            .ok_or_else(|| unsupported(intrinsic, Backend::Native))?
            .emit(intrinsic, call)
    }

    fn required_declarations(&self, intrinsic: Intrinsic) -> Vec<String> {
        Self::rule(intrinsic)
            .map(|rule| rule.declarations())
            .unwrap_or_default()
    }

    fn helper_definition(&self, intrinsic: Intrinsic) -> Option<HelperRoutine> {
        Self::rule(intrinsic).and_then(|rule| rule.helper())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(intrinsic: Intrinsic, args: &[&str]) -> String {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        NativeProvider.emit(intrinsic, &CallSite::new(&args)).unwrap()
    }

    #[test]
    fn test_mid_uses_zero_based_start() {
        assert_eq!(emit(Intrinsic::Mid, &["s", "3", "4"]), "s.substr(3 - 1, 4)");
        assert_eq!(emit(Intrinsic::Mid, &["s", "3"]), "s.substr(3 - 1)");
    }

    #[test]
    fn test_networking_absent() {
        assert!(!NativeProvider.handles(Intrinsic::TcpConnect));
        assert!(!NativeProvider.handles(Intrinsic::Rnd));
        assert!(NativeProvider.helper_definition(Intrinsic::TcpConnect).is_none());
        assert!(NativeProvider.required_declarations(Intrinsic::TcpConnect).is_empty());
    }

    #[test]
    fn test_case_mapping_uses_helper() {
        assert_eq!(emit(Intrinsic::UCase, &["s"]), "bl_ucase(s)");
        let helper = NativeProvider.helper_definition(Intrinsic::UCase).unwrap();
        assert_eq!(helper.name, "bl_ucase");
        assert!(helper.body.contains("std::toupper"));
    }

    #[test]
    fn test_file_writers_share_helper() {
        assert_eq!(
            NativeProvider.helper_definition(Intrinsic::WriteAllText),
            NativeProvider.helper_definition(Intrinsic::AppendAllText)
        );
        assert_eq!(emit(Intrinsic::AppendAllText, &["p", "t"]), "bl_write_text(p, t, true)");
    }

    #[test]
    fn test_collections_declare_value_alias_after_includes() {
        let decls = NativeProvider.required_declarations(Intrinsic::CreateList);
        let alias = decls.iter().position(|d| d.starts_with("using BasicValue")).unwrap();
        let variant = decls.iter().position(|d| d == "#include <variant>").unwrap();
        assert!(variant < alias);
        assert_eq!(
            emit(Intrinsic::ListAdd, &["xs", "1"]),
            "xs->push_back(BasicValue(1))"
        );
    }

    #[test]
    fn test_operands_needed_twice_are_bound_by_helpers() {
        assert_eq!(emit(Intrinsic::StrReverse, &["bl_ucase(s)"]), "bl_strreverse(bl_ucase(s))");
        assert_eq!(emit(Intrinsic::Right, &["next()", "3"]), "bl_right(next(), 3)");
        assert_eq!(emit(Intrinsic::Sgn, &["f(x)"]), "bl_sgn(f(x))");
        assert_eq!(emit(Intrinsic::Round, &["x", "d()"]), "bl_round(x, d())");
        assert_eq!(emit(Intrinsic::ArraySort, &["make()"]), "std::ranges::sort(make())");
        assert_eq!(
            emit(Intrinsic::ListRemoveAt, &["make()", "0"]),
            "bl_list_remove_at(*make(), 0)"
        );
        assert_eq!(
            emit(Intrinsic::ListContains, &["make()", "1"]),
            "(std::ranges::count(*make(), BasicValue(1)) != 0)"
        );
        let helper = NativeProvider.helper_definition(Intrinsic::StrReverse).unwrap();
        assert!(helper.body.contains("std::reverse"));
    }

    #[test]
    fn test_asc_of_empty_string_reads_terminator() {
        assert_eq!(
            emit(Intrinsic::Asc, &["s"]),
            "static_cast<int>(static_cast<unsigned char>(s[0]))"
        );
    }

    #[test]
    fn test_cint_truncates_with_cast() {
        assert_eq!(emit(Intrinsic::CInt, &["x"]), "static_cast<int>(x)");
    }
}
