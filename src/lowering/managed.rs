//! Managed backend: C# source.
//!
//! Most intrinsics map onto a BCL call. Arguments are C# expressions, and
//! `Any` arguments rely on implicit boxing to `object`. Emitted fragments
//! are expressions; the driver adds statement terminators.
//!
//! # Helpers
//!
//! Operations with no single BCL equivalent, and those that would need an
//! argument expression more than once, are lowered to calls of static
//! members the driver injects into the program class:
//!
//! | Helper            | Used by                    |
//! |-------------------|----------------------------|
//! | `__blLeft`        | Left                       |
//! | `__blRight`       | Right                      |
//! | `__blMid`         | Mid with a length          |
//! | `__blAsc`         | Asc                        |
//! | `__blInput`       | Input                      |
//! | `__blInKey`       | InKey                      |
//! | `__blColor`       | Color                      |
//! | `__blRandom`      | Rnd, Randomize (shared)    |
//! | `__blVal`         | Val                        |
//! | `__blHttp`        | HttpGet, HttpPost (shared) |
//! | `__blTcpSend`     | TcpSend                    |
//! | `__blTcpReceive`  | TcpReceive                 |
//! | `__blShell`       | Shell                      |
//!
//! Engine bindings are not handled here; see
//! [`EngineBindingProvider`](super::EngineBindingProvider).

use crate::intrinsics::Intrinsic;
use crate::lowering::rule::{unsupported, Emitter, Rule};
use crate::lowering::{Backend, CallSite, HelperRoutine, LoweringError, LoweringProvider};

const SYSTEM: &[&str] = &["using System;"];
const IO: &[&str] = &["using System;", "using System.IO;"];
const LINQ: &[&str] = &["using System;", "using System.Linq;"];
const GLOBALIZATION: &[&str] = &["using System;", "using System.Globalization;"];
const VAL: &[&str] = &[
    "using System;",
    "using System.Globalization;",
    "using System.Text.RegularExpressions;",
];
const COLLECTIONS: &[&str] = &["using System;", "using System.Collections.Generic;"];
const HTTP: &[&str] = &["using System;", "using System.Net.Http;"];
const SOCKETS: &[&str] = &["using System;", "using System.Net.Sockets;"];
const SOCKET_TEXT: &[&str] = &["using System;", "using System.Net.Sockets;", "using System.Text;"];
const JSON: &[&str] = &["using System;", "using System.Text.Json;"];
const REGEX: &[&str] = &["using System;", "using System.Text.RegularExpressions;"];
const PROCESS: &[&str] = &["using System;", "using System.Diagnostics;"];
const THREADING: &[&str] = &["using System;", "using System.Threading;"];
const CRYPTO: &[&str] = &[
    "using System;",
    "using System.Security.Cryptography;",
    "using System.Text;",
];

const LEFT: HelperRoutine = HelperRoutine {
    name: "__blLeft",
    body: r#"static string __blLeft(string s, int n)
{
    return s.Substring(0, Math.Min(n, s.Length));
}"#,
};

const RIGHT: HelperRoutine = HelperRoutine {
    name: "__blRight",
    body: r#"static string __blRight(string s, int n)
{
    return s.Substring(s.Length - Math.Min(n, s.Length));
}"#,
};

/// Takes a 0-based start; the call site does the BASIC adjustment.
const MID: HelperRoutine = HelperRoutine {
    name: "__blMid",
    body: r#"static string __blMid(string s, int start, int length)
{
    return s.Substring(start, Math.Min(length, s.Length - start));
}"#,
};

const ASC: HelperRoutine = HelperRoutine {
    name: "__blAsc",
    body: r#"static int __blAsc(string s)
{
    return s.Length > 0 ? s[0] : 0;
}"#,
};

const INPUT: HelperRoutine = HelperRoutine {
    name: "__blInput",
    body: r#"static string __blInput(string prompt)
{
    Console.Write(prompt);
    return Console.ReadLine() ?? "";
}"#,
};

const INKEY: HelperRoutine = HelperRoutine {
    name: "__blInKey",
    body: r#"static string __blInKey()
{
    if (!Console.KeyAvailable) return "";
    return Console.ReadKey(true).KeyChar.ToString();
}"#,
};

const COLOR: HelperRoutine = HelperRoutine {
    name: "__blColor",
    body: r#"static void __blColor(int foreground, int background = -1)
{
    Console.ForegroundColor = (ConsoleColor)(foreground & 15);
    if (background >= 0) Console.BackgroundColor = (ConsoleColor)(background & 15);
}"#,
};

const RANDOM: HelperRoutine = HelperRoutine {
    name: "__blRandom",
    body: "static Random __blRandom = new Random();",
};

const VAL_HELPER: HelperRoutine = HelperRoutine {
    name: "__blVal",
    body: r#"static double __blVal(string s)
{
    var m = Regex.Match(s.TrimStart(), @"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?");
    return m.Success ? double.Parse(m.Value, CultureInfo.InvariantCulture) : 0.0;
}"#,
};

const HTTP_CLIENT: HelperRoutine = HelperRoutine {
    name: "__blHttp",
    body: "static readonly HttpClient __blHttp = new HttpClient();",
};

const TCP_SEND: HelperRoutine = HelperRoutine {
    name: "__blTcpSend",
    body: r#"static void __blTcpSend(TcpClient client, string data)
{
    var bytes = Encoding.UTF8.GetBytes(data);
    client.GetStream().Write(bytes, 0, bytes.Length);
}"#,
};

const TCP_RECEIVE: HelperRoutine = HelperRoutine {
    name: "__blTcpReceive",
    body: r#"static string __blTcpReceive(TcpClient client)
{
    var buffer = new byte[4096];
    int read = client.GetStream().Read(buffer, 0, buffer.Length);
    return Encoding.UTF8.GetString(buffer, 0, read);
}"#,
};

const SHELL: HelperRoutine = HelperRoutine {
    name: "__blShell",
    body: r#"static int __blShell(string command)
{
    var info = OperatingSystem.IsWindows()
        ? new ProcessStartInfo("cmd.exe", "/c " + command)
        : new ProcessStartInfo("/bin/sh", new[] { "-c", command });
    info.UseShellExecute = false;
    using var process = Process.Start(info);
    if (process == null) return -1;
    process.WaitForExit();
    return process.ExitCode;
}"#,
};

/// Lowers intrinsics to C# expressions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManagedProvider;

impl ManagedProvider {
    fn rule(intrinsic: Intrinsic) -> Option<Rule> {
        use Intrinsic::*;

        let rule = match intrinsic {
            // IO
            Print => Rule::template("Console.Write({0})").declares(SYSTEM),
            PrintLine => Rule::build(print_line).declares(SYSTEM),
            Input => Rule::build(input).declares(SYSTEM).with_helper(INPUT),
            ReadLine => Rule::template(r#"(Console.ReadLine() ?? "")"#).declares(SYSTEM),

            // ConsoleOps
            Cls => Rule::template("Console.Clear()").declares(SYSTEM),
            Locate => Rule::template("Console.SetCursorPosition({1} - 1, {0} - 1)").declares(SYSTEM),
            Color => Rule::build(color).declares(SYSTEM).with_helper(COLOR),
            Beep => Rule::template("Console.Beep()").declares(SYSTEM),
            InKey => Rule::template("__blInKey()").declares(SYSTEM).with_helper(INKEY),

            // FileIO
            FileExists => Rule::template("File.Exists({0})").declares(IO),
            ReadAllText => Rule::template("File.ReadAllText({0})").declares(IO),
            WriteAllText => Rule::template("File.WriteAllText({0}, {1})").declares(IO),
            AppendAllText => Rule::template("File.AppendAllText({0}, {1})").declares(IO),
            DeleteFile => Rule::template("File.Delete({0})").declares(IO),
            DirectoryExists => Rule::template("Directory.Exists({0})").declares(IO),
            CreateDirectory => Rule::template("Directory.CreateDirectory({0})").declares(IO),

            // String
            Len => Rule::template("{0}.Length"),
            Left => Rule::template("__blLeft({0}, {1})").declares(SYSTEM).with_helper(LEFT),
            Right => Rule::template("__blRight({0}, {1})").declares(SYSTEM).with_helper(RIGHT),
            Mid => Rule::build(mid).declares(SYSTEM).with_helper(MID),
            InStr => Rule::template("({0}.IndexOf({1}, StringComparison.Ordinal) + 1)")
                .declares(SYSTEM),
            UCase => Rule::template("{0}.ToUpperInvariant()"),
            LCase => Rule::template("{0}.ToLowerInvariant()"),
            Trim => Rule::template("{0}.Trim()"),
            LTrim => Rule::template("{0}.TrimStart()"),
            RTrim => Rule::template("{0}.TrimEnd()"),
            Replace => Rule::template("{0}.Replace({1}, {2})"),
            Chr => Rule::template("((char)({0})).ToString()"),
            Asc => Rule::template("__blAsc({0})").with_helper(ASC),
            Space => Rule::template("new string(' ', {0})"),
            StrReverse => Rule::template("new string({0}.Reverse().ToArray())").declares(LINQ),

            // Math
            Abs => Rule::template("Math.Abs({0})").declares(SYSTEM),
            Sqr => Rule::template("Math.Sqrt({0})").declares(SYSTEM),
            Sin => Rule::template("Math.Sin({0})").declares(SYSTEM),
            Cos => Rule::template("Math.Cos({0})").declares(SYSTEM),
            Tan => Rule::template("Math.Tan({0})").declares(SYSTEM),
            Atn => Rule::template("Math.Atan({0})").declares(SYSTEM),
            Log => Rule::template("Math.Log({0})").declares(SYSTEM),
            Exp => Rule::template("Math.Exp({0})").declares(SYSTEM),
            Int => Rule::template("Math.Floor({0})").declares(SYSTEM),
            Fix => Rule::template("Math.Truncate({0})").declares(SYSTEM),
            Sgn => Rule::template("Math.Sign({0})").declares(SYSTEM),
            Round => Rule::build(round).declares(SYSTEM),
            Min => Rule::template("Math.Min({0}, {1})").declares(SYSTEM),
            Max => Rule::template("Math.Max({0}, {1})").declares(SYSTEM),
            Pow => Rule::template("Math.Pow({0}, {1})").declares(SYSTEM),
            Rnd => Rule::template("__blRandom.NextDouble()").declares(SYSTEM).with_helper(RANDOM),
            Randomize => Rule::build(randomize).declares(SYSTEM).with_helper(RANDOM),

            // Conversion
            CInt => Rule::template("((int)({0}))"),
            CLng => Rule::template("((long)({0}))"),
            CDbl => Rule::template("((double)({0}))"),
            CStr => Rule::template("Convert.ToString({0}, CultureInfo.InvariantCulture)")
                .declares(GLOBALIZATION),
            CBool => Rule::template("({0} != 0)"),
            Val => Rule::template("__blVal({0})").declares(VAL).with_helper(VAL_HELPER),
            Str => Rule::template(r#"({0}).ToString("G15", CultureInfo.InvariantCulture)"#)
                .declares(GLOBALIZATION),
            Hex => Rule::template("Convert.ToString((long)({0}), 16).ToUpperInvariant()")
                .declares(SYSTEM),

            // ArrayOps
            UBound => Rule::build(ubound),
            LBound => Rule::build(lbound),
            ArraySort => Rule::template("Array.Sort({0})").declares(SYSTEM),
            ArrayReverse => Rule::template("Array.Reverse({0})").declares(SYSTEM),

            // DateTime
            Now => Rule::template("DateTime.Now").declares(SYSTEM),
            Timer => Rule::template("DateTime.Now.TimeOfDay.TotalSeconds").declares(SYSTEM),
            Year => Rule::template("{0}.Year"),
            Month => Rule::template("{0}.Month"),
            Day => Rule::template("{0}.Day"),

            // Collections
            CreateList => Rule::template("new List<object>()").declares(COLLECTIONS),
            ListAdd => Rule::template("{0}.Add({1})"),
            ListGet => Rule::template("{0}[{1}]"),
            ListSet => Rule::template("{0}[{1}] = {2}"),
            ListCount => Rule::template("{0}.Count"),
            ListRemoveAt => Rule::template("{0}.RemoveAt({1})"),
            ListClear => Rule::template("{0}.Clear()"),
            ListContains => Rule::template("{0}.Contains({1})"),
            CreateDictionary => {
                Rule::template("new Dictionary<object, object>()").declares(COLLECTIONS)
            }
            DictSet => Rule::template("{0}[{1}] = {2}"),
            DictGet => Rule::template("{0}[{1}]"),
            DictContainsKey => Rule::template("{0}.ContainsKey({1})"),
            DictRemove => Rule::template("{0}.Remove({1})"),
            DictCount => Rule::template("{0}.Count"),
            CreateSet => Rule::template("new HashSet<object>()").declares(COLLECTIONS),
            SetAdd => Rule::template("{0}.Add({1})"),
            SetContains => Rule::template("{0}.Contains({1})"),
            SetCount => Rule::template("{0}.Count"),

            // Networking
            HttpGet => Rule::template("__blHttp.GetStringAsync({0}).GetAwaiter().GetResult()")
                .declares(HTTP)
                .with_helper(HTTP_CLIENT),
            HttpPost => Rule::template(
                "__blHttp.PostAsync({0}, new StringContent({1})).GetAwaiter().GetResult()\
                 .Content.ReadAsStringAsync().GetAwaiter().GetResult()",
            )
            .declares(HTTP)
            .with_helper(HTTP_CLIENT),
            TcpConnect => Rule::template("new TcpClient({0}, {1})").declares(SOCKETS),
            TcpSend => Rule::template("__blTcpSend((TcpClient)({0}), {1})")
                .declares(SOCKET_TEXT)
                .with_helper(TCP_SEND),
            TcpReceive => Rule::template("__blTcpReceive((TcpClient)({0}))")
                .declares(SOCKET_TEXT)
                .with_helper(TCP_RECEIVE),
            TcpClose => Rule::template("((TcpClient)({0})).Close()").declares(SOCKETS),

            // Json
            JsonSerialize => Rule::template("JsonSerializer.Serialize({0})").declares(JSON),
            JsonDeserialize => Rule::template("JsonDocument.Parse({0}).RootElement").declares(JSON),

            // Regex
            RegexMatch => Rule::template("Regex.IsMatch({0}, {1})").declares(REGEX),
            RegexReplace => Rule::template("Regex.Replace({0}, {1}, {2})").declares(REGEX),
            RegexFind => Rule::template("Regex.Match({0}, {1}).Value").declares(REGEX),

            // EnvironmentOps
            GetEnv => Rule::template(r#"(Environment.GetEnvironmentVariable({0}) ?? "")"#)
                .declares(SYSTEM),
            SetEnv => Rule::template("Environment.SetEnvironmentVariable({0}, {1})").declares(SYSTEM),
            CommandLine => Rule::template("Environment.CommandLine").declares(SYSTEM),

            // ProcessOps
            Shell => Rule::template("__blShell({0})").declares(PROCESS).with_helper(SHELL),
            Sleep => Rule::template("Thread.Sleep({0})").declares(THREADING),
            ExitProcess => Rule::template("Environment.Exit({0})").declares(SYSTEM),

            // Crypto
            Md5 => Rule::template(
                "Convert.ToHexString(MD5.HashData(Encoding.UTF8.GetBytes({0}))).ToLowerInvariant()",
            )
            .declares(CRYPTO),
            Sha256 => Rule::template(
                "Convert.ToHexString(SHA256.HashData(Encoding.UTF8.GetBytes({0}))).ToLowerInvariant()",
            )
            .declares(CRYPTO),
            NewGuid => Rule::template("Guid.NewGuid().ToString()").declares(SYSTEM),

            // EngineBinding
            InitWindow | CloseWindow | WindowShouldClose | BeginDrawing | EndDrawing
            | ClearBackground | DrawText => return None,
        };
        Some(rule)
    }
}

fn print_line(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let text = match e.optional(0) {
        Some(value) => format!("Console.WriteLine({})", value),
        None => "Console.WriteLine()".to_string(),
    };
    e.line(text);
    Ok(())
}

fn input(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let prompt = e.optional(0).unwrap_or(r#""? ""#);
    e.line(format!("__blInput({})", prompt));
    Ok(())
}

fn color(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let foreground = e.arg(0)?;
    let text = match e.optional(1) {
        Some(background) => format!("__blColor({}, {})", foreground, background),
        None => format!("__blColor({})", foreground),
    };
    e.line(text);
    Ok(())
}

fn mid(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let text = if e.optional(2).is_some() {
        e.expand("__blMid({0}, {1} - 1, {2})")?
    } else {
        e.expand("{0}.Substring({1} - 1)")?
    };
    e.line(text);
    Ok(())
}

fn round(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let text = if e.optional(1).is_some() {
        e.expand("Math.Round({0}, {1}, MidpointRounding.AwayFromZero)")?
    } else {
        e.expand("Math.Round({0}, MidpointRounding.AwayFromZero)")?
    };
    e.line(text);
    Ok(())
}

fn randomize(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let text = match e.optional(0) {
        Some(seed) => format!("__blRandom = new Random({})", seed),
        None => "__blRandom = new Random()".to_string(),
    };
    e.line(text);
    Ok(())
}

fn ubound(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    bound(e, "GetUpperBound")
}

fn lbound(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    bound(e, "GetLowerBound")
}

/// BASIC dimensions are 1-based, `Array.GetUpperBound` takes a 0-based rank.
fn bound(e: &mut Emitter<'_>, method: &str) -> Result<(), LoweringError> {
    let array = e.arg(0)?;
    let text = match e.optional(1) {
        Some(dimension) => format!("{}.{}({} - 1)", array, method, dimension),
        None => format!("{}.{}(0)", array, method),
    };
    e.line(text);
    Ok(())
}

impl LoweringProvider for ManagedProvider {
    fn name(&self) -> &str {
        "managed"
    }

    fn backend(&self) -> Backend {
        Backend::Managed
    }

    fn handles(&self, intrinsic: Intrinsic) -> bool {
        Self::rule(intrinsic).is_some()
    }

    fn emit(&self, intrinsic: Intrinsic, call: &CallSite<'_>) -> Result<String, LoweringError> {
        Self::rule(intrinsic)
            .ok_or_else(|| unsupported(intrinsic, Backend::Managed))?
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
        ManagedProvider.emit(intrinsic, &CallSite::new(&args)).unwrap()
    }

    #[test]
    fn test_print_line() {
        assert_eq!(emit(Intrinsic::PrintLine, &["x"]), "Console.WriteLine(x)");
        assert_eq!(emit(Intrinsic::PrintLine, &[]), "Console.WriteLine()");
    }

    #[test]
    fn test_mid_adjusts_start() {
        assert_eq!(
            emit(Intrinsic::Mid, &["s", "3", "4"]),
            "__blMid(s, 3 - 1, 4)"
        );
        assert_eq!(emit(Intrinsic::Mid, &["s", "3"]), "s.Substring(3 - 1)");
    }

    #[test]
    fn test_substrings_evaluate_source_once() {
        assert_eq!(
            emit(Intrinsic::Left, &["Console.ReadLine()", "3"]),
            "__blLeft(Console.ReadLine(), 3)"
        );
        assert_eq!(emit(Intrinsic::Right, &["f()", "2"]), "__blRight(f(), 2)");
        let helper = ManagedProvider.helper_definition(Intrinsic::Left).unwrap();
        assert!(helper.body.contains("Math.Min(n, s.Length)"));
    }

    #[test]
    fn test_asc_of_empty_string_is_zero() {
        assert_eq!(emit(Intrinsic::Asc, &["s"]), "__blAsc(s)");
        let helper = ManagedProvider.helper_definition(Intrinsic::Asc).unwrap();
        assert!(helper.body.contains("s.Length > 0 ? s[0] : 0"));
    }

    #[test]
    fn test_instr_is_one_based() {
        assert_eq!(
            emit(Intrinsic::InStr, &["h", "n"]),
            "(h.IndexOf(n, StringComparison.Ordinal) + 1)"
        );
    }

    #[test]
    fn test_rnd_and_randomize_share_helper() {
        let rnd = ManagedProvider.helper_definition(Intrinsic::Rnd).unwrap();
        let randomize = ManagedProvider.helper_definition(Intrinsic::Randomize).unwrap();
        assert_eq!(rnd, randomize);
        assert_eq!(emit(Intrinsic::Randomize, &["42"]), "__blRandom = new Random(42)");
    }

    #[test]
    fn test_round_is_away_from_zero() {
        assert!(emit(Intrinsic::Round, &["x"]).contains("MidpointRounding.AwayFromZero"));
        assert!(emit(Intrinsic::Round, &["x", "2"]).contains("(x, 2, "));
    }

    #[test]
    fn test_ubound_dimension_is_one_based() {
        assert_eq!(emit(Intrinsic::UBound, &["a"]), "a.GetUpperBound(0)");
        assert_eq!(emit(Intrinsic::UBound, &["a", "2"]), "a.GetUpperBound(2 - 1)");
    }

    #[test]
    fn test_declarations() {
        let decls = ManagedProvider.required_declarations(Intrinsic::HttpGet);
        assert_eq!(decls, vec!["using System;", "using System.Net.Http;"]);
        assert!(ManagedProvider.required_declarations(Intrinsic::Len).is_empty());
    }

    #[test]
    fn test_engine_bindings_left_to_specialized_provider() {
        assert!(!ManagedProvider.handles(Intrinsic::InitWindow));
        let err = ManagedProvider
            .emit(Intrinsic::InitWindow, &CallSite::new(&[]))
            .unwrap_err();
        assert!(matches!(err, LoweringError::UnsupportedOnBackend { .. }));
    }

    #[test]
    fn test_networking_supported() {
        assert!(ManagedProvider.handles_name("tcpconnect"));
        assert_eq!(emit(Intrinsic::TcpConnect, &["h", "80"]), "new TcpClient(h, 80)");
    }
}
