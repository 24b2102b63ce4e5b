//! IR backend: LLVM textual IR with opaque pointers.
//!
//! Arguments are bare operands (`%x`, `42`, `@.str.3`); the provider types
//! them from the catalog signature. `Any` parameters are the exception:
//! their operands carry the IR type (`i64 %x`, `double %d`, `ptr %s`,
//! `i1 %b`, `i32 %n`) because the emitted instruction depends on it.
//!
//! Every fragment is an instruction sequence. Non-void fragments define
//! `%{result}` with their last instruction, temporaries are
//! `%{result}.<role>`. Void fragments define nothing.
//!
//! # Type Mapping
//!
//! | BASIC      | IR       |
//! |------------|----------|
//! | Boolean    | `i1`     |
//! | Integer    | `i32`    |
//! | Long, Date | `i64`    |
//! | Double     | `double` |
//! | everything else | `ptr` (runtime-owned) |
//!
//! Strings, arrays, collections and dates go through entry points of the
//! BASIC runtime library (`bl_*`). Math maps onto LLVM intrinsics or libm,
//! console output onto `printf`, and the random generator onto two
//! synthesized helpers over `rand`/`srand`.

use crate::intrinsics::Intrinsic;
use crate::lowering::rule::{unsupported, Emitter, Rule};
use crate::lowering::{Backend, CallSite, HelperRoutine, LoweringError, LoweringProvider};

const PRINTF: &[&str] = &[
    "declare i32 @printf(ptr, ...)",
    r#"@.bl.fmt.d = private unnamed_addr constant [3 x i8] c"%d\00""#,
    r#"@.bl.fmt.d.nl = private unnamed_addr constant [4 x i8] c"%d\0A\00""#,
    r#"@.bl.fmt.lld = private unnamed_addr constant [5 x i8] c"%lld\00""#,
    r#"@.bl.fmt.lld.nl = private unnamed_addr constant [6 x i8] c"%lld\0A\00""#,
    r#"@.bl.fmt.g = private unnamed_addr constant [6 x i8] c"%.15g\00""#,
    r#"@.bl.fmt.g.nl = private unnamed_addr constant [7 x i8] c"%.15g\0A\00""#,
    r#"@.bl.fmt.s = private unnamed_addr constant [3 x i8] c"%s\00""#,
    r#"@.bl.fmt.s.nl = private unnamed_addr constant [4 x i8] c"%s\0A\00""#,
    r#"@.bl.nl = private unnamed_addr constant [2 x i8] c"\0A\00""#,
];
const EMPTY: &str = "@.bl.empty = private unnamed_addr constant [1 x i8] zeroinitializer";
const INPUT: &[&str] = &[
    "declare ptr @bl_input(ptr)",
    r#"@.bl.prompt = private unnamed_addr constant [3 x i8] c"? \00""#,
];
const READ_LINE: &[&str] = &["declare ptr @bl_input(ptr)", EMPTY];
const CLS: &[&str] = &[
    "declare i32 @printf(ptr, ...)",
    r#"@.bl.ansi.cls = private unnamed_addr constant [8 x i8] c"\1B[2J\1B[H\00""#,
];
const LOCATE: &[&str] = &[
    "declare i32 @printf(ptr, ...)",
    r#"@.bl.ansi.locate = private unnamed_addr constant [9 x i8] c"\1B[%d;%dH\00""#,
];
const ROUND: &[&str] = &[
    "declare double @llvm.round.f64(double)",
    "declare double @llvm.pow.f64(double, double)",
];
const RANDOMIZE: &[&str] = &["declare void @srand(i32)", "declare i64 @time(ptr)"];
const GETENV: &[&str] = &["declare ptr @getenv(ptr)", EMPTY];
const CSTR: &[&str] = &[
    "declare ptr @bl_str_from_int(i64)",
    "declare ptr @bl_str_from_double(double)",
];
const LIST_ADD: &[&str] = &[
    "declare void @bl_list_add(ptr, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];
const LIST_SET: &[&str] = &[
    "declare void @bl_list_set(ptr, i32, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];
const LIST_CONTAINS: &[&str] = &[
    "declare i1 @bl_list_contains(ptr, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];
const DICT_SET: &[&str] = &[
    "declare void @bl_dict_set(ptr, ptr, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];
const DICT_GET: &[&str] = &[
    "declare ptr @bl_dict_get(ptr, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];
const DICT_CONTAINS: &[&str] = &[
    "declare i1 @bl_dict_contains(ptr, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];
const DICT_REMOVE: &[&str] = &[
    "declare void @bl_dict_remove(ptr, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];
const SET_ADD: &[&str] = &[
    "declare void @bl_set_add(ptr, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];
const SET_CONTAINS: &[&str] = &[
    "declare i1 @bl_set_contains(ptr, ptr)",
    "declare ptr @bl_box_int(i64)",
    "declare ptr @bl_box_double(double)",
    "declare ptr @bl_box_bool(i1)",
];

const RND: HelperRoutine = HelperRoutine {
    name: "__bl_rnd",
    body: "define internal double @__bl_rnd() {
entry:
  %r = call i32 @rand()
  %masked = and i32 %r, 32767
  %f = sitofp i32 %masked to double
  %scaled = fdiv double %f, 32768.0
  ret double %scaled
}",
};

const RANDOMIZE_HELPER: HelperRoutine = HelperRoutine {
    name: "__bl_randomize",
    body: "define internal void @__bl_randomize() {
entry:
  %now = call i64 @time(ptr null)
  %seed = trunc i64 %now to i32
  call void @srand(i32 %seed)
  ret void
}",
};

const GETENV_HELPER: HelperRoutine = HelperRoutine {
    name: "__bl_getenv",
    body: "define internal ptr @__bl_getenv(ptr %name) {
entry:
  %value = call ptr @getenv(ptr %name)
  %missing = icmp eq ptr %value, null
  %result = select i1 %missing, ptr @.bl.empty, ptr %value
  ret ptr %result
}",
};

/// Lowers intrinsics to LLVM IR instruction sequences.
#[derive(Debug, Default, Clone, Copy)]
pub struct IrProvider;

impl IrProvider {
    fn rule(intrinsic: Intrinsic) -> Option<Rule> {
        use Intrinsic::*;

        let rule = match intrinsic {
            // IO
            Print => Rule::build(print).declares(PRINTF),
            PrintLine => Rule::build(print_line).declares(PRINTF),
            Input => Rule::build(input).declares(INPUT).needs_runtime(),
            ReadLine => Rule::template("{r} = call ptr @bl_input(ptr @.bl.empty)")
                .declares(READ_LINE)
                .needs_runtime(),

            // ConsoleOps
            Cls => Rule::template("call i32 (ptr, ...) @printf(ptr @.bl.ansi.cls)").declares(CLS),
            Locate => Rule::template("call i32 (ptr, ...) @printf(ptr @.bl.ansi.locate, i32 {0}, i32 {1})")
                .declares(LOCATE),
            Color => Rule::build(color)
                .declares(&["declare void @bl_color(i32, i32)"])
                .needs_runtime(),
            Beep => Rule::template("call i32 @putchar(i32 7)").declares(&["declare i32 @putchar(i32)"]),
            InKey => runtime("{r} = call ptr @bl_inkey()", &["declare ptr @bl_inkey()"]),

            // FileIO
            FileExists => runtime(
                "{r} = call i1 @bl_file_exists(ptr {0})",
                &["declare i1 @bl_file_exists(ptr)"],
            ),
            ReadAllText => runtime(
                "{r} = call ptr @bl_read_all_text(ptr {0})",
                &["declare ptr @bl_read_all_text(ptr)"],
            ),
            WriteAllText => runtime(
                "call void @bl_write_all_text(ptr {0}, ptr {1})",
                &["declare void @bl_write_all_text(ptr, ptr)"],
            ),
            AppendAllText => runtime(
                "call void @bl_append_all_text(ptr {0}, ptr {1})",
                &["declare void @bl_append_all_text(ptr, ptr)"],
            ),
            DeleteFile => Rule::template("call i32 @remove(ptr {0})").declares(&["declare i32 @remove(ptr)"]),
            DirectoryExists => runtime(
                "{r} = call i1 @bl_directory_exists(ptr {0})",
                &["declare i1 @bl_directory_exists(ptr)"],
            ),
            CreateDirectory => runtime(
                "call void @bl_create_directory(ptr {0})",
                &["declare void @bl_create_directory(ptr)"],
            ),

            // String
            Len => Rule::build(len).declares(&["declare i64 @strlen(ptr)"]),
            Left => runtime(
                "{r} = call ptr @bl_str_left(ptr {0}, i32 {1})",
                &["declare ptr @bl_str_left(ptr, i32)"],
            ),
            Right => runtime(
                "{r} = call ptr @bl_str_right(ptr {0}, i32 {1})",
                &["declare ptr @bl_str_right(ptr, i32)"],
            ),
            Mid => Rule::build(mid)
                .declares(&["declare ptr @bl_str_mid(ptr, i32, i32)"])
                .needs_runtime(),
            InStr => Rule::build(instr)
                .declares(&["declare i32 @bl_str_find(ptr, ptr)"])
                .needs_runtime(),
            UCase => runtime("{r} = call ptr @bl_str_ucase(ptr {0})", &["declare ptr @bl_str_ucase(ptr)"]),
            LCase => runtime("{r} = call ptr @bl_str_lcase(ptr {0})", &["declare ptr @bl_str_lcase(ptr)"]),
            Trim => runtime("{r} = call ptr @bl_str_trim(ptr {0})", &["declare ptr @bl_str_trim(ptr)"]),
            LTrim => runtime("{r} = call ptr @bl_str_ltrim(ptr {0})", &["declare ptr @bl_str_ltrim(ptr)"]),
            RTrim => runtime("{r} = call ptr @bl_str_rtrim(ptr {0})", &["declare ptr @bl_str_rtrim(ptr)"]),
            Replace => runtime(
                "{r} = call ptr @bl_str_replace(ptr {0}, ptr {1}, ptr {2})",
                &["declare ptr @bl_str_replace(ptr, ptr, ptr)"],
            ),
            Chr => runtime("{r} = call ptr @bl_str_chr(i32 {0})", &["declare ptr @bl_str_chr(i32)"]),
            Asc => Rule::build(asc),
            Space => runtime("{r} = call ptr @bl_str_space(i32 {0})", &["declare ptr @bl_str_space(i32)"]),
            StrReverse => runtime(
                "{r} = call ptr @bl_str_reverse(ptr {0})",
                &["declare ptr @bl_str_reverse(ptr)"],
            ),

            // Math
            Abs => math("{r} = call double @llvm.fabs.f64(double {0})", &["declare double @llvm.fabs.f64(double)"]),
            Sqr => math("{r} = call double @llvm.sqrt.f64(double {0})", &["declare double @llvm.sqrt.f64(double)"]),
            Sin => math("{r} = call double @llvm.sin.f64(double {0})", &["declare double @llvm.sin.f64(double)"]),
            Cos => math("{r} = call double @llvm.cos.f64(double {0})", &["declare double @llvm.cos.f64(double)"]),
            Tan => math("{r} = call double @tan(double {0})", &["declare double @tan(double)"]),
            Atn => math("{r} = call double @atan(double {0})", &["declare double @atan(double)"]),
            Log => math("{r} = call double @llvm.log.f64(double {0})", &["declare double @llvm.log.f64(double)"]),
            Exp => math("{r} = call double @llvm.exp.f64(double {0})", &["declare double @llvm.exp.f64(double)"]),
            Int => math(
                "{r} = call double @llvm.floor.f64(double {0})",
                &["declare double @llvm.floor.f64(double)"],
            ),
            Fix => math(
                "{r} = call double @llvm.trunc.f64(double {0})",
                &["declare double @llvm.trunc.f64(double)"],
            ),
            Sgn => Rule::build(sgn),
            Round => Rule::build(round).declares(ROUND),
            Min => math(
                "{r} = call double @llvm.minnum.f64(double {0}, double {1})",
                &["declare double @llvm.minnum.f64(double, double)"],
            ),
            Max => math(
                "{r} = call double @llvm.maxnum.f64(double {0}, double {1})",
                &["declare double @llvm.maxnum.f64(double, double)"],
            ),
            Pow => math(
                "{r} = call double @llvm.pow.f64(double {0}, double {1})",
                &["declare double @llvm.pow.f64(double, double)"],
            ),
            Rnd => Rule::template("{r} = call double @__bl_rnd()")
                .declares(&["declare i32 @rand()"])
                .with_helper(RND),
            Randomize => Rule::build(randomize)
                .declares(RANDOMIZE)
                .with_helper(RANDOMIZE_HELPER),

            // Conversion
            CInt => Rule::template("{r} = fptosi double {0} to i32"),
            CLng => Rule::template("{r} = fptosi double {0} to i64"),
            CDbl => Rule::template("{r} = sitofp i64 {0} to double"),
            CStr => Rule::build(cstr).declares(CSTR).needs_runtime(),
            CBool => Rule::template("{r} = icmp ne i64 {0}, 0"),
            Val => Rule::template("{r} = call double @strtod(ptr {0}, ptr null)")
                .declares(&["declare double @strtod(ptr, ptr)"]),
            Str => runtime(
                "{r} = call ptr @bl_str_from_double(double {0})",
                &["declare ptr @bl_str_from_double(double)"],
            ),
            Hex => runtime("{r} = call ptr @bl_str_hex(i64 {0})", &["declare ptr @bl_str_hex(i64)"]),

            // ArrayOps
            UBound => Rule::build(ubound)
                .declares(&["declare i32 @bl_array_ubound(ptr, i32)"])
                .needs_runtime(),
            LBound => Rule::build(lbound)
                .declares(&["declare i32 @bl_array_lbound(ptr, i32)"])
                .needs_runtime(),
            ArraySort => runtime("call void @bl_array_sort(ptr {0})", &["declare void @bl_array_sort(ptr)"]),
            ArrayReverse => runtime(
                "call void @bl_array_reverse(ptr {0})",
                &["declare void @bl_array_reverse(ptr)"],
            ),

            // DateTime
            Now => Rule::template("{r} = call i64 @time(ptr null)").declares(&["declare i64 @time(ptr)"]),
            Timer => runtime("{r} = call double @bl_timer()", &["declare double @bl_timer()"]),
            Year => runtime("{r} = call i32 @bl_year(i64 {0})", &["declare i32 @bl_year(i64)"]),
            Month => runtime("{r} = call i32 @bl_month(i64 {0})", &["declare i32 @bl_month(i64)"]),
            Day => runtime("{r} = call i32 @bl_day(i64 {0})", &["declare i32 @bl_day(i64)"]),

            // Collections
            CreateList => runtime("{r} = call ptr @bl_list_new()", &["declare ptr @bl_list_new()"]),
            ListAdd => Rule::build(list_add).declares(LIST_ADD).needs_runtime(),
            ListGet => runtime(
                "{r} = call ptr @bl_list_get(ptr {0}, i32 {1})",
                &["declare ptr @bl_list_get(ptr, i32)"],
            ),
            ListSet => Rule::build(list_set).declares(LIST_SET).needs_runtime(),
            ListCount => runtime("{r} = call i32 @bl_list_count(ptr {0})", &["declare i32 @bl_list_count(ptr)"]),
            ListRemoveAt => runtime(
                "call void @bl_list_remove_at(ptr {0}, i32 {1})",
                &["declare void @bl_list_remove_at(ptr, i32)"],
            ),
            ListClear => runtime("call void @bl_list_clear(ptr {0})", &["declare void @bl_list_clear(ptr)"]),
            ListContains => Rule::build(list_contains).declares(LIST_CONTAINS).needs_runtime(),
            CreateDictionary => runtime("{r} = call ptr @bl_dict_new()", &["declare ptr @bl_dict_new()"]),
            DictSet => Rule::build(dict_set).declares(DICT_SET).needs_runtime(),
            DictGet => Rule::build(dict_get).declares(DICT_GET).needs_runtime(),
            DictContainsKey => Rule::build(dict_contains_key).declares(DICT_CONTAINS).needs_runtime(),
            DictRemove => Rule::build(dict_remove).declares(DICT_REMOVE).needs_runtime(),
            DictCount => runtime("{r} = call i32 @bl_dict_count(ptr {0})", &["declare i32 @bl_dict_count(ptr)"]),
            CreateSet => runtime("{r} = call ptr @bl_set_new()", &["declare ptr @bl_set_new()"]),
            SetAdd => Rule::build(set_add).declares(SET_ADD).needs_runtime(),
            SetContains => Rule::build(set_contains).declares(SET_CONTAINS).needs_runtime(),
            SetCount => runtime("{r} = call i32 @bl_set_count(ptr {0})", &["declare i32 @bl_set_count(ptr)"]),

            // EnvironmentOps
            GetEnv => Rule::template("{r} = call ptr @__bl_getenv(ptr {0})")
                .declares(GETENV)
                .with_helper(GETENV_HELPER),
            SetEnv => Rule::template("call i32 @setenv(ptr {0}, ptr {1}, i32 1)")
                .declares(&["declare i32 @setenv(ptr, ptr, i32)"]),
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

fn runtime(template: &'static str, declarations: &'static [&'static str]) -> Rule {
    Rule::template(template).declares(declarations).needs_runtime()
}

fn math(template: &'static str, declarations: &'static [&'static str]) -> Rule {
    Rule::template(template).declares(declarations)
}

/// IR type carried by an `Any` operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnyType {
    I1,
    I32,
    I64,
    Double,
    Ptr,
}

/// Splits an `Any` argument such as `i64 %x` into its type and operand.
fn typed_operand<'a>(e: &Emitter<'a>, index: usize) -> Result<(AnyType, &'a str), LoweringError> {
    let arg = e.arg(index)?;
    let invalid = || {
        e.invalid(
            index + 1,
            format!("expected a typed operand such as `i64 %x`, found `{}`", arg),
        )
    };
    let (ty, operand) = arg.trim().split_once(char::is_whitespace).ok_or_else(invalid)?;
    let ty = match ty {
        "i1" => AnyType::I1,
        "i32" => AnyType::I32,
        "i64" => AnyType::I64,
        "double" => AnyType::Double,
        "ptr" => AnyType::Ptr,
        _ => return Err(invalid()),
    };
    Ok((ty, operand.trim()))
}

/// Converts an `Any` argument into a runtime value pointer. `ptr` operands
/// are runtime values already and pass through unchanged.
fn boxed(e: &mut Emitter<'_>, index: usize, role: &str) -> Result<String, LoweringError> {
    let (ty, operand) = typed_operand(e, index)?;
    let boxed = match ty {
        AnyType::Ptr => return Ok(operand.to_string()),
        AnyType::I1 => format!("call ptr @bl_box_bool(i1 {})", operand),
        AnyType::I32 => {
            let wide = e.assign(&format!("{}.wide", role), format!("sext i32 {} to i64", operand));
            format!("call ptr @bl_box_int(i64 {})", wide)
        }
        AnyType::I64 => format!("call ptr @bl_box_int(i64 {})", operand),
        AnyType::Double => format!("call ptr @bl_box_double(double {})", operand),
    };
    Ok(e.assign(role, boxed))
}

fn print(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    print_value(e, false)
}

fn print_line(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    print_value(e, true)
}

fn print_value(e: &mut Emitter<'_>, newline: bool) -> Result<(), LoweringError> {
    if e.optional(0).is_none() {
        e.line("call i32 (ptr, ...) @printf(ptr @.bl.nl)");
        return Ok(());
    }
    let (ty, operand) = typed_operand(e, 0)?;
    let (format, value) = match ty {
        AnyType::I1 => {
            let wide = e.assign("wide", format!("zext i1 {} to i32", operand));
            ("d", format!("i32 {}", wide))
        }
        AnyType::I32 => ("d", format!("i32 {}", operand)),
        AnyType::I64 => ("lld", format!("i64 {}", operand)),
        AnyType::Double => ("g", format!("double {}", operand)),
        AnyType::Ptr => ("s", format!("ptr {}", operand)),
    };
    let suffix = if newline { ".nl" } else { "" };
    e.line(format!(
        "call i32 (ptr, ...) @printf(ptr @.bl.fmt.{}{}, {})",
        format, suffix, value
    ));
    Ok(())
}

fn input(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let prompt = e.optional(0).unwrap_or("@.bl.prompt");
    e.define(format!("call ptr @bl_input(ptr {})", prompt));
    Ok(())
}

fn color(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let foreground = e.arg(0)?;
    let background = e.optional(1).unwrap_or("-1");
    e.line(format!(
        "call void @bl_color(i32 {}, i32 {})",
        foreground, background
    ));
    Ok(())
}

fn len(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let length = e.assign("len", format!("call i64 @strlen(ptr {})", e.arg(0)?));
    e.define(format!("trunc i64 {} to i32", length));
    Ok(())
}

/// `bl_str_mid` takes a 0-based start; a negative length means "to the end".
fn mid(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let source = e.arg(0)?;
    let start = e.assign("start", format!("sub i32 {}, 1", e.arg(1)?));
    let length = e.optional(2).unwrap_or("-1");
    e.define(format!(
        "call ptr @bl_str_mid(ptr {}, i32 {}, i32 {})",
        source, start, length
    ));
    Ok(())
}

/// `bl_str_find` returns a 0-based index or -1, so adding one yields the
/// 1-based position or 0.
fn instr(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let index = e.assign(
        "index",
        format!("call i32 @bl_str_find(ptr {}, ptr {})", e.arg(0)?, e.arg(1)?),
    );
    e.define(format!("add i32 {}, 1", index));
    Ok(())
}

fn asc(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let byte = e.assign("byte", format!("load i8, ptr {}", e.arg(0)?));
    e.define(format!("zext i8 {} to i32", byte));
    Ok(())
}

fn sgn(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let x = e.arg(0)?;
    let positive = e.assign("pos", format!("fcmp ogt double {}, 0.0", x));
    let negative = e.assign("neg", format!("fcmp olt double {}, 0.0", x));
    let p = e.assign("p", format!("zext i1 {} to i32", positive));
    let n = e.assign("n", format!("zext i1 {} to i32", negative));
    e.define(format!("sub i32 {}, {}", p, n));
    Ok(())
}

fn round(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let x = e.arg(0)?;
    let Some(digits) = e.optional(1) else {
        e.define(format!("call double @llvm.round.f64(double {})", x));
        return Ok(());
    };
    let exponent = e.assign("digits", format!("sitofp i32 {} to double", digits));
    let scale = e.assign(
        "scale",
        format!("call double @llvm.pow.f64(double 10.0, double {})", exponent),
    );
    let scaled = e.assign("scaled", format!("fmul double {}, {}", x, scale));
    let rounded = e.assign(
        "rounded",
        format!("call double @llvm.round.f64(double {})", scaled),
    );
    e.define(format!("fdiv double {}, {}", rounded, scale));
    Ok(())
}

fn randomize(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let text = match e.optional(0) {
        Some(seed) => format!("call void @srand(i32 {})", seed),
        None => "call void @__bl_randomize()".to_string(),
    };
    e.line(text);
    Ok(())
}

fn cstr(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let (ty, operand) = typed_operand(e, 0)?;
    match ty {
        AnyType::Ptr => e.define(format!("bitcast ptr {} to ptr", operand)),
        AnyType::Double => e.define(format!("call ptr @bl_str_from_double(double {})", operand)),
        AnyType::I64 => e.define(format!("call ptr @bl_str_from_int(i64 {})", operand)),
        AnyType::I32 | AnyType::I1 => {
            let (ext, width) = if ty == AnyType::I32 {
                ("sext", "i32")
            } else {
                ("zext", "i1")
            };
            let wide = e.assign("wide", format!("{} {} {} to i64", ext, width, operand));
            e.define(format!("call ptr @bl_str_from_int(i64 {})", wide));
        }
    }
    Ok(())
}

fn ubound(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    bound(e, "bl_array_ubound")
}

fn lbound(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    bound(e, "bl_array_lbound")
}

fn bound(e: &mut Emitter<'_>, entry: &str) -> Result<(), LoweringError> {
    let array = e.arg(0)?;
    let dimension = e.optional(1).unwrap_or("1");
    e.define(format!("call i32 @{}(ptr {}, i32 {})", entry, array, dimension));
    Ok(())
}

fn list_add(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let value = boxed(e, 1, "value")?;
    e.line(format!("call void @bl_list_add(ptr {}, ptr {})", e.arg(0)?, value));
    Ok(())
}

fn list_set(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let value = boxed(e, 2, "value")?;
    e.line(format!(
        "call void @bl_list_set(ptr {}, i32 {}, ptr {})",
        e.arg(0)?,
        e.arg(1)?,
        value
    ));
    Ok(())
}

fn list_contains(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let value = boxed(e, 1, "value")?;
    e.define(format!("call i1 @bl_list_contains(ptr {}, ptr {})", e.arg(0)?, value));
    Ok(())
}

fn dict_set(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let key = boxed(e, 1, "key")?;
    let value = boxed(e, 2, "value")?;
    e.line(format!(
        "call void @bl_dict_set(ptr {}, ptr {}, ptr {})",
        e.arg(0)?,
        key,
        value
    ));
    Ok(())
}

fn dict_get(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let key = boxed(e, 1, "key")?;
    e.define(format!("call ptr @bl_dict_get(ptr {}, ptr {})", e.arg(0)?, key));
    Ok(())
}

fn dict_contains_key(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let key = boxed(e, 1, "key")?;
    e.define(format!("call i1 @bl_dict_contains(ptr {}, ptr {})", e.arg(0)?, key));
    Ok(())
}

fn dict_remove(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let key = boxed(e, 1, "key")?;
    e.line(format!("call void @bl_dict_remove(ptr {}, ptr {})", e.arg(0)?, key));
    Ok(())
}

fn set_add(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let value = boxed(e, 1, "value")?;
    e.line(format!("call void @bl_set_add(ptr {}, ptr {})", e.arg(0)?, value));
    Ok(())
}

fn set_contains(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    let value = boxed(e, 1, "value")?;
    e.define(format!("call i1 @bl_set_contains(ptr {}, ptr {})", e.arg(0)?, value));
    Ok(())
}

impl LoweringProvider for IrProvider {
    fn name(&self) -> &str {
        "ir"
    }

    fn backend(&self) -> Backend {
        Backend::Ir
    }

    fn handles(&self, intrinsic: Intrinsic) -> bool {
        Self::rule(intrinsic).is_some()
    }

    fn emit(&self, intrinsic: Intrinsic, call: &CallSite<'_>) -> Result<String, LoweringError> {
        Self::rule(intrinsic)
            .ok_or_else(|| unsupported(intrinsic, Backend::Ir))?
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

    fn requires_runtime(&self, intrinsic: Intrinsic) -> bool {
        Self::rule(intrinsic).is_some_and(|rule| rule.runtime())
    }
}
