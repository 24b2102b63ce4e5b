//! Bytecode backend: CIL assembler text.
//!
//! Arguments are instruction sequences that push one value each; `Any`
//! arguments push an `object` (the driver boxes value types). A fragment
//! pushes each argument exactly once, in order, and then the call, leaving
//! the result (if any) on the evaluation stack. Fragments never contain
//! branch labels, so they can be pasted into any method body. Anything that
//! needs an operand twice or a branch lives in a helper.
//!
//! Generic collection types are instantiated inline at each call
//! (``List`1<object>``), and the only preamble a fragment needs is the
//! `.assembly extern` reference of the assembly it calls into.
//!
//! Helpers are emitted as global methods so fragments can call them
//! without a class qualifier.

use crate::intrinsics::Intrinsic;
use crate::lowering::rule::{unsupported, Emitter, Rule};
use crate::lowering::{Backend, CallSite, HelperRoutine, LoweringError, LoweringProvider};

const MSCORLIB: &[&str] = &[".assembly extern mscorlib {}"];
const SYSTEM: &[&str] = &[".assembly extern mscorlib {}", ".assembly extern System {}"];
const SYSTEM_CORE: &[&str] = &[".assembly extern mscorlib {}", ".assembly extern System.Core {}"];

const SUBSTRING_FROM: &str = "callvirt instance string [mscorlib]System.String::Substring(int32)";
const INVARIANT: &str = "call class [mscorlib]System.Globalization.CultureInfo [mscorlib]System.Globalization.CultureInfo::get_InvariantCulture()";

const INKEY: HelperRoutine = HelperRoutine {
    name: "__bl_inkey",
    body: ".method assembly static string __bl_inkey() cil managed
{
    .maxstack 2
    .locals init (valuetype [mscorlib]System.ConsoleKeyInfo V_0)
    call bool [mscorlib]System.Console::get_KeyAvailable()
    brtrue.s HAS_KEY
    ldstr \"\"
    ret
  HAS_KEY:
    ldc.i4.1
    call valuetype [mscorlib]System.ConsoleKeyInfo [mscorlib]System.Console::ReadKey(bool)
    stloc.0
    ldloca.s V_0
    call instance char [mscorlib]System.ConsoleKeyInfo::get_KeyChar()
    call string [mscorlib]System.Char::ToString(char)
    ret
}",
};

/// `__bl_mid` takes a 0-based start; the fragment does the BASIC adjustment.
const SUBSTRINGS: HelperRoutine = HelperRoutine {
    name: "__bl_substrings",
    body: ".method assembly static string __bl_left(string s, int32 n) cil managed
{
    .maxstack 4
    ldarg.0
    ldc.i4.0
    ldarg.1
    ldarg.0
    callvirt instance int32 [mscorlib]System.String::get_Length()
    call int32 [mscorlib]System.Math::Min(int32, int32)
    callvirt instance string [mscorlib]System.String::Substring(int32, int32)
    ret
}
.method assembly static string __bl_right(string s, int32 n) cil managed
{
    .maxstack 4
    ldarg.0
    ldarg.0
    callvirt instance int32 [mscorlib]System.String::get_Length()
    ldarg.1
    ldarg.0
    callvirt instance int32 [mscorlib]System.String::get_Length()
    call int32 [mscorlib]System.Math::Min(int32, int32)
    sub
    callvirt instance string [mscorlib]System.String::Substring(int32)
    ret
}
.method assembly static string __bl_mid(string s, int32 start, int32 length) cil managed
{
    .maxstack 5
    ldarg.0
    ldarg.1
    ldarg.2
    ldarg.0
    callvirt instance int32 [mscorlib]System.String::get_Length()
    ldarg.1
    sub
    call int32 [mscorlib]System.Math::Min(int32, int32)
    callvirt instance string [mscorlib]System.String::Substring(int32, int32)
    ret
}",
};

const ASC: HelperRoutine = HelperRoutine {
    name: "__bl_asc",
    body: ".method assembly static int32 __bl_asc(string s) cil managed
{
    .maxstack 2
    ldarg.0
    callvirt instance int32 [mscorlib]System.String::get_Length()
    brtrue.s HAS_CHAR
    ldc.i4.0
    ret
  HAS_CHAR:
    ldarg.0
    ldc.i4.0
    callvirt instance char [mscorlib]System.String::get_Chars(int32)
    ret
}",
};

/// One generator per program, created on first use and replaced by
/// `__bl_randomize`.
const RANDOM: HelperRoutine = HelperRoutine {
    name: "__bl_random",
    body: ".field static assembly class [mscorlib]System.Random __bl_random_state
.method assembly static class [mscorlib]System.Random __bl_random() cil managed
{
    .maxstack 1
    ldsfld class [mscorlib]System.Random __bl_random_state
    brtrue.s READY
    newobj instance void [mscorlib]System.Random::.ctor()
    stsfld class [mscorlib]System.Random __bl_random_state
  READY:
    ldsfld class [mscorlib]System.Random __bl_random_state
    ret
}
.method assembly static void __bl_randomize(int32 seed) cil managed
{
    .maxstack 1
    ldarg.0
    newobj instance void [mscorlib]System.Random::.ctor(int32)
    stsfld class [mscorlib]System.Random __bl_random_state
    ret
}",
};

const STRREVERSE: HelperRoutine = HelperRoutine {
    name: "__bl_strreverse",
    body: ".method assembly static string __bl_strreverse(string s) cil managed
{
    .maxstack 1
    .locals init (char[] V_0)
    ldarg.0
    callvirt instance char[] [mscorlib]System.String::ToCharArray()
    stloc.0
    ldloc.0
    call void [mscorlib]System.Array::Reverse(class [mscorlib]System.Array)
    ldloc.0
    newobj instance void [mscorlib]System.String::.ctor(char[])
    ret
}",
};

const VAL: HelperRoutine = HelperRoutine {
    name: "__bl_val",
    body: r#".method assembly static float64 __bl_val(string s) cil managed
{
    .maxstack 2
    .locals init (class [System]System.Text.RegularExpressions.Match V_0)
    ldarg.0
    ldnull
    callvirt instance string [mscorlib]System.String::TrimStart(char[])
    ldstr "^[+-]?(\\d+\\.?\\d*|\\.\\d+)([eE][+-]?\\d+)?"
    call class [System]System.Text.RegularExpressions.Match [System]System.Text.RegularExpressions.Regex::Match(string, string)
    stloc.0
    ldloc.0
    callvirt instance bool [System]System.Text.RegularExpressions.Group::get_Success()
    brtrue.s PARSE
    ldc.r8 0.0
    ret
  PARSE:
    ldloc.0
    callvirt instance string [System]System.Text.RegularExpressions.Capture::get_Value()
    call class [mscorlib]System.Globalization.CultureInfo [mscorlib]System.Globalization.CultureInfo::get_InvariantCulture()
    call float64 [mscorlib]System.Double::Parse(string, class [mscorlib]System.IFormatProvider)
    ret
}"#,
};

const STR: HelperRoutine = HelperRoutine {
    name: "__bl_str",
    body: r#".method assembly static string __bl_str(float64 x) cil managed
{
    .maxstack 3
    ldarga.s x
    ldstr "G15"
    call class [mscorlib]System.Globalization.CultureInfo [mscorlib]System.Globalization.CultureInfo::get_InvariantCulture()
    call instance string [mscorlib]System.Double::ToString(string, class [mscorlib]System.IFormatProvider)
    ret
}"#,
};

const TIMER: HelperRoutine = HelperRoutine {
    name: "__bl_timer",
    body: ".method assembly static float64 __bl_timer() cil managed
{
    .maxstack 1
    .locals init (valuetype [mscorlib]System.DateTime V_0, valuetype [mscorlib]System.TimeSpan V_1)
    call valuetype [mscorlib]System.DateTime [mscorlib]System.DateTime::get_Now()
    stloc.0
    ldloca.s V_0
    call instance valuetype [mscorlib]System.TimeSpan [mscorlib]System.DateTime::get_TimeOfDay()
    stloc.1
    ldloca.s V_1
    call instance float64 [mscorlib]System.TimeSpan::get_TotalSeconds()
    ret
}",
};

const DATE_PARTS: HelperRoutine = HelperRoutine {
    name: "__bl_date_parts",
    body: ".method assembly static int32 __bl_year(valuetype [mscorlib]System.DateTime d) cil managed
{
    .maxstack 1
    ldarga.s d
    call instance int32 [mscorlib]System.DateTime::get_Year()
    ret
}
.method assembly static int32 __bl_month(valuetype [mscorlib]System.DateTime d) cil managed
{
    .maxstack 1
    ldarga.s d
    call instance int32 [mscorlib]System.DateTime::get_Month()
    ret
}
.method assembly static int32 __bl_day(valuetype [mscorlib]System.DateTime d) cil managed
{
    .maxstack 1
    ldarga.s d
    call instance int32 [mscorlib]System.DateTime::get_Day()
    ret
}",
};

/// Lowers intrinsics to CIL instruction sequences.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytecodeProvider;

impl BytecodeProvider {
    fn rule(intrinsic: Intrinsic) -> Option<Rule> {
        use Intrinsic::*;

        let rule = match intrinsic {
            // IO
            Print => cil("{0}\ncall void [mscorlib]System.Console::Write(object)"),
            PrintLine => Rule::build(print_line).declares(MSCORLIB),
            Input => Rule::build(input).declares(MSCORLIB),
            ReadLine => cil(
                "call string [mscorlib]System.Console::ReadLine()\n\
                 ldstr \"\"\n\
                 call string [mscorlib]System.String::Concat(string, string)",
            ),

            // ConsoleOps
            Cls => cil("call void [mscorlib]System.Console::Clear()"),
            Locate => cil(
                "{1}\nldc.i4.1\nsub\n{0}\nldc.i4.1\nsub\n\
                 call void [mscorlib]System.Console::SetCursorPosition(int32, int32)",
            ),
            Color => Rule::build(color).declares(MSCORLIB),
            Beep => cil("call void [mscorlib]System.Console::Beep()"),
            InKey => cil("call string __bl_inkey()").with_helper(INKEY),

            // FileIO
            FileExists => cil("{0}\ncall bool [mscorlib]System.IO.File::Exists(string)"),
            ReadAllText => cil("{0}\ncall string [mscorlib]System.IO.File::ReadAllText(string)"),
            WriteAllText => cil("{0}\n{1}\ncall void [mscorlib]System.IO.File::WriteAllText(string, string)"),
            AppendAllText => cil("{0}\n{1}\ncall void [mscorlib]System.IO.File::AppendAllText(string, string)"),
            DeleteFile => cil("{0}\ncall void [mscorlib]System.IO.File::Delete(string)"),
            DirectoryExists => cil("{0}\ncall bool [mscorlib]System.IO.Directory::Exists(string)"),
            CreateDirectory => cil(
                "{0}\n\
                 call class [mscorlib]System.IO.DirectoryInfo [mscorlib]System.IO.Directory::CreateDirectory(string)\n\
                 pop",
            ),

            // String
            Len => cil("{0}\ncallvirt instance int32 [mscorlib]System.String::get_Length()"),
            Left => cil("{0}\n{1}\ncall string __bl_left(string, int32)").with_helper(SUBSTRINGS),
            Right => cil("{0}\n{1}\ncall string __bl_right(string, int32)").with_helper(SUBSTRINGS),
            Mid => Rule::build(mid).declares(MSCORLIB).with_helper(SUBSTRINGS),
            InStr => cil(
                "{0}\n{1}\nldc.i4.4\n\
                 callvirt instance int32 [mscorlib]System.String::IndexOf(string, valuetype [mscorlib]System.StringComparison)\n\
                 ldc.i4.1\nadd",
            ),
            UCase => cil("{0}\ncallvirt instance string [mscorlib]System.String::ToUpperInvariant()"),
            LCase => cil("{0}\ncallvirt instance string [mscorlib]System.String::ToLowerInvariant()"),
            Trim => cil("{0}\ncallvirt instance string [mscorlib]System.String::Trim()"),
            LTrim => cil("{0}\nldnull\ncallvirt instance string [mscorlib]System.String::TrimStart(char[])"),
            RTrim => cil("{0}\nldnull\ncallvirt instance string [mscorlib]System.String::TrimEnd(char[])"),
            Replace => cil("{0}\n{1}\n{2}\ncallvirt instance string [mscorlib]System.String::Replace(string, string)"),
            Chr => cil("{0}\nconv.u2\ncall string [mscorlib]System.Char::ToString(char)"),
            Asc => cil("{0}\ncall int32 __bl_asc(string)").with_helper(ASC),
            Space => cil("ldc.i4.s 32\n{0}\nnewobj instance void [mscorlib]System.String::.ctor(char, int32)"),
            StrReverse => cil("{0}\ncall string __bl_strreverse(string)").with_helper(STRREVERSE),

            // Math
            Abs => cil("{0}\ncall float64 [mscorlib]System.Math::Abs(float64)"),
            Sqr => cil("{0}\ncall float64 [mscorlib]System.Math::Sqrt(float64)"),
            Sin => cil("{0}\ncall float64 [mscorlib]System.Math::Sin(float64)"),
            Cos => cil("{0}\ncall float64 [mscorlib]System.Math::Cos(float64)"),
            Tan => cil("{0}\ncall float64 [mscorlib]System.Math::Tan(float64)"),
            Atn => cil("{0}\ncall float64 [mscorlib]System.Math::Atan(float64)"),
            Log => cil("{0}\ncall float64 [mscorlib]System.Math::Log(float64)"),
            Exp => cil("{0}\ncall float64 [mscorlib]System.Math::Exp(float64)"),
            Int => cil("{0}\ncall float64 [mscorlib]System.Math::Floor(float64)"),
            Fix => cil("{0}\ncall float64 [mscorlib]System.Math::Truncate(float64)"),
            Sgn => cil("{0}\ncall int32 [mscorlib]System.Math::Sign(float64)"),
            Round => Rule::build(round).declares(MSCORLIB),
            Min => cil("{0}\n{1}\ncall float64 [mscorlib]System.Math::Min(float64, float64)"),
            Max => cil("{0}\n{1}\ncall float64 [mscorlib]System.Math::Max(float64, float64)"),
            Pow => cil("{0}\n{1}\ncall float64 [mscorlib]System.Math::Pow(float64, float64)"),
            Rnd => cil(
                "call class [mscorlib]System.Random __bl_random()\n\
                 callvirt instance float64 [mscorlib]System.Random::NextDouble()",
            )
            .with_helper(RANDOM),
            Randomize => Rule::build(randomize).declares(MSCORLIB).with_helper(RANDOM),

            // Conversion
            CInt => Rule::template("{0}\nconv.i4"),
            CLng => Rule::template("{0}\nconv.i8"),
            CDbl => Rule::template("{0}\nconv.r8"),
            CStr => Rule::build(cstr).declares(MSCORLIB),
            CBool => Rule::template("{0}\nldc.i4.0\nconv.i8\nceq\nldc.i4.0\nceq"),
            Val => Rule::template("{0}\ncall float64 __bl_val(string)")
                .declares(SYSTEM)
                .with_helper(VAL),
            Str => cil("{0}\ncall string __bl_str(float64)").with_helper(STR),
            Hex => cil(
                "{0}\nldc.i4.s 16\n\
                 call string [mscorlib]System.Convert::ToString(int64, int32)\n\
                 callvirt instance string [mscorlib]System.String::ToUpperInvariant()",
            ),

            // ArrayOps
            UBound => Rule::build(ubound).declares(MSCORLIB),
            LBound => Rule::build(lbound).declares(MSCORLIB),
            ArraySort => cil("{0}\ncall void [mscorlib]System.Array::Sort(class [mscorlib]System.Array)"),
            ArrayReverse => cil("{0}\ncall void [mscorlib]System.Array::Reverse(class [mscorlib]System.Array)"),

            // DateTime
            Now => cil("call valuetype [mscorlib]System.DateTime [mscorlib]System.DateTime::get_Now()"),
            Timer => cil("call float64 __bl_timer()").with_helper(TIMER),
            Year => cil("{0}\ncall int32 __bl_year(valuetype [mscorlib]System.DateTime)").with_helper(DATE_PARTS),
            Month => cil("{0}\ncall int32 __bl_month(valuetype [mscorlib]System.DateTime)").with_helper(DATE_PARTS),
            Day => cil("{0}\ncall int32 __bl_day(valuetype [mscorlib]System.DateTime)").with_helper(DATE_PARTS),

            // Collections
            CreateList => cil(
                "newobj instance void class [mscorlib]System.Collections.Generic.List`1<object>::.ctor()",
            ),
            ListAdd => cil(
                "{0}\n{1}\n\
                 callvirt instance void class [mscorlib]System.Collections.Generic.List`1<object>::Add(!0)",
            ),
            ListGet => cil(
                "{0}\n{1}\n\
                 callvirt instance !0 class [mscorlib]System.Collections.Generic.List`1<object>::get_Item(int32)",
            ),
            ListSet => cil(
                "{0}\n{1}\n{2}\n\
                 callvirt instance void class [mscorlib]System.Collections.Generic.List`1<object>::set_Item(int32, !0)",
            ),
            ListCount => cil(
                "{0}\n\
                 callvirt instance int32 class [mscorlib]System.Collections.Generic.List`1<object>::get_Count()",
            ),
            ListRemoveAt => cil(
                "{0}\n{1}\n\
                 callvirt instance void class [mscorlib]System.Collections.Generic.List`1<object>::RemoveAt(int32)",
            ),
            ListClear => cil(
                "{0}\n\
                 callvirt instance void class [mscorlib]System.Collections.Generic.List`1<object>::Clear()",
            ),
            ListContains => cil(
                "{0}\n{1}\n\
                 callvirt instance bool class [mscorlib]System.Collections.Generic.List`1<object>::Contains(!0)",
            ),
            CreateDictionary => cil(
                "newobj instance void class [mscorlib]System.Collections.Generic.Dictionary`2<object, object>::.ctor()",
            ),
            DictSet => cil(
                "{0}\n{1}\n{2}\n\
                 callvirt instance void class [mscorlib]System.Collections.Generic.Dictionary`2<object, object>::set_Item(!0, !1)",
            ),
            DictGet => cil(
                "{0}\n{1}\n\
                 callvirt instance !1 class [mscorlib]System.Collections.Generic.Dictionary`2<object, object>::get_Item(!0)",
            ),
            DictContainsKey => cil(
                "{0}\n{1}\n\
                 callvirt instance bool class [mscorlib]System.Collections.Generic.Dictionary`2<object, object>::ContainsKey(!0)",
            ),
            DictRemove => cil(
                "{0}\n{1}\n\
                 callvirt instance bool class [mscorlib]System.Collections.Generic.Dictionary`2<object, object>::Remove(!0)\n\
                 pop",
            ),
            DictCount => cil(
                "{0}\n\
                 callvirt instance int32 class [mscorlib]System.Collections.Generic.Dictionary`2<object, object>::get_Count()",
            ),
            CreateSet => Rule::template(
                "newobj instance void class [System.Core]System.Collections.Generic.HashSet`1<object>::.ctor()",
            )
            .declares(SYSTEM_CORE),
            SetAdd => Rule::template(
                "{0}\n{1}\n\
                 callvirt instance bool class [System.Core]System.Collections.Generic.HashSet`1<object>::Add(!0)\n\
                 pop",
            )
            .declares(SYSTEM_CORE),
            SetContains => Rule::template(
                "{0}\n{1}\n\
                 callvirt instance bool class [System.Core]System.Collections.Generic.HashSet`1<object>::Contains(!0)",
            )
            .declares(SYSTEM_CORE),
            SetCount => Rule::template(
                "{0}\n\
                 callvirt instance int32 class [System.Core]System.Collections.Generic.HashSet`1<object>::get_Count()",
            )
            .declares(SYSTEM_CORE),

            // EnvironmentOps
            GetEnv => cil(
                "{0}\n\
                 call string [mscorlib]System.Environment::GetEnvironmentVariable(string)\n\
                 ldstr \"\"\n\
                 call string [mscorlib]System.String::Concat(string, string)",
            ),
            SetEnv => cil("{0}\n{1}\ncall void [mscorlib]System.Environment::SetEnvironmentVariable(string, string)"),
            CommandLine => cil("call string [mscorlib]System.Environment::get_CommandLine()"),

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

/// A template calling into `mscorlib`.
fn cil(template: &'static str) -> Rule {
    Rule::template(template).declares(MSCORLIB)
}

fn print_line(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    if e.optional(0).is_some() {
        e.push_arg(0)?;
        e.line("call void [mscorlib]System.Console::WriteLine(object)");
    } else {
        e.line("call void [mscorlib]System.Console::WriteLine()");
    }
    Ok(())
}

/// `ReadLine` returns null at end of input; concatenating `""` maps that
/// to an empty string without a branch.
fn input(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    if e.optional(0).is_some() {
        e.push_arg(0)?;
    } else {
        e.line("ldstr \"? \"");
    }
    e.line("call void [mscorlib]System.Console::Write(string)");
    e.line("call string [mscorlib]System.Console::ReadLine()");
    e.line("ldstr \"\"");
    e.line("call string [mscorlib]System.String::Concat(string, string)");
    Ok(())
}

fn color(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    e.push_arg(0)?;
    e.line("ldc.i4.s 15");
    e.line("and");
    e.line("call void [mscorlib]System.Console::set_ForegroundColor(valuetype [mscorlib]System.ConsoleColor)");
    if e.optional(1).is_some() {
        e.push_arg(1)?;
        e.line("ldc.i4.s 15");
        e.line("and");
        e.line("call void [mscorlib]System.Console::set_BackgroundColor(valuetype [mscorlib]System.ConsoleColor)");
    }
    Ok(())
}

/// `s.Substring(start - 1)`, or `__bl_mid(s, start - 1, length)`
fn mid(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    e.push_arg(0)?;
    e.push_arg(1)?;
    e.line("ldc.i4.1");
    e.line("sub");
    if e.optional(2).is_some() {
        e.push_arg(2)?;
        e.line("call string __bl_mid(string, int32, int32)");
    } else {
        e.line(SUBSTRING_FROM);
    }
    Ok(())
}

/// Mode 1 is `MidpointRounding.AwayFromZero`.
fn round(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    e.push_arg(0)?;
    if e.optional(1).is_some() {
        e.push_arg(1)?;
        e.line("ldc.i4.1");
        e.line("call float64 [mscorlib]System.Math::Round(float64, int32, valuetype [mscorlib]System.MidpointRounding)");
    } else {
        e.line("ldc.i4.1");
        e.line("call float64 [mscorlib]System.Math::Round(float64, valuetype [mscorlib]System.MidpointRounding)");
    }
    Ok(())
}

/// Without a seed the generator is reseeded from the tick count.
fn randomize(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    if e.optional(0).is_some() {
        e.push_arg(0)?;
    } else {
        e.line("call int32 [mscorlib]System.Environment::get_TickCount()");
    }
    e.line("call void __bl_randomize(int32)");
    Ok(())
}

fn cstr(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    e.push_arg(0)?;
    e.line(INVARIANT);
    e.line("call string [mscorlib]System.Convert::ToString(object, class [mscorlib]System.IFormatProvider)");
    Ok(())
}

fn ubound(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    bound(e, "GetUpperBound")
}

fn lbound(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
    bound(e, "GetLowerBound")
}

fn bound(e: &mut Emitter<'_>, method: &str) -> Result<(), LoweringError> {
    e.push_arg(0)?;
    if e.optional(1).is_some() {
        e.push_arg(1)?;
        e.line("ldc.i4.1");
        e.line("sub");
    } else {
        e.line("ldc.i4.0");
    }
    e.line(format!(
        "callvirt instance int32 [mscorlib]System.Array::{}(int32)",
        method
    ));
    Ok(())
}

impl LoweringProvider for BytecodeProvider {
    fn name(&self) -> &str {
        "bytecode"
    }

    fn backend(&self) -> Backend {
        Backend::Bytecode
    }

    fn handles(&self, intrinsic: Intrinsic) -> bool {
        Self::rule(intrinsic).is_some()
    }

    fn emit(&self, intrinsic: Intrinsic, call: &CallSite<'_>) -> Result<String, LoweringError> {
        Self::rule(intrinsic)
            .ok_or_else(|| unsupported(intrinsic, Backend::Bytecode))?
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
        BytecodeProvider.emit(intrinsic, &CallSite::new(&args)).unwrap()
    }

    #[test]
    fn test_cint_is_single_conversion_instruction() {
        assert_eq!(emit(Intrinsic::CInt, &["ldloc.0"]), "ldloc.0\nconv.i4");
        assert!(!emit(Intrinsic::CInt, &["ldloc.0"]).contains("call"));
    }

    #[test]
    fn test_mid_subtracts_one_from_start() {
        let text = emit(Intrinsic::Mid, &["ldloc.0", "ldc.i4.3"]);
        assert_eq!(
            text,
            "ldloc.0\nldc.i4.3\nldc.i4.1\nsub\n\
             callvirt instance string [mscorlib]System.String::Substring(int32)"
        );
        let text = emit(Intrinsic::Mid, &["ldloc.0", "ldc.i4.3", "ldc.i4.4"]);
        assert_eq!(
            text,
            "ldloc.0\nldc.i4.3\nldc.i4.1\nsub\nldc.i4.4\ncall string __bl_mid(string, int32, int32)"
        );
    }

    #[test]
    fn test_instr_adds_one() {
        let text = emit(Intrinsic::InStr, &["ldloc.0", "ldloc.1"]);
        assert!(text.contains("ldc.i4.4\n"));
        assert!(text.ends_with("ldc.i4.1\nadd"));
    }

    #[test]
    fn test_rnd_queries_shared_generator() {
        let text = emit(Intrinsic::Rnd, &[]);
        let get = text.find("__bl_random()").unwrap();
        let next = text.find("NextDouble()").unwrap();
        assert!(get < next);
        assert!(!text.contains(".ctor"));
    }

    #[test]
    fn test_randomize_reseeds_shared_generator() {
        assert_eq!(
            emit(Intrinsic::Randomize, &["ldc.i4.s 42"]),
            "ldc.i4.s 42\ncall void __bl_randomize(int32)"
        );
        assert!(emit(Intrinsic::Randomize, &[]).contains("get_TickCount()"));
        let rnd = BytecodeProvider.helper_definition(Intrinsic::Rnd).unwrap();
        assert_eq!(BytecodeProvider.helper_definition(Intrinsic::Randomize), Some(rnd));
        assert!(rnd.body.starts_with(".field static assembly class [mscorlib]System.Random"));
        assert!(rnd.body.contains("Random::.ctor(int32)"));
    }

    #[test]
    fn test_substrings_push_each_argument_once() {
        let text = emit(
            Intrinsic::Left,
            &["call string [mscorlib]System.Console::ReadLine()", "ldc.i4.3"],
        );
        assert_eq!(text.matches("ReadLine()").count(), 1);
        assert!(text.ends_with("call string __bl_left(string, int32)"));
        let right = emit(Intrinsic::Right, &["ldloc.0", "ldc.i4.2"]);
        assert_eq!(right.matches("ldloc.0").count(), 1);
    }

    #[test]
    fn test_asc_of_empty_string_is_zero() {
        assert_eq!(emit(Intrinsic::Asc, &["ldloc.0"]), "ldloc.0\ncall int32 __bl_asc(string)");
        let helper = BytecodeProvider.helper_definition(Intrinsic::Asc).unwrap();
        assert!(helper.body.contains("brtrue.s HAS_CHAR\n    ldc.i4.0\n    ret"));
    }

    #[test]
    fn test_generic_instantiation_inline() {
        let text = emit(Intrinsic::ListAdd, &["ldloc.0", "ldloc.1"]);
        assert!(text.contains("List`1<object>::Add(!0)"));
        assert_eq!(
            BytecodeProvider.required_declarations(Intrinsic::CreateSet),
            vec![".assembly extern mscorlib {}", ".assembly extern System.Core {}"]
        );
    }

    #[test]
    fn test_round_passes_away_from_zero_mode() {
        let text = emit(Intrinsic::Round, &["ldloc.0"]);
        assert_eq!(
            text,
            "ldloc.0\nldc.i4.1\n\
             call float64 [mscorlib]System.Math::Round(float64, valuetype [mscorlib]System.MidpointRounding)"
        );
    }

    #[test]
    fn test_helpers_are_global_methods() {
        for intrinsic in [
            Intrinsic::InKey,
            Intrinsic::Val,
            Intrinsic::Str,
            Intrinsic::Timer,
            Intrinsic::Asc,
        ] {
            let helper = BytecodeProvider.helper_definition(intrinsic).unwrap();
            assert!(helper.body.starts_with(".method assembly static"));
            assert!(helper.body.contains(helper.name));
        }
    }

    #[test]
    fn test_networking_absent() {
        assert!(!BytecodeProvider.handles(Intrinsic::HttpGet));
        assert!(BytecodeProvider.handles(Intrinsic::CommandLine));
    }
}
