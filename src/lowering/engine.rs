//! Engine binding: marshals engine calls to the managed wrapper class.

use crate::intrinsics::Intrinsic;
use crate::lowering::rule::{unsupported, Rule};
use crate::lowering::{Backend, CallSite, HelperRoutine, LoweringError, LoweringProvider};

const RAYLIB: &[&str] = &["using Raylib_cs;"];

/// Pass-through lowering of [`Category::EngineBinding`](crate::intrinsics::Category)
/// intrinsics for the managed backend.
///
/// Registered in the specialized tier, so it answers before
/// [`ManagedProvider`](super::ManagedProvider) for every name it claims.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineBindingProvider;

impl EngineBindingProvider {
    fn rule(intrinsic: Intrinsic) -> Option<Rule> {
        use Intrinsic::*;

        let template = match intrinsic {
            InitWindow => "Raylib.InitWindow({0}, {1}, {2})",
            CloseWindow => "Raylib.CloseWindow()",
            WindowShouldClose => "Raylib.WindowShouldClose()",
            BeginDrawing => "Raylib.BeginDrawing()",
            EndDrawing => "Raylib.EndDrawing()",
            ClearBackground => "Raylib.ClearBackground(Raylib.GetColor((uint)({0})))",
            DrawText => {
                "Raylib.DrawText({0}, {1}, {2}, {3}, Raylib.GetColor((uint)({4})))"
            }
            Print | PrintLine | Input | ReadLine => return None,
            Cls | Locate | Color | Beep | InKey => return None,
            FileExists | ReadAllText | WriteAllText | AppendAllText | DeleteFile
            | DirectoryExists | CreateDirectory => return None,
            Len | Left | Right | Mid | InStr | UCase | LCase | Trim | LTrim | RTrim | Replace
            | Chr | Asc | Space | StrReverse => return None,
            Abs | Sqr | Sin | Cos | Tan | Atn | Log | Exp | Int | Fix | Sgn | Round | Min | Max
            | Pow | Rnd | Randomize => return None,
            CInt | CLng | CDbl | CStr | CBool | Val | Str | Hex => return None,
            UBound | LBound | ArraySort | ArrayReverse => return None,
            Now | Timer | Year | Month | Day => return None,
            CreateList | ListAdd | ListGet | ListSet | ListCount | ListRemoveAt | ListClear
            | ListContains | CreateDictionary | DictSet | DictGet | DictContainsKey
            | DictRemove | DictCount | CreateSet | SetAdd | SetContains | SetCount => return None,
            HttpGet | HttpPost | TcpConnect | TcpSend | TcpReceive | TcpClose => return None,
            JsonSerialize | JsonDeserialize => return None,
            RegexMatch | RegexReplace | RegexFind => return None,
            GetEnv | SetEnv | CommandLine => return None,
            Shell | Sleep | ExitProcess => return None,
            Md5 | Sha256 | NewGuid => return None,
        };
        Some(Rule::template(template).declares(RAYLIB))
    }
}

impl LoweringProvider for EngineBindingProvider {
    fn name(&self) -> &str {
        "engine-binding"
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

    fn helper_definition(&self, _intrinsic: Intrinsic) -> Option<HelperRoutine> {
        None
    }
}
