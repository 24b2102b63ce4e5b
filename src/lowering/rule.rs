//! Emission rules shared by all providers.
//!
//! A provider is an exhaustive `match` from [`Intrinsic`] to
//! `Option<Rule>`. A rule couples the lowering itself with the preamble it
//! needs:
//!
//! - [`Lowering::Template`] - an expression with `{0}`, `{1}`, ... argument
//!   slots and a `{r}` slot for the IR result register (`{{` and `}}` are
//!   literal braces)
//! - [`Lowering::Build`] - a function that writes lines through an
//!   [`Emitter`], used when optional arguments or instruction sequences make
//!   a flat template insufficient

use std::fmt::Display;

use crate::intrinsics::Intrinsic;
use crate::lowering::{Backend, CallSite, HelperRoutine, LoweringError};

/// Builds a call's text line by line.
pub(super) type BuildFn = fn(&mut Emitter<'_>) -> Result<(), LoweringError>;

/// How a rule produces its text.
pub(super) enum Lowering {
    Template(&'static str),
    Build(BuildFn),
}

/// One backend's rule for one intrinsic.
pub(super) struct Rule {
    lowering: Lowering,
    declarations: &'static [&'static str],
    helper: Option<HelperRoutine>,
    runtime: bool,
}

impl Rule {
    pub(super) fn template(template: &'static str) -> Self {
        Self::new(Lowering::Template(template))
    }

    pub(super) fn build(build: BuildFn) -> Self {
        Self::new(Lowering::Build(build))
    }

    fn new(lowering: Lowering) -> Self {
        Self {
            lowering,
            declarations: &[],
            helper: None,
            runtime: false,
        }
    }

    /// Preamble fragments, in the order they must appear.
    pub(super) fn declares(mut self, declarations: &'static [&'static str]) -> Self {
        self.declarations = declarations;
        self
    }

    pub(super) fn with_helper(mut self, helper: HelperRoutine) -> Self {
        self.helper = Some(helper);
        self
    }

    /// Marks the rule as calling into the BASIC runtime library.
    pub(super) fn needs_runtime(mut self) -> Self {
        self.runtime = true;
        self
    }

    pub(super) fn emit(
        &self,
        intrinsic: Intrinsic,
        call: &CallSite<'_>,
    ) -> Result<String, LoweringError> {
        let mut emitter = Emitter::new(intrinsic, *call);
        match self.lowering {
            Lowering::Template(template) => {
                let text = emitter.expand(template)?;
                emitter.line(text);
            }
            Lowering::Build(build) => build(&mut emitter)?,
        }
        Ok(emitter.finish())
    }

    pub(super) fn declarations(&self) -> Vec<String> {
        self.declarations.iter().map(|d| d.to_string()).collect()
    }

    pub(super) fn helper(&self) -> Option<HelperRoutine> {
        self.helper
    }

    pub(super) fn runtime(&self) -> bool {
        self.runtime
    }
}

/// The error a provider reports for an intrinsic it has no rule for.
pub(super) fn unsupported(intrinsic: Intrinsic, backend: Backend) -> LoweringError {
    LoweringError::UnsupportedOnBackend {
        name: intrinsic.name().to_string(),
        backend,
    }
}

/// Accumulates the lines of one emitted call.
pub(super) struct Emitter<'a> {
    intrinsic: Intrinsic,
    call: CallSite<'a>,
    lines: Vec<String>,
}

impl<'a> Emitter<'a> {
    fn new(intrinsic: Intrinsic, call: CallSite<'a>) -> Self {
        Self {
            intrinsic,
            call,
            lines: Vec::new(),
        }
    }

    /// Returns a required argument.
    pub(super) fn arg(&self, index: usize) -> Result<&'a str, LoweringError> {
        self.call
            .args()
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| LoweringError::ArityMismatch {
                name: self.intrinsic.name().to_string(),
                expected: self.intrinsic.arity(),
                found: self.call.args().len(),
            })
    }

    /// Returns an optional argument if the call site supplied it.
    pub(super) fn optional(&self, index: usize) -> Option<&'a str> {
        self.call.args().get(index).map(String::as_str)
    }

    pub(super) fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    /// Appends an argument fragment as-is (stack backends push arguments
    /// by emitting their instruction sequences in order).
    pub(super) fn push_arg(&mut self, index: usize) -> Result<(), LoweringError> {
        let arg = self.arg(index)?;
        self.line(arg);
        Ok(())
    }

    /// Expands `{n}` argument slots and the `{r}` result slot in `template`.
    pub(super) fn expand(&self, template: &str) -> Result<String, LoweringError> {
        let mut out = String::with_capacity(template.len() + 16);
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' if chars.peek() == Some(&'r') => {
                    chars.next();
                    if chars.next() != Some('}') {
                        return Err(self.invalid(0, "unterminated result slot"));
                    }
                    out.push_str(&self.result());
                }
                '{' if chars.peek().is_some_and(|d| d.is_ascii_digit()) => {
                    let mut index = 0usize;
                    while let Some(d) = chars.peek().and_then(|d| d.to_digit(10)) {
                        index = index * 10 + d as usize;
                        chars.next();
                    }
                    if chars.next() != Some('}') {
                        return Err(self.invalid(index + 1, "unterminated argument slot"));
                    }
                    out.push_str(self.arg(index)?);
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }

    /// `%{result}`: the register the fragment defines.
    pub(super) fn result(&self) -> String {
        format!("%{}", self.call.result())
    }

    /// `%{result}.{role}`: a fragment-local temporary.
    pub(super) fn temp(&self, role: &str) -> String {
        format!("%{}.{}", self.call.result(), role)
    }

    /// Emits `%{result}.{role} = {rhs}` and returns the temporary's name.
    pub(super) fn assign(&mut self, role: &str, rhs: impl Display) -> String {
        let temp = self.temp(role);
        self.line(format!("{} = {}", temp, rhs));
        temp
    }

    /// Emits `%{result} = {rhs}`.
    pub(super) fn define(&mut self, rhs: impl Display) {
        let result = self.result();
        self.line(format!("{} = {}", result, rhs));
    }

    /// Builds an [`LoweringError::InvalidArgument`] for this call.
    pub(super) fn invalid(&self, position: usize, message: impl Into<String>) -> LoweringError {
        LoweringError::InvalidArgument {
            name: self.intrinsic.name().to_string(),
            position,
            message: message.into(),
        }
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_template_expansion() {
        let args = args(&["s", "3"]);
        let rule = Rule::template("{0}.Substring({1} - 1)");
        let text = rule.emit(Intrinsic::Mid, &CallSite::new(&args)).unwrap();
        assert_eq!(text, "s.Substring(3 - 1)");
    }

    #[test]
    fn test_template_repeated_and_escaped_slots() {
        let args = args(&["a"]);
        let rule = Rule::template("{{ {0} + {0} }}");
        let text = rule.emit(Intrinsic::Len, &CallSite::new(&args)).unwrap();
        assert_eq!(text, "{ a + a }");
    }

    #[test]
    fn test_template_missing_argument_is_an_error() {
        let args = args(&["s"]);
        let rule = Rule::template("{0}.Substring({1})");
        let err = rule.emit(Intrinsic::Left, &CallSite::new(&args)).unwrap_err();
        assert!(matches!(err, LoweringError::ArityMismatch { found: 1, .. }));
    }

    #[test]
    fn test_template_result_slot() {
        let args = args(&["%s", "%n"]);
        let call = CallSite::new(&args).with_result("t1");
        let rule = Rule::template("{r} = call ptr @left(ptr {0}, i32 {1})");
        let text = rule.emit(Intrinsic::Left, &call).unwrap();
        assert_eq!(text, "%t1 = call ptr @left(ptr %s, i32 %n)");
    }

    #[test]
    fn test_build_lines_and_temporaries() {
        fn build(e: &mut Emitter<'_>) -> Result<(), LoweringError> {
            let start = e.assign("start", format!("sub i32 {}, 1", e.arg(0)?));
            e.define(format!("call ptr @f(i32 {})", start));
            Ok(())
        }
        let args = args(&["%n"]);
        let call = CallSite::new(&args).with_result("t3");
        let text = Rule::build(build).emit(Intrinsic::Mid, &call).unwrap();
        assert_eq!(
            text,
            "%t3.start = sub i32 %n, 1\n%t3 = call ptr @f(i32 %t3.start)"
        );
    }

    #[test]
    fn test_rule_metadata() {
        const HELPER: HelperRoutine = HelperRoutine {
            name: "h",
            body: "void h() {}",
        };
        let rule = Rule::template("h()")
            .declares(&["#include <string>"])
            .with_helper(HELPER)
            .needs_runtime();
        assert_eq!(rule.declarations(), vec!["#include <string>".to_string()]);
        assert_eq!(rule.helper(), Some(HELPER));
        assert!(rule.runtime());
    }
}
