//! Whole-program backend compatibility check.
//!
//! Before lowering a program for a backend, the driver collects every
//! intrinsic call site and asks which of them the backend cannot lower.
//! All problems are reported in one pass instead of stopping at the first.
//!
//! ## Example
//!
//! ```
//! use qblower::compat::check_source;
//! use qblower::lowering::{Backend, LoweringRegistry};
//!
//! let registry = LoweringRegistry::standard();
//! let diagnostics = check_source(&registry, Backend::Native, "x$ = HttpGet(url$)");
//!
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].error.name(), "HttpGet");
//! ```

use thiserror::Error;

use crate::intrinsics::Intrinsic;
use crate::lexer::scan_call_sites;
use crate::lowering::{Backend, LoweringError, LoweringRegistry};
use crate::span::Span;

/// One intrinsic call found in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSiteRef {
    /// The name as written, e.g. `Left$`.
    pub name: String,
    pub span: Span,
    /// Number of arguments, or `None` when the call is statement-form and
    /// its arguments cannot be counted from tokens alone.
    pub arg_count: Option<usize>,
}

impl CallSiteRef {
    pub fn new(name: impl Into<String>, span: Span, arg_count: usize) -> Self {
        Self {
            name: name.into(),
            span,
            arg_count: Some(arg_count),
        }
    }

    /// A call whose argument count is unknown.
    pub fn statement(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
            arg_count: None,
        }
    }
}

/// A lowering error attached to the call site that caused it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}..{}: {}", .span.start, .span.end, .error)]
pub struct Diagnostic {
    pub span: Span,
    pub error: LoweringError,
}

impl Diagnostic {
    /// Formats the diagnostic as `file:line:col: error: message`.
    pub fn render(&self, file: &str, source: &str) -> String {
        let (line, col) = self.span.line_col(source);
        format!("{}:{}:{}: error: {}", file, line, col, self.error)
    }
}

/// Checks every call site against `backend`.
///
/// Names that are not intrinsics are ignored, since they are user
/// procedures. Known intrinsics with no provider on `backend` yield
/// [`LoweringError::UnsupportedOnBackend`]; counted calls outside the
/// declared arity yield [`LoweringError::ArityMismatch`]. Diagnostics come
/// back in the order of `sites`.
pub fn check_compatibility(
    registry: &LoweringRegistry,
    backend: Backend,
    sites: &[CallSiteRef],
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for site in sites {
        let intrinsic = match registry.lookup(backend, &site.name) {
            Ok((intrinsic, _)) => intrinsic,
            Err(LoweringError::UnknownIntrinsic { .. }) => continue,
            Err(error) => {
                diagnostics.push(Diagnostic {
                    span: site.span,
                    error,
                });
                continue;
            }
        };

        if let Some(found) = site.arg_count
            && let Some(error) = arity_error(intrinsic, found)
        {
            diagnostics.push(Diagnostic {
                span: site.span,
                error,
            });
        }
    }

    log::debug!(
        "{} of {} call sites incompatible with the {} backend",
        diagnostics.len(),
        sites.len(),
        backend
    );
    diagnostics
}

/// Scans `source` and checks the call sites found against `backend`.
pub fn check_source(registry: &LoweringRegistry, backend: Backend, source: &str) -> Vec<Diagnostic> {
    check_compatibility(registry, backend, &scan_call_sites(source, registry))
}

fn arity_error(intrinsic: Intrinsic, found: usize) -> Option<LoweringError> {
    let expected = intrinsic.arity();
    (!expected.accepts(found)).then(|| LoweringError::ArityMismatch {
        name: intrinsic.name().to_string(),
        expected,
        found,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(name: &str, start: usize, count: Option<usize>) -> CallSiteRef {
        let span = Span::new(start, start + name.len());
        match count {
            Some(n) => CallSiteRef::new(name, span, n),
            None => CallSiteRef::statement(name, span),
        }
    }

    #[test]
    fn test_reports_every_unsupported_site_in_order() {
        let registry = LoweringRegistry::standard();
        let sites = vec![
            site("HttpGet", 0, Some(1)),
            site("Len", 20, Some(1)),
            site("Shell", 40, Some(1)),
        ];
        let diagnostics = check_compatibility(&registry, Backend::Native, &sites);
        let names: Vec<_> = diagnostics.iter().map(|d| d.error.name()).collect();
        assert_eq!(names, vec!["HttpGet", "Shell"]);
        assert_eq!(diagnostics[1].span.start, 40);
    }

    #[test]
    fn test_unknown_names_ignored() {
        let registry = LoweringRegistry::standard();
        let sites = vec![site("MySub", 0, Some(2))];
        assert!(check_compatibility(&registry, Backend::Ir, &sites).is_empty());
    }

    #[test]
    fn test_arity_checked_only_when_counted() {
        let registry = LoweringRegistry::standard();
        let sites = vec![site("Len", 0, Some(2)), site("Len", 10, None)];
        let diagnostics = check_compatibility(&registry, Backend::Managed, &sites);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0].error,
            LoweringError::ArityMismatch { found: 2, .. }
        ));
    }

    #[test]
    fn test_unsupported_wins_over_arity() {
        let registry = LoweringRegistry::standard();
        let sites = vec![site("HttpGet", 0, Some(5))];
        let diagnostics = check_compatibility(&registry, Backend::Native, &sites);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0].error,
            LoweringError::UnsupportedOnBackend { backend: Backend::Native, .. }
        ));
    }

    #[test]
    fn test_engine_calls_only_on_managed() {
        let registry = LoweringRegistry::standard();
        let source = "InitWindow(800, 450, \"demo\")\nClearBackground(0)";
        assert!(check_source(&registry, Backend::Managed, source).is_empty());
        assert_eq!(check_source(&registry, Backend::Bytecode, source).len(), 2);
    }

    #[test]
    fn test_render() {
        let source = "CLS\nx$ = HttpGet(u$)";
        let registry = LoweringRegistry::standard();
        let diagnostics = check_source(&registry, Backend::Native, source);
        assert_eq!(
            diagnostics[0].render("demo.bas", source),
            "demo.bas:2:6: error: intrinsic `HttpGet` is not supported on the native backend"
        );
    }
}
