//! Per-unit collection of declarations and helper routines.

use std::collections::HashSet;

use crate::lowering::{Backend, HelperRoutine, LoweringError, LoweringRegistry};

/// Everything one compilation unit needs ahead of its code.
///
/// Declarations are deduplicated by text and helpers by name, both keeping
/// first-seen order, so noting the same intrinsic from many call sites
/// yields each helper body once.
#[derive(Debug, Clone)]
pub struct UnitRequirements {
    backend: Backend,
    declarations: Vec<String>,
    seen_declarations: HashSet<String>,
    helpers: Vec<HelperRoutine>,
    seen_helpers: HashSet<&'static str>,
    runtime: bool,
}

impl UnitRequirements {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            declarations: Vec::new(),
            seen_declarations: HashSet::new(),
            helpers: Vec::new(),
            seen_helpers: HashSet::new(),
            runtime: false,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Records what a call to `name` needs on this unit's backend.
    pub fn note(&mut self, registry: &LoweringRegistry, name: &str) -> Result<(), LoweringError> {
        let (intrinsic, provider) = registry.lookup(self.backend, name)?;

        for declaration in provider.required_declarations(intrinsic) {
            if self.seen_declarations.insert(declaration.clone()) {
                self.declarations.push(declaration);
            }
        }
        if let Some(helper) = provider.helper_definition(intrinsic)
            && self.seen_helpers.insert(helper.name)
        {
            log::trace!("unit needs helper `{}`", helper.name);
            self.helpers.push(helper);
        }
        self.runtime |= provider.requires_runtime(intrinsic);
        Ok(())
    }

    pub fn declarations(&self) -> &[String] {
        &self.declarations
    }

    pub fn helpers(&self) -> &[HelperRoutine] {
        &self.helpers
    }

    /// Returns true if any noted intrinsic calls into the BASIC runtime.
    pub fn requires_runtime(&self) -> bool {
        self.runtime
    }

    /// Declarations one per line, then each helper body, separated by blank
    /// lines.
    pub fn render_preamble(&self) -> String {
        let mut sections = Vec::new();
        if !self.declarations.is_empty() {
            sections.push(self.declarations.join("\n"));
        }
        sections.extend(self.helpers.iter().map(|h| h.body.to_string()));
        let mut preamble = sections.join("\n\n");
        if !preamble.is_empty() {
            preamble.push('\n');
        }
        preamble
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_emitted_once_for_many_call_sites() {
        let registry = LoweringRegistry::standard();
        let mut unit = UnitRequirements::new(Backend::Ir);
        for _ in 0..5 {
            unit.note(&registry, "Rnd").unwrap();
        }
        assert_eq!(unit.helpers().len(), 1);
        assert_eq!(unit.render_preamble().matches("define internal double @__bl_rnd").count(), 1);
    }

    #[test]
    fn test_shared_helper_dedup_by_name() {
        let registry = LoweringRegistry::standard();
        let mut unit = UnitRequirements::new(Backend::Managed);
        unit.note(&registry, "Rnd").unwrap();
        unit.note(&registry, "Randomize").unwrap();
        assert_eq!(unit.helpers().len(), 1);
        assert_eq!(unit.helpers()[0].name, "__blRandom");
    }

    #[test]
    fn test_declarations_dedup_in_first_seen_order() {
        let registry = LoweringRegistry::standard();
        let mut unit = UnitRequirements::new(Backend::Managed);
        unit.note(&registry, "FileExists").unwrap();
        unit.note(&registry, "HttpGet").unwrap();
        unit.note(&registry, "ReadAllText").unwrap();
        assert_eq!(
            unit.declarations(),
            &["using System;", "using System.IO;", "using System.Net.Http;"]
        );
    }

    #[test]
    fn test_note_unsupported_is_an_error() {
        let registry = LoweringRegistry::standard();
        let mut unit = UnitRequirements::new(Backend::Native);
        let err = unit.note(&registry, "HttpGet").unwrap_err();
        assert!(matches!(err, LoweringError::UnsupportedOnBackend { .. }));
        assert!(unit.declarations().is_empty());
        assert_eq!(unit.render_preamble(), "");
    }

    #[test]
    fn test_runtime_requirement() {
        let registry = LoweringRegistry::standard();
        let mut unit = UnitRequirements::new(Backend::Ir);
        unit.note(&registry, "Abs").unwrap();
        assert!(!unit.requires_runtime());
        unit.note(&registry, "Left").unwrap();
        assert!(unit.requires_runtime());
    }
}
