//! Per-backend provider registry.
//!
//! The registry maps each [`Backend`] to two ordered provider tiers.
//! Resolution consults the [`Priority::Specialized`] tier before the
//! [`Priority::General`] tier; within a tier the first registered provider
//! that handles a name wins.
//!
//! The registry is an ordinary value owned by the compiler driver. It is
//! populated once through [`LoweringRegistry::ensure_initialized`], which
//! takes `&mut self`, and is then shared as `&LoweringRegistry` by any
//! number of threads.

use std::collections::HashMap;

use crate::intrinsics::{Category, Intrinsic};
use crate::lowering::{
    Backend, BytecodeProvider, CallSite, EngineBindingProvider, HelperRoutine, IrProvider,
    LoweringError, LoweringProvider, ManagedProvider, NativeProvider,
};

/// Resolution tier of a registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Consulted first, e.g. engine bindings overriding general lowering.
    Specialized,
    /// The backend's general-purpose provider.
    General,
}

#[derive(Default)]
struct ProviderTiers {
    specialized: Vec<Box<dyn LoweringProvider>>,
    general: Vec<Box<dyn LoweringProvider>>,
}

impl ProviderTiers {
    fn iter(&self) -> impl Iterator<Item = &dyn LoweringProvider> {
        self.specialized
            .iter()
            .chain(self.general.iter())
            .map(|provider| provider.as_ref())
    }
}

/// Registry of lowering providers for every backend.
#[derive(Default)]
pub struct LoweringRegistry {
    backends: HashMap<Backend, ProviderTiers>,
    initialized: bool,
}

impl LoweringRegistry {
    /// Creates an empty registry. Nothing resolves until providers are
    /// registered or [`ensure_initialized`](Self::ensure_initialized) runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the standard providers.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.ensure_initialized();
        registry
    }

    /// Registers the standard providers. Calling this again is a no-op.
    ///
    /// Providers registered beforehand keep their position ahead of the
    /// standard ones in their tier.
    pub fn ensure_initialized(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        register_standard_providers(self);
        log::debug!(
            "lowering registry initialized: {}",
            Backend::ALL
                .iter()
                .map(|b| format!("{}={}", b, self.provider_count(*b)))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Adds a provider to its backend's tier, after any provider already
    /// registered there.
    pub fn register(&mut self, priority: Priority, provider: Box<dyn LoweringProvider>) {
        log::trace!(
            "registering {} provider `{}` ({:?})",
            provider.backend(),
            provider.name(),
            priority
        );
        let tiers = self.backends.entry(provider.backend()).or_default();
        match priority {
            Priority::Specialized => tiers.specialized.push(provider),
            Priority::General => tiers.general.push(provider),
        }
    }

    /// Number of providers registered for `backend`, across both tiers.
    pub fn provider_count(&self, backend: Backend) -> usize {
        self.backends
            .get(&backend)
            .map_or(0, |tiers| tiers.specialized.len() + tiers.general.len())
    }

    /// Finds the provider that lowers `name` on `backend`.
    pub fn resolve(&self, backend: Backend, name: &str) -> Option<&dyn LoweringProvider> {
        let intrinsic = Intrinsic::from_name(name)?;
        self.resolve_intrinsic(backend, intrinsic)
    }

    /// Enum form of [`resolve`](Self::resolve).
    pub fn resolve_intrinsic(
        &self,
        backend: Backend,
        intrinsic: Intrinsic,
    ) -> Option<&dyn LoweringProvider> {
        let provider = self
            .backends
            .get(&backend)?
            .iter()
            .find(|provider| provider.handles(intrinsic));
        if provider.is_none() {
            log::trace!("no {} provider handles `{}`", backend, intrinsic);
        }
        provider
    }

    /// Returns true if any provider on any backend claims `name`.
    pub fn is_intrinsic(&self, name: &str) -> bool {
        !self.backends_supporting(name).is_empty()
    }

    pub fn supports(&self, backend: Backend, name: &str) -> bool {
        self.resolve(backend, name).is_some()
    }

    /// Backends with a provider for `name`, in [`Backend::ALL`] order.
    pub fn backends_supporting(&self, name: &str) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|backend| self.supports(*backend, name))
            .collect()
    }

    /// Category of an intrinsic name. Categories belong to the catalog, so
    /// every backend agrees on them.
    pub fn category_of(&self, name: &str) -> Option<Category> {
        Intrinsic::from_name(name).map(Intrinsic::category)
    }

    /// Resolves `name` on `backend` or explains why it cannot be lowered.
    pub fn lookup(
        &self,
        backend: Backend,
        name: &str,
    ) -> Result<(Intrinsic, &dyn LoweringProvider), LoweringError> {
        let intrinsic = Intrinsic::from_name(name)
            .filter(|_| self.is_intrinsic(name))
            .ok_or_else(|| LoweringError::UnknownIntrinsic {
                name: name.to_string(),
            })?;
        let provider = self.resolve_intrinsic(backend, intrinsic).ok_or_else(|| {
            LoweringError::UnsupportedOnBackend {
                name: intrinsic.name().to_string(),
                backend,
            }
        })?;
        Ok((intrinsic, provider))
    }

    /// Lowers one call with argument fragments `args`.
    pub fn emit(
        &self,
        backend: Backend,
        name: &str,
        args: &[String],
    ) -> Result<String, LoweringError> {
        self.emit_call(backend, name, &CallSite::new(args))
    }

    /// Lowers one call. The argument count is checked against the catalog
    /// before the provider sees it.
    pub fn emit_call(
        &self,
        backend: Backend,
        name: &str,
        call: &CallSite<'_>,
    ) -> Result<String, LoweringError> {
        let (intrinsic, provider) = self.lookup(backend, name)?;
        let expected = intrinsic.arity();
        let found = call.args().len();
        if !expected.accepts(found) {
            return Err(LoweringError::ArityMismatch {
                name: intrinsic.name().to_string(),
                expected,
                found,
            });
        }
        provider.emit(intrinsic, call)
    }

    /// Preamble fragments `name` needs on `backend`; empty when unresolved.
    pub fn required_declarations(&self, backend: Backend, name: &str) -> Vec<String> {
        self.resolve_with(backend, name, |p, i| p.required_declarations(i))
            .unwrap_or_default()
    }

    /// Helper routine `name` needs on `backend`; `None` when unresolved.
    pub fn helper_definition(&self, backend: Backend, name: &str) -> Option<HelperRoutine> {
        self.resolve_with(backend, name, |p, i| p.helper_definition(i))
            .flatten()
    }

    /// Returns true if lowering `name` on `backend` links the BASIC runtime.
    pub fn requires_runtime(&self, backend: Backend, name: &str) -> bool {
        self.resolve_with(backend, name, |p, i| p.requires_runtime(i))
            .unwrap_or(false)
    }

    fn resolve_with<T>(
        &self,
        backend: Backend,
        name: &str,
        f: impl FnOnce(&dyn LoweringProvider, Intrinsic) -> T,
    ) -> Option<T> {
        let intrinsic = Intrinsic::from_name(name)?;
        let provider = self.resolve_intrinsic(backend, intrinsic)?;
        Some(f(provider, intrinsic))
    }
}

/// Canonical registration order:
///
/// 1. engine bindings, specialized tier of the managed backend
/// 2. one general provider per backend, in [`Backend::ALL`] order
fn register_standard_providers(registry: &mut LoweringRegistry) {
    registry.register(Priority::Specialized, Box::new(EngineBindingProvider));
    registry.register(Priority::General, Box::new(ManagedProvider));
    registry.register(Priority::General, Box::new(NativeProvider));
    registry.register(Priority::General, Box::new(IrProvider));
    registry.register(Priority::General, Box::new(BytecodeProvider));
}
