use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

/// Opaque reference to an installer-supplied predicate.
///
/// The core never interprets the name; it is handed to an
/// [`ExternalPredicateResolver`] which decides what it means.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateHandle(String);

impl PredicateHandle {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PredicateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Explains why a condition or predicate evaluated to `false` instead of
/// producing a real answer. Never surfaced as a hard error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("external predicate '{name}' could not be resolved")]
    Unresolved { name: String },

    #[error("external predicate '{name}' failed: {message}")]
    Failed { name: String, message: String },

    /// Reported by resolvers whose predicates yield a non-boolean value.
    /// The core never produces it.
    #[error("external predicate '{name}' did not return a boolean")]
    NotBoolean { name: String },

    #[error("external predicate '{name}' panicked")]
    Panicked { name: String },

    #[error("condition '{condition}' references undefined condition '{reference}'")]
    UndefinedReference { condition: String, reference: String },
}

/// Capability supplied by the embedding installer to evaluate external
/// predicates.
///
/// Implementations may fail for any reason; every failure is treated as
/// `false` by the engine and reported as a [`Diagnostic`].
pub trait ExternalPredicateResolver: Send + Sync {
    /// Evaluate the predicate named by `handle`.
    ///
    /// # Errors
    ///
    /// Returns a [`Diagnostic`] when the predicate is unknown or cannot
    /// produce a boolean.
    fn invoke(&self, handle: &PredicateHandle) -> Result<bool, Diagnostic>;
}

impl<F> ExternalPredicateResolver for F
where
    F: Fn(&PredicateHandle) -> Result<bool, Diagnostic> + Send + Sync,
{
    fn invoke(&self, handle: &PredicateHandle) -> Result<bool, Diagnostic> {
        self(handle)
    }
}

type PredicateFn = Box<dyn Fn() -> Result<bool, String> + Send + Sync>;

/// Closure-backed resolver keyed by predicate name.
///
/// # Example
///
/// ```
/// use installer_core::{ExternalPredicateResolver, PredicateHandle, PredicateRegistry};
///
/// let registry = PredicateRegistry::new().register("always", || true);
/// assert_eq!(registry.invoke(&PredicateHandle::new("always")), Ok(true));
/// assert!(registry.invoke(&PredicateHandle::new("missing")).is_err());
/// ```
#[derive(Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, PredicateFn>,
}

impl PredicateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an infallible predicate.
    #[must_use]
    pub fn register(
        self,
        name: &str,
        predicate: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        self.register_fallible(name, move || Ok(predicate()))
    }

    /// Register a predicate that can fail with a message.
    #[must_use]
    pub fn register_fallible(
        mut self,
        name: &str,
        predicate: impl Fn() -> Result<bool, String> + Send + Sync + 'static,
    ) -> Self {
        self.predicates.insert(name.to_owned(), Box::new(predicate));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("PredicateRegistry")
            .field("predicates", &names)
            .finish()
    }
}

impl ExternalPredicateResolver for PredicateRegistry {
    fn invoke(&self, handle: &PredicateHandle) -> Result<bool, Diagnostic> {
        let predicate = self
            .predicates
            .get(handle.name())
            .ok_or_else(|| Diagnostic::Unresolved {
                name: handle.name().to_owned(),
            })?;
        predicate().map_err(|message| Diagnostic::Failed {
            name: handle.name().to_owned(),
            message,
        })
    }
}

/// Invoke a predicate, folding every failure mode (including a panic inside
/// the resolver) into `Err`.
pub(crate) fn invoke_guarded(
    resolver: &dyn ExternalPredicateResolver,
    handle: &PredicateHandle,
) -> Result<bool, Diagnostic> {
    match panic::catch_unwind(AssertUnwindSafe(|| resolver.invoke(handle))) {
        Ok(result) => result,
        Err(_) => Err(Diagnostic::Panicked {
            name: handle.name().to_owned(),
        }),
    }
}
