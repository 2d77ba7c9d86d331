use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::parse::{self, ParsedDefinitions};
use crate::{
    ExternalPredicateResolver, InstallerError, PredicateRegistry, RulesEngine, SubstitutionType,
    VariableStore, VariableSubstitutor,
};

/// Options for [`Session`] construction.
#[derive(Clone)]
pub struct SessionOptions {
    pub substitution_type: SubstitutionType,
    pub braces_required: bool,
    pub resolver: Arc<dyn ExternalPredicateResolver>,
    /// When set, process environment variables are imported under this
    /// prefix before the declared defaults are applied.
    pub environment_prefix: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            substitution_type: SubstitutionType::Plain,
            braces_required: false,
            resolver: Arc::new(PredicateRegistry::new()),
            environment_prefix: None,
        }
    }
}

impl SessionOptions {
    #[must_use]
    pub fn substitution_type(mut self, kind: SubstitutionType) -> Self {
        self.substitution_type = kind;
        self
    }

    #[must_use]
    pub fn braces_required(mut self, required: bool) -> Self {
        self.braces_required = required;
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ExternalPredicateResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn environment_prefix(mut self, prefix: &str) -> Self {
        self.environment_prefix = Some(prefix.to_owned());
        self
    }
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("substitution_type", &self.substitution_type)
            .field("braces_required", &self.braces_required)
            .field("environment_prefix", &self.environment_prefix)
            .finish_non_exhaustive()
    }
}

/// A loaded definition document: one [`VariableStore`] shared by the rules
/// engine and the substitutor built from it.
///
/// # Example
///
/// ```
/// use installer_core::{Session, SessionOptions};
///
/// let session = Session::from_dsl(
///     r#"
///     variable os.name = "Linux"
///     variable APP = "Demo App" | lowercase | replace_all(" ", "-")
///     condition is_linux: $os.name ~= "linux"
///     "#,
///     SessionOptions::default(),
/// )
/// .unwrap();
///
/// assert!(session.engine().is_true("is_linux").unwrap());
/// assert_eq!(session.substitutor().substitute("/opt/$APP"), "/opt/demo-app");
///
/// session.store().set("os.name", "Windows");
/// assert!(!session.engine().is_true("is_linux").unwrap());
/// ```
#[derive(Debug)]
pub struct Session {
    store: VariableStore,
    engine: RulesEngine,
    substitutor: VariableSubstitutor,
}

impl Session {
    /// Parse `input` and build a session from it.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError`] on parse failure, on invalid conditions,
    /// or on unknown or invalid filters.
    pub fn from_dsl(input: &str, options: SessionOptions) -> Result<Self, InstallerError> {
        let parsed = parse::parse(input)?;
        Self::from_definitions(parsed, options)
    }

    /// Read a definition file and build a session from it.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError`] on I/O, parse, or validation failure.
    pub fn from_file(
        path: impl AsRef<Path>,
        options: SessionOptions,
    ) -> Result<Self, InstallerError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input, options)
    }

    /// Build a session from already parsed definitions.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError`] on invalid conditions or filters.
    pub fn from_definitions(
        parsed: ParsedDefinitions,
        options: SessionOptions,
    ) -> Result<Self, InstallerError> {
        let store = VariableStore::new();
        if let Some(prefix) = &options.environment_prefix {
            store.import_environment(prefix);
        }

        let mut substitutor = VariableSubstitutor::builder(store.clone())
            .substitution_type(options.substitution_type)
            .braces_required(options.braces_required);
        // A redeclared variable keeps only its last value and filter chain.
        let last: HashMap<&str, usize> = parsed
            .variables
            .iter()
            .enumerate()
            .map(|(i, variable)| (variable.name.as_str(), i))
            .collect();
        for (i, variable) in parsed.variables.iter().enumerate() {
            store.set(&variable.name, variable.value.as_str());
            if last.get(variable.name.as_str()) != Some(&i) {
                continue;
            }
            for spec in &variable.filters {
                substitutor = substitutor.filter_spec(&variable.name, spec);
            }
        }
        let substitutor = substitutor.build()?;

        let mut builder = RulesEngine::builder().resolver(options.resolver);
        for condition in parsed.conditions {
            builder = builder.with_condition(condition);
        }
        let engine = builder.build(store.clone())?;

        tracing::debug!(
            conditions = engine.len(),
            variables = parsed.variables.len(),
            "session loaded"
        );

        Ok(Self {
            store,
            engine,
            substitutor,
        })
    }

    /// Assemble a session from parts built elsewhere. Both the engine and the
    /// substitutor should read `store`.
    #[must_use]
    pub fn from_parts(
        store: VariableStore,
        engine: RulesEngine,
        substitutor: VariableSubstitutor,
    ) -> Self {
        Self {
            store,
            engine,
            substitutor,
        }
    }

    #[must_use]
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    #[must_use]
    pub fn engine(&self) -> &RulesEngine {
        &self.engine
    }

    #[must_use]
    pub fn substitutor(&self) -> &VariableSubstitutor {
        &self.substitutor
    }

    /// Take the parts apart.
    #[must_use]
    pub fn into_parts(self) -> (VariableStore, RulesEngine, VariableSubstitutor) {
        (self.store, self.engine, self.substitutor)
    }
}
