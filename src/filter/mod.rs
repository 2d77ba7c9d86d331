//! Value filters applied to variables before substitution.

mod case;
mod pattern;

use std::fmt;

pub use case::{CaseStyle, CaseStyleFilter};
pub use pattern::RegexFilter;

use crate::{ConfigurationError, FilterError};

/// A pure `string -> string` transform with a load-time validity check.
///
/// [`FilterChain`] calls [`validate`](Self::validate) before the filter is
/// ever run, so configuration mistakes surface as errors when the installer
/// loads rather than as wrong output.
pub trait SubstitutionFilter: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the filter cannot work as configured.
    fn validate(&self) -> Result<(), ConfigurationError>;

    /// # Errors
    ///
    /// Returns [`FilterError`] if the filter was never validated and is
    /// unusable.
    fn filter(&self, value: &str) -> Result<String, FilterError>;
}

/// A filter named in a definition, e.g. `replace_all("\\s+", "-")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: String,
    pub args: Vec<String>,
}

impl FilterSpec {
    #[must_use]
    pub fn new(name: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            args: args.iter().map(|&a| a.to_owned()).collect(),
        }
    }

    /// Instantiate the filter this spec names. The result is not validated.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::UnknownFilter`] for an unrecognized name,
    /// [`ConfigurationError::FilterArity`] for a wrong argument count.
    pub fn build(&self) -> Result<Box<dyn SubstitutionFilter>, ConfigurationError> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        let filter: Box<dyn SubstitutionFilter> = match (self.name.as_str(), args.as_slice()) {
            ("case", [style]) => Box::new(CaseStyleFilter::from_name(style)),
            ("lowercase", []) => Box::new(CaseStyleFilter::new(CaseStyle::Lowercase)),
            ("uppercase", []) => Box::new(CaseStyleFilter::new(CaseStyle::Uppercase)),
            ("replace", [pattern, replacement]) => {
                Box::new(RegexFilter::replace(pattern, replacement))
            }
            ("replace_all", [pattern, replacement]) => {
                Box::new(RegexFilter::replace(pattern, replacement).global())
            }
            ("select", [pattern, template]) => Box::new(RegexFilter::select(pattern, template)),
            ("select", [pattern, template, default]) => {
                Box::new(RegexFilter::select(pattern, template).with_default(default))
            }
            (name, args) => return Err(arity_or_unknown(name, args.len())),
        };
        Ok(filter)
    }
}

fn arity_or_unknown(name: &str, actual: usize) -> ConfigurationError {
    let expected = match name {
        "case" => "1",
        "lowercase" | "uppercase" => "0",
        "replace" | "replace_all" => "2",
        "select" => "2 or 3",
        _ => {
            return ConfigurationError::UnknownFilter {
                name: name.to_owned(),
            }
        }
    };
    ConfigurationError::FilterArity {
        filter: name.to_owned(),
        expected: expected.to_owned(),
        actual,
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            let quoted: Vec<String> = self.args.iter().map(|a| format!("{a:?}")).collect();
            write!(f, "({})", quoted.join(", "))?;
        }
        Ok(())
    }
}

/// Ordered, validated sequence of filters. Filters run in insertion order.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn SubstitutionFilter>>,
}

impl FilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `filter` and append it.
    ///
    /// # Errors
    ///
    /// Returns the filter's validation error; the chain is left unchanged.
    pub fn push(&mut self, filter: Box<dyn SubstitutionFilter>) -> Result<(), ConfigurationError> {
        filter.validate()?;
        self.filters.push(filter);
        Ok(())
    }

    /// Builder form of [`push`](Self::push).
    ///
    /// # Errors
    ///
    /// Returns the filter's validation error.
    pub fn with(mut self, filter: impl SubstitutionFilter + 'static) -> Result<Self, ConfigurationError> {
        self.push(Box::new(filter))?;
        Ok(self)
    }

    /// Build and validate a chain from definition specs.
    ///
    /// # Errors
    ///
    /// Returns the first unknown, mis-called, or invalid filter.
    pub fn from_specs(specs: &[FilterSpec]) -> Result<Self, ConfigurationError> {
        let mut chain = Self::new();
        for spec in specs {
            chain.push(spec.build()?)?;
        }
        Ok(chain)
    }

    /// Run every filter in order.
    ///
    /// # Errors
    ///
    /// Returns the first [`FilterError`].
    pub fn apply(&self, value: &str) -> Result<String, FilterError> {
        let mut current = value.to_owned();
        for filter in &self.filters {
            current = filter.filter(&current)?;
        }
        Ok(current)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
