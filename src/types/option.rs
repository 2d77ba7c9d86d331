use std::collections::BTreeMap;

use super::engine::RulesEngine;
use super::error::ConditionError;

/// A value that only applies while a condition holds.
///
/// # Example
///
/// ```
/// use installer_core::{ConfigurationOption, RulesEngine, VariableStore, variable};
///
/// let store = VariableStore::new().with("mode", "console");
/// let engine = RulesEngine::builder()
///     .condition("gui", variable("mode").eq("gui"))
///     .build(store)
///     .unwrap();
///
/// let layout = ConfigurationOption::new("wide")
///     .with_condition("gui")
///     .with_default("narrow");
///
/// assert_eq!(layout.value(Some(&engine)).unwrap(), Some("narrow"));
/// assert_eq!(layout.value(None).unwrap(), Some("wide"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationOption {
    value: String,
    condition: Option<String>,
    default: Option<String>,
}

impl ConfigurationOption {
    /// An unconditional option.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            condition: None,
            default: None,
        }
    }

    /// Gate the value on condition `id`.
    #[must_use]
    pub fn with_condition(mut self, id: impl Into<String>) -> Self {
        self.condition = Some(id.into());
        self
    }

    /// Value returned when the condition is false.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn raw_value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn condition(&self) -> Option<&str> {
        self.condition.as_deref()
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Effective value. Without an engine or without a condition this is the
    /// configured value; otherwise the condition picks between value and
    /// default.
    ///
    /// # Errors
    ///
    /// [`ConditionError::UnknownCondition`] if the gating condition is not
    /// registered with `rules`.
    pub fn value(&self, rules: Option<&RulesEngine>) -> Result<Option<&str>, ConditionError> {
        let (Some(rules), Some(condition)) = (rules, self.condition.as_deref()) else {
            return Ok(Some(&self.value));
        };
        if rules.is_true(condition)? {
            Ok(Some(&self.value))
        } else {
            Ok(self.default.as_deref())
        }
    }
}

/// Named [`ConfigurationOption`]s belonging to one installer entity, such as
/// a panel or a pack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configurable {
    options: BTreeMap<String, ConfigurationOption>,
}

impl Configurable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace option `name` (builder form).
    #[must_use]
    pub fn with_option(mut self, name: &str, option: ConfigurationOption) -> Self {
        self.set_option(name, option);
        self
    }

    pub fn set_option(&mut self, name: &str, option: ConfigurationOption) -> Option<ConfigurationOption> {
        self.options.insert(name.to_owned(), option)
    }

    #[must_use]
    pub fn option(&self, name: &str) -> Option<&ConfigurationOption> {
        self.options.get(name)
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Effective value of option `name`; `None` when no such option exists.
    ///
    /// # Errors
    ///
    /// Propagates [`ConfigurationOption::value`] failures.
    pub fn option_value(
        &self,
        name: &str,
        rules: Option<&RulesEngine>,
    ) -> Result<Option<&str>, ConditionError> {
        match self.options.get(name) {
            Some(option) => option.value(rules),
            None => Ok(None),
        }
    }
}
