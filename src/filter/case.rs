use std::fmt;
use std::str::FromStr;

use super::SubstitutionFilter;
use crate::{ConfigurationError, FilterError};

/// Letter case applied by a [`CaseStyleFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseStyle {
    Lowercase,
    Uppercase,
}

impl CaseStyle {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Lowercase => "lowercase",
            Self::Uppercase => "uppercase",
        }
    }

    /// Locale-independent Unicode case mapping.
    #[must_use]
    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Lowercase => value.to_lowercase(),
            Self::Uppercase => value.to_uppercase(),
        }
    }
}

impl FromStr for CaseStyle {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowercase" | "lower" => Ok(Self::Lowercase),
            "uppercase" | "upper" => Ok(Self::Uppercase),
            _ => Err(ConfigurationError::UnknownCaseStyle { name: s.to_owned() }),
        }
    }
}

impl fmt::Display for CaseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Style {
    Known(CaseStyle),
    Unknown(String),
}

/// Changes the letter case of a value.
///
/// A filter built from a name keeps the name as given; an unknown name is
/// reported by [`validate`](SubstitutionFilter::validate), not at
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseStyleFilter {
    style: Style,
}

impl CaseStyleFilter {
    #[must_use]
    pub fn new(style: CaseStyle) -> Self {
        Self {
            style: Style::Known(style),
        }
    }

    /// Filter for a case-insensitive style name such as `"lowercase"`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let style = match name.parse::<CaseStyle>() {
            Ok(style) => Style::Known(style),
            Err(_) => Style::Unknown(name.to_owned()),
        };
        Self { style }
    }

    /// The resolved style, `None` for an unknown name.
    #[must_use]
    pub fn style(&self) -> Option<CaseStyle> {
        match self.style {
            Style::Known(style) => Some(style),
            Style::Unknown(_) => None,
        }
    }
}

impl SubstitutionFilter for CaseStyleFilter {
    fn name(&self) -> &str {
        "case"
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.style {
            Style::Known(_) => Ok(()),
            Style::Unknown(name) => Err(ConfigurationError::UnknownCaseStyle { name: name.clone() }),
        }
    }

    fn filter(&self, value: &str) -> Result<String, FilterError> {
        match &self.style {
            Style::Known(style) => Ok(style.apply(value)),
            Style::Unknown(name) => Err(FilterError::Unimplemented {
                filter: self.name().to_owned(),
                detail: name.clone(),
            }),
        }
    }
}
