use regex::{Regex, RegexBuilder};

use super::SubstitutionFilter;
use crate::{ConfigurationError, FilterError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Replace { replacement: String, global: bool },
    Select { template: String },
}

/// Regular-expression transform.
///
/// In replace mode the first match (or every match, see
/// [`global`](Self::global)) is replaced; `$1` and `${name}` refer to capture
/// groups. In select mode the template is expanded from the first match. If
/// nothing matches, the default value is returned when one is set, otherwise
/// the input.
#[derive(Debug, Clone)]
pub struct RegexFilter {
    pattern: String,
    mode: Mode,
    default: Option<String>,
    case_insensitive: bool,
    compiled: Result<Regex, String>,
}

impl RegexFilter {
    /// Replace the first match of `pattern` with `replacement`.
    #[must_use]
    pub fn replace(pattern: &str, replacement: &str) -> Self {
        Self::with_mode(
            pattern,
            Mode::Replace {
                replacement: replacement.to_owned(),
                global: false,
            },
        )
    }

    /// Expand `template` from the first match of `pattern`.
    #[must_use]
    pub fn select(pattern: &str, template: &str) -> Self {
        Self::with_mode(
            pattern,
            Mode::Select {
                template: template.to_owned(),
            },
        )
    }

    /// Replace every match instead of the first. No effect in select mode.
    #[must_use]
    pub fn global(mut self) -> Self {
        if let Mode::Replace { global, .. } = &mut self.mode {
            *global = true;
        }
        self
    }

    /// Value returned when the pattern does not match.
    #[must_use]
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_owned());
        self
    }

    #[must_use]
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self.compiled = compile(&self.pattern, true);
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn with_mode(pattern: &str, mode: Mode) -> Self {
        Self {
            pattern: pattern.to_owned(),
            mode,
            default: None,
            case_insensitive: false,
            compiled: compile(pattern, false),
        }
    }

    fn unmatched(&self, value: &str) -> String {
        self.default.clone().unwrap_or_else(|| value.to_owned())
    }
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| e.to_string())
}

impl SubstitutionFilter for RegexFilter {
    fn name(&self) -> &str {
        "regex"
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.compiled {
            Ok(_) => Ok(()),
            Err(message) => Err(ConfigurationError::InvalidPattern {
                pattern: self.pattern.clone(),
                message: message.clone(),
            }),
        }
    }

    fn filter(&self, value: &str) -> Result<String, FilterError> {
        let regex = self.compiled.as_ref().map_err(|message| FilterError::Unusable {
            filter: self.name().to_owned(),
            message: message.clone(),
        })?;

        match &self.mode {
            Mode::Replace { replacement, global } => {
                if !regex.is_match(value) {
                    return Ok(self.unmatched(value));
                }
                let replaced = if *global {
                    regex.replace_all(value, replacement.as_str())
                } else {
                    regex.replace(value, replacement.as_str())
                };
                Ok(replaced.into_owned())
            }
            Mode::Select { template } => match regex.captures(value) {
                Some(captures) => {
                    let mut selected = String::new();
                    captures.expand(template, &mut selected);
                    Ok(selected)
                }
                None => Ok(self.unmatched(value)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_first_and_all() {
        let first = RegexFilter::replace(r"\s+", "-");
        let all = RegexFilter::replace(r"\s+", "-").global();
        assert_eq!(first.filter("My  Cool App").unwrap(), "My-Cool App");
        assert_eq!(all.filter("My  Cool App").unwrap(), "My-Cool-App");
    }

    #[test]
    fn replace_with_groups() {
        let filter = RegexFilter::replace(r"(\d+)\.(\d+)", "$2.$1");
        assert_eq!(filter.filter("v1.2").unwrap(), "v2.1");
    }

    #[test]
    fn select_expands_template() {
        let filter = RegexFilter::select(r"(?P<major>\d+)\.(?P<minor>\d+)", "${major}x${minor}");
        assert_eq!(filter.filter("jdk-17.0.2").unwrap(), "17x0");
    }

    #[test]
    fn unmatched_uses_default_or_input() {
        let with_default = RegexFilter::select(r"\d+", "$0").with_default("none");
        let without = RegexFilter::select(r"\d+", "$0");
        assert_eq!(with_default.filter("abc").unwrap(), "none");
        assert_eq!(without.filter("abc").unwrap(), "abc");
        assert_eq!(
            RegexFilter::replace("x", "y").with_default("d").filter("abc").unwrap(),
            "d"
        );
    }

    #[test]
    fn case_insensitive_matching() {
        let filter = RegexFilter::replace("program files", "apps").case_insensitive();
        assert_eq!(filter.filter(r"C:\Program Files\App").unwrap(), r"C:\apps\App");
    }

    #[test]
    fn invalid_pattern_fails_validation() {
        let filter = RegexFilter::replace("(unclosed", "x");
        assert!(matches!(
            filter.validate(),
            Err(ConfigurationError::InvalidPattern { pattern, .. }) if pattern == "(unclosed"
        ));
        assert!(matches!(
            filter.filter("anything"),
            Err(FilterError::Unusable { .. })
        ));
    }
}
