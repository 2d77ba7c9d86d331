use thiserror::Error;

/// Errors raised while registering, validating or querying conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("duplicate condition id '{id}'")]
    DuplicateCondition { id: String },

    #[error("undefined condition reference '{reference}' in condition '{condition}'")]
    UndefinedReference { condition: String, reference: String },

    #[error("cyclic condition reference detected: {}", path.join(" -> "))]
    CyclicReference { path: Vec<String> },

    #[error("unknown condition '{id}'")]
    UnknownCondition { id: String },
}

/// Errors in installer configuration that must abort construction before
/// anything is evaluated or substituted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unknown case style '{name}'")]
    UnknownCaseStyle { name: String },

    #[error("unknown filter '{name}'")]
    UnknownFilter { name: String },

    #[error("filter '{filter}' expects {expected} argument(s), got {actual}")]
    FilterArity {
        filter: String,
        expected: String,
        actual: usize,
    },

    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown substitution type '{name}'")]
    UnknownSubstitutionType { name: String },

    #[error("unknown encoding '{name}'")]
    UnknownEncoding { name: String },
}

/// Raised by a filter invoked without a usable configuration. Validation at
/// load time makes this unreachable for filters built through a chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("filter '{filter}' has no implementation for '{detail}'")]
    Unimplemented { filter: String, detail: String },

    #[error("filter '{filter}' cannot run: {message}")]
    Unusable { filter: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_condition_message() {
        let err = ConditionError::DuplicateCondition {
            id: "is_linux".into(),
        };
        assert_eq!(err.to_string(), "duplicate condition id 'is_linux'");
    }

    #[test]
    fn undefined_reference_message() {
        let err = ConditionError::UndefinedReference {
            condition: "can_install".into(),
            reference: "nonexistent".into(),
        };
        assert_eq!(
            err.to_string(),
            "undefined condition reference 'nonexistent' in condition 'can_install'"
        );
    }

    #[test]
    fn cyclic_reference_message() {
        let err = ConditionError::CyclicReference {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic condition reference detected: a -> b -> a"
        );
    }

    #[test]
    fn unknown_condition_message() {
        let err = ConditionError::UnknownCondition { id: "ghost".into() };
        assert_eq!(err.to_string(), "unknown condition 'ghost'");
    }

    #[test]
    fn unknown_case_style_message() {
        let err = ConfigurationError::UnknownCaseStyle {
            name: "titlecase".into(),
        };
        assert_eq!(err.to_string(), "unknown case style 'titlecase'");
    }

    #[test]
    fn filter_arity_message() {
        let err = ConfigurationError::FilterArity {
            filter: "replace".into(),
            expected: "2".into(),
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "filter 'replace' expects 2 argument(s), got 1"
        );
    }
}
