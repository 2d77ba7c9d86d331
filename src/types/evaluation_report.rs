use std::fmt;
use std::time::Duration;

use super::predicate::Diagnostic;

/// Detailed evaluation report returned by
/// [`RulesEngine::evaluate_detailed()`](super::engine::RulesEngine::evaluate_detailed).
///
/// Contains the result, which conditions were evaluated and which of those
/// were true, every soft-failure diagnostic, and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    condition: String,
    result: bool,
    evaluated: Vec<String>,
    satisfied: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        condition: String,
        result: bool,
        evaluated: Vec<(String, bool)>,
        diagnostics: Vec<Diagnostic>,
        duration: Duration,
    ) -> Self {
        let satisfied = evaluated
            .iter()
            .filter(|(_, value)| *value)
            .map(|(id, _)| id.clone())
            .collect();
        Self {
            condition,
            result,
            evaluated: evaluated.into_iter().map(|(id, _)| id).collect(),
            satisfied,
            diagnostics,
            duration,
        }
    }

    /// The condition that was asked about.
    #[must_use]
    pub fn condition(&self) -> &str {
        &self.condition
    }

    /// Same value [`RulesEngine::is_true()`](super::engine::RulesEngine::is_true) returns.
    #[must_use]
    pub fn result(&self) -> bool {
        self.result
    }

    /// Every condition evaluated, dependencies first.
    #[must_use]
    pub fn evaluated(&self) -> &[String] {
        &self.evaluated
    }

    /// Evaluated conditions that came out true, in evaluation order.
    #[must_use]
    pub fn satisfied(&self) -> &[String] {
        &self.satisfied
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.condition, self.result)?;
        write!(f, ", evaluated: [{}]", self.evaluated.join(", "))?;
        if !self.diagnostics.is_empty() {
            write!(f, ", diagnostics: {}", self.diagnostics.len())?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
