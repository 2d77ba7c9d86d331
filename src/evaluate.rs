use std::collections::HashMap;

use crate::types::invoke_guarded;
use crate::{Condition, ConditionExpr, Diagnostic, ExternalPredicateResolver, Snapshot};

/// Per-pass memo slot for one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemoState {
    Unvisited,
    InProgress,
    Done(bool),
}

/// Evaluates conditions against one snapshot, memoizing each condition's
/// result so it runs at most once while `memo` lives.
pub(crate) struct Evaluator<'a> {
    conditions: &'a [Condition],
    index: &'a HashMap<String, usize>,
    snapshot: &'a Snapshot,
    resolver: &'a dyn ExternalPredicateResolver,
    memo: &'a mut [MemoState],
    diagnostics: &'a mut Vec<Diagnostic>,
    evaluated: &'a mut Vec<usize>,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        conditions: &'a [Condition],
        index: &'a HashMap<String, usize>,
        snapshot: &'a Snapshot,
        resolver: &'a dyn ExternalPredicateResolver,
        memo: &'a mut [MemoState],
        diagnostics: &'a mut Vec<Diagnostic>,
        evaluated: &'a mut Vec<usize>,
    ) -> Self {
        Self {
            conditions,
            index,
            snapshot,
            resolver,
            memo,
            diagnostics,
            evaluated,
        }
    }

    /// Truth of the condition at `idx`, computed once per memo.
    pub(crate) fn condition(&mut self, idx: usize) -> bool {
        let conditions = self.conditions;
        let condition = &conditions[idx];
        // Registration rejects cycles, so a condition is never re-entered.
        debug_assert!(
            !matches!(self.memo[idx], MemoState::InProgress),
            "condition '{}' re-entered during evaluation",
            condition.id()
        );
        match self.memo[idx] {
            MemoState::Done(result) => return result,
            MemoState::InProgress => return false,
            MemoState::Unvisited => {}
        }

        self.memo[idx] = MemoState::InProgress;
        let result = self.expr(condition.expr(), condition.id());
        self.memo[idx] = MemoState::Done(result);
        self.evaluated.push(idx);
        tracing::trace!(condition = condition.id(), result, "condition evaluated");
        result
    }

    fn expr(&mut self, expr: &ConditionExpr, owner: &str) -> bool {
        match expr {
            ConditionExpr::Const(value) => *value,
            ConditionExpr::Not(inner) => !self.expr(inner, owner),
            // Members run left to right; external predicates may observe order.
            ConditionExpr::And(members) => members.iter().all(|m| self.expr(m, owner)),
            ConditionExpr::Or(members) => members.iter().any(|m| self.expr(m, owner)),
            ConditionExpr::Xor(a, b) => {
                let a = self.expr(a, owner);
                let b = self.expr(b, owner);
                a != b
            }
            ConditionExpr::Ref(id) => match self.index.get(id) {
                Some(&idx) => self.condition(idx),
                None => {
                    self.report(Diagnostic::UndefinedReference {
                        condition: owner.to_owned(),
                        reference: id.clone(),
                    });
                    false
                }
            },
            ConditionExpr::VariableEquals {
                name,
                expected,
                case_sensitive,
            } => {
                let actual = self.snapshot.get_or_empty(name);
                if *case_sensitive {
                    actual == expected
                } else {
                    actual.to_lowercase() == expected.to_lowercase()
                }
            }
            ConditionExpr::VariableContains { name, substring } => self
                .snapshot
                .get_or_empty(name)
                .contains(substring.as_str()),
            ConditionExpr::External(handle) => {
                match invoke_guarded(self.resolver, handle) {
                    Ok(value) => value,
                    Err(diagnostic) => {
                        self.report(diagnostic);
                        false
                    }
                }
            }
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(%diagnostic, "condition evaluated to false");
        self.diagnostics.push(diagnostic);
    }
}
