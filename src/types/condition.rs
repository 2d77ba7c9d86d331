use std::collections::BTreeSet;

use super::expr::ConditionExpr;

/// A named condition. Dependencies are derived from the expression and cannot
/// drift from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    id: String,
    expr: ConditionExpr,
    dependencies: BTreeSet<String>,
}

impl Condition {
    #[must_use]
    pub fn new(id: impl Into<String>, expr: ConditionExpr) -> Self {
        let dependencies = expr.references();
        Self {
            id: id.into(),
            expr,
            dependencies,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn expr(&self) -> &ConditionExpr {
        &self.expr
    }

    /// Ids of the conditions this one refers to.
    #[must_use]
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }
}
