mod condition;
mod engine;
mod error;
mod evaluation_report;
mod expr;
mod option;
mod predicate;
mod store;

pub use condition::Condition;
pub use engine::{EvaluationPass, RulesEngine, RulesEngineBuilder};
pub use error::{ConditionError, ConfigurationError, FilterError};
pub use evaluation_report::EvaluationReport;
pub use expr::{ConditionExpr, VariableExpr, all, any, condition_ref, external, variable};
pub use option::{Configurable, ConfigurationOption};
pub use predicate::{Diagnostic, ExternalPredicateResolver, PredicateHandle, PredicateRegistry};
pub use store::{Snapshot, VariableChange, VariableStore};

pub(crate) use predicate::invoke_guarded;
