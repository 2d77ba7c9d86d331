//! Evaluation core for an installer builder: a rules engine over named
//! boolean conditions and a variable substitution pipeline, both reading one
//! shared [`VariableStore`].
//!
//! ```
//! use installer_core::{RulesEngine, VariableStore, VariableSubstitutor, variable};
//!
//! let store = VariableStore::new()
//!     .with("os.name", "linux")
//!     .with("INSTALL_PATH", "/opt/demo");
//!
//! let engine = RulesEngine::builder()
//!     .condition("is_linux", variable("os.name").eq("linux"))
//!     .build(store.clone())
//!     .unwrap();
//! let sub = VariableSubstitutor::new(store);
//!
//! assert!(engine.is_true("is_linux").unwrap());
//! assert_eq!(sub.substitute("cd ${INSTALL_PATH}/bin"), "cd /opt/demo/bin");
//! ```

mod compile;
mod error;
mod evaluate;
pub mod filter;
mod graph;
pub mod parse;
mod session;
pub mod substitute;
mod types;

pub use error::InstallerError;
pub use graph::{BreadthFirst, ConditionGraph};
pub use session::{Session, SessionOptions};
pub use substitute::{Encoding, SubstitutingReader, SubstitutionType, SubstitutorBuilder, VariableSubstitutor};
pub use types::{
    Condition, ConditionError, ConditionExpr, Configurable, ConfigurationError,
    ConfigurationOption, Diagnostic, EvaluationPass, EvaluationReport, ExternalPredicateResolver,
    FilterError, PredicateHandle, PredicateRegistry, RulesEngine, RulesEngineBuilder, Snapshot,
    VariableChange, VariableExpr, VariableStore, all, any, condition_ref, external, variable,
};
