use thiserror::Error;

use crate::parse::ParseError;
use crate::{ConditionError, ConfigurationError};

/// Unified error type covering parsing, condition registration,
/// configuration, and I/O.
///
/// Returned by convenience entry points like
/// [`Session::from_dsl()`](crate::Session::from_dsl) and
/// [`Session::from_file()`](crate::Session::from_file).
#[derive(Debug, Error)]
pub enum InstallerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
