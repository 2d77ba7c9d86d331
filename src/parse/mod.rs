//! Text format for condition and variable definitions.

mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::{ParsedDefinitions, VariableDefinition};

/// Parse a definition document into a [`ParsedDefinitions`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not valid definition syntax.
pub fn parse(input: &str) -> Result<ParsedDefinitions, ParseError> {
    use winnow::Parser;
    grammar::parse_definitions
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}
