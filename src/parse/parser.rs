use crate::filter::FilterSpec;
use crate::Condition;

/// A `variable` declaration: default value plus the filters applied when the
/// variable is substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDefinition {
    pub name: String,
    pub value: String,
    pub filters: Vec<FilterSpec>,
}

/// The result of parsing a definition document, in source order.
#[derive(Debug)]
pub struct ParsedDefinitions {
    pub conditions: Vec<Condition>,
    pub variables: Vec<VariableDefinition>,
}
