use std::collections::HashMap;

use crate::graph::ConditionGraph;
use crate::{Condition, ConditionError};

/// Checks a condition may join the table: unique id, no self-reference, and no
/// dependency that can already reach back to it.
///
/// Dependencies that are not registered yet are allowed here; the closing
/// [`check_references`] pass rejects them if they never show up.
pub(crate) fn check_registration(
    condition: &Condition,
    index: &HashMap<String, usize>,
    graph: &ConditionGraph,
) -> Result<(), ConditionError> {
    let id = condition.id();
    if index.contains_key(id) {
        return Err(ConditionError::DuplicateCondition { id: id.to_owned() });
    }

    for dep in condition.dependencies() {
        if dep == id {
            return Err(ConditionError::CyclicReference {
                path: vec![id.to_owned(), id.to_owned()],
            });
        }
        if let Some(back) = graph.path(dep, id) {
            let mut path = Vec::with_capacity(back.len() + 1);
            path.push(id.to_owned());
            path.extend(back);
            return Err(ConditionError::CyclicReference { path });
        }
    }
    Ok(())
}

/// Every referenced id must name a registered condition.
pub(crate) fn check_references(
    conditions: &[Condition],
    index: &HashMap<String, usize>,
) -> Result<(), ConditionError> {
    for condition in conditions {
        for dep in condition.dependencies() {
            if !index.contains_key(dep) {
                return Err(ConditionError::UndefinedReference {
                    condition: condition.id().to_owned(),
                    reference: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Indices of registered conditions with every dependency ahead of its
/// dependents. Vertices that were only ever referenced are skipped.
pub(crate) fn evaluation_order(
    graph: &ConditionGraph,
    index: &HashMap<String, usize>,
) -> Result<Vec<usize>, ConditionError> {
    let sorted = graph
        .topological_order()
        .map_err(|path| ConditionError::CyclicReference { path })?;
    Ok(sorted
        .iter()
        .filter_map(|id| index.get(id).copied())
        .collect())
}
