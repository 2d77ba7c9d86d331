use std::collections::BTreeSet;
use std::fmt;
use std::ops::Not;

use super::predicate::PredicateHandle;

/// Boolean expression tree describing a condition.
///
/// The variant set is closed. References to other conditions hold the
/// condition id, never the condition itself; the engine resolves them
/// through its table at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionExpr {
    Const(bool),
    Not(Box<ConditionExpr>),
    /// True when every member is true. Empty is true.
    And(Vec<ConditionExpr>),
    /// True when any member is true. Empty is false.
    Or(Vec<ConditionExpr>),
    Xor(Box<ConditionExpr>, Box<ConditionExpr>),
    Ref(String),
    VariableEquals {
        name: String,
        expected: String,
        case_sensitive: bool,
    },
    VariableContains {
        name: String,
        substring: String,
    },
    External(PredicateHandle),
}

impl ConditionExpr {
    /// Conjunction. Chained calls extend one flat `And` list.
    #[must_use]
    pub fn and(self, other: ConditionExpr) -> ConditionExpr {
        match self {
            ConditionExpr::And(mut members) => {
                members.push(other);
                ConditionExpr::And(members)
            }
            first => ConditionExpr::And(vec![first, other]),
        }
    }

    /// Disjunction. Chained calls extend one flat `Or` list.
    #[must_use]
    pub fn or(self, other: ConditionExpr) -> ConditionExpr {
        match self {
            ConditionExpr::Or(mut members) => {
                members.push(other);
                ConditionExpr::Or(members)
            }
            first => ConditionExpr::Or(vec![first, other]),
        }
    }

    #[must_use]
    pub fn xor(self, other: ConditionExpr) -> ConditionExpr {
        ConditionExpr::Xor(Box::new(self), Box::new(other))
    }

    /// Ids of every condition referenced anywhere in this tree.
    #[must_use]
    pub fn references(&self) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        collect_refs(self, &mut refs);
        refs
    }
}

fn collect_refs(expr: &ConditionExpr, refs: &mut BTreeSet<String>) {
    match expr {
        ConditionExpr::Ref(id) => {
            refs.insert(id.clone());
        }
        ConditionExpr::And(members) | ConditionExpr::Or(members) => {
            for member in members {
                collect_refs(member, refs);
            }
        }
        ConditionExpr::Xor(a, b) => {
            collect_refs(a, refs);
            collect_refs(b, refs);
        }
        ConditionExpr::Not(inner) => collect_refs(inner, refs),
        ConditionExpr::Const(_)
        | ConditionExpr::VariableEquals { .. }
        | ConditionExpr::VariableContains { .. }
        | ConditionExpr::External(_) => {}
    }
}

impl Not for ConditionExpr {
    type Output = ConditionExpr;

    fn not(self) -> ConditionExpr {
        ConditionExpr::Not(Box::new(self))
    }
}

impl From<bool> for ConditionExpr {
    fn from(value: bool) -> Self {
        ConditionExpr::Const(value)
    }
}

/// Renders in the definition DSL syntax.
impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionExpr::Const(b) => write!(f, "{b}"),
            ConditionExpr::Not(inner) => write!(f, "(NOT {inner})"),
            ConditionExpr::And(members) => write_list(f, members, "AND", "true"),
            ConditionExpr::Or(members) => write_list(f, members, "OR", "false"),
            ConditionExpr::Xor(a, b) => write!(f, "({a} XOR {b})"),
            ConditionExpr::Ref(id) => write!(f, "{id}"),
            ConditionExpr::VariableEquals {
                name,
                expected,
                case_sensitive,
            } => {
                let op = if *case_sensitive { "==" } else { "~=" };
                write!(f, "{} {op} {}", VariableToken(name), quote(expected))
            }
            ConditionExpr::VariableContains { name, substring } => {
                write!(f, "{} contains {}", VariableToken(name), quote(substring))
            }
            ConditionExpr::External(handle) => write!(f, "@{handle}"),
        }
    }
}

fn write_list(
    f: &mut fmt::Formatter<'_>,
    members: &[ConditionExpr],
    op: &str,
    empty: &str,
) -> fmt::Result {
    if members.is_empty() {
        return f.write_str(empty);
    }
    f.write_str("(")?;
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write!(f, "{member}")?;
    }
    f.write_str(")")
}

/// `$name`, or `${name}` when the name has characters a bare token cannot
/// carry.
struct VariableToken<'a>(&'a str);

impl fmt::Display for VariableToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bare = !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'));
        if bare {
            write!(f, "${}", self.0)
        } else {
            write!(f, "${{{}}}", self.0)
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Intermediate builder for variable tests.
/// Created by [`variable()`]; requires a test method to produce a [`ConditionExpr`].
#[derive(Debug, Clone)]
pub struct VariableExpr {
    name: String,
}

impl VariableExpr {
    /// Case-sensitive equality.
    #[must_use]
    pub fn eq(self, expected: &str) -> ConditionExpr {
        ConditionExpr::VariableEquals {
            name: self.name,
            expected: expected.to_owned(),
            case_sensitive: true,
        }
    }

    #[must_use]
    pub fn eq_ignore_case(self, expected: &str) -> ConditionExpr {
        ConditionExpr::VariableEquals {
            name: self.name,
            expected: expected.to_owned(),
            case_sensitive: false,
        }
    }

    #[must_use]
    pub fn neq(self, expected: &str) -> ConditionExpr {
        !self.eq(expected)
    }

    #[must_use]
    pub fn contains(self, substring: &str) -> ConditionExpr {
        ConditionExpr::VariableContains {
            name: self.name,
            substring: substring.to_owned(),
        }
    }
}

#[must_use]
pub fn variable(name: &str) -> VariableExpr {
    VariableExpr {
        name: name.to_owned(),
    }
}

#[must_use]
pub fn condition_ref(id: &str) -> ConditionExpr {
    ConditionExpr::Ref(id.to_owned())
}

#[must_use]
pub fn external(name: &str) -> ConditionExpr {
    ConditionExpr::External(PredicateHandle::new(name))
}

#[must_use]
pub fn all(members: impl IntoIterator<Item = ConditionExpr>) -> ConditionExpr {
    ConditionExpr::And(members.into_iter().collect())
}

#[must_use]
pub fn any(members: impl IntoIterator<Item = ConditionExpr>) -> ConditionExpr {
    ConditionExpr::Or(members.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_eq() {
        let expr = variable("os.name").eq("Linux");
        assert_eq!(
            expr,
            ConditionExpr::VariableEquals {
                name: "os.name".to_owned(),
                expected: "Linux".to_owned(),
                case_sensitive: true,
            }
        );
    }

    #[test]
    fn variable_eq_ignore_case() {
        match variable("os.name").eq_ignore_case("linux") {
            ConditionExpr::VariableEquals { case_sensitive, .. } => assert!(!case_sensitive),
            other => panic!("expected VariableEquals, got {other:?}"),
        }
    }

    #[test]
    fn neq_wraps_in_not() {
        match variable("x").neq("1") {
            ConditionExpr::Not(inner) => {
                assert!(matches!(*inner, ConditionExpr::VariableEquals { .. }));
            }
            other => panic!("expected Not, got {other:?}"),
        }
    }

    #[test]
    fn and_chaining_stays_flat() {
        let expr = condition_ref("a")
            .and(condition_ref("b"))
            .and(condition_ref("c"));
        assert_eq!(
            expr,
            ConditionExpr::And(vec![
                condition_ref("a"),
                condition_ref("b"),
                condition_ref("c"),
            ])
        );
    }

    #[test]
    fn or_inside_and_is_not_flattened() {
        let expr = condition_ref("a")
            .or(condition_ref("b"))
            .and(condition_ref("c"));
        match expr {
            ConditionExpr::And(members) => {
                assert_eq!(members.len(), 2);
                assert!(matches!(members[0], ConditionExpr::Or(_)));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn references_walks_whole_tree() {
        let expr = all([
            condition_ref("a"),
            !condition_ref("b"),
            condition_ref("c").xor(any([condition_ref("d"), condition_ref("a")])),
            variable("v").eq("x"),
            external("pred"),
        ]);
        let refs: Vec<String> = expr.references().into_iter().collect();
        assert_eq!(refs, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn display_uses_dsl_syntax() {
        let expr = variable("os.name")
            .eq_ignore_case("linux")
            .and(!external("gui.available"))
            .and(variable("packs").contains("docs \"extra\""));
        assert_eq!(
            expr.to_string(),
            r#"($os.name ~= "linux" AND (NOT @gui.available) AND $packs contains "docs \"extra\"")"#
        );
    }

    #[test]
    fn display_braces_unusual_names() {
        assert_eq!(
            variable("weird/name?").eq("x").to_string(),
            r#"${weird/name?} == "x""#
        );
        assert_eq!(variable("os-name.v2").eq("x").to_string(), r#"$os-name.v2 == "x""#);
    }

    #[test]
    fn display_empty_lists() {
        assert_eq!(all([]).to_string(), "true");
        assert_eq!(any([]).to_string(), "false");
    }
}
