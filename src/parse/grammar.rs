use winnow::ascii::{Caseless, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, separated};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::filter::FilterSpec;
use crate::{Condition, ConditionExpr, PredicateHandle};

use super::parser::{ParsedDefinitions, VariableDefinition};

const RESERVED: &[&str] = &[
    "and", "or", "xor", "not", "true", "false", "contains", "condition", "variable",
];

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Identifiers & keywords -------------------------------------------------

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Case-insensitive keyword not followed by another identifier character,
/// so `ANDROID` is an identifier and not `AND` + `ROID`.
fn keyword<'i>(kw: &'static str) -> impl FnMut(&mut &'i str) -> ModalResult<()> {
    move |input: &mut &'i str| {
        (Caseless(kw), not(one_of(is_ident_char)))
            .void()
            .parse_next(input)
    }
}

fn name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_alphanumeric() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

fn condition_id<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    name.verify(|id: &str| !RESERVED.iter().any(|kw| kw.eq_ignore_ascii_case(id)))
        .context(StrContext::Expected(StrContextValue::Description(
            "condition id",
        )))
        .parse_next(input)
}

fn variable_name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((
        delimited(
            '{',
            take_while(1.., |c: char| c != '}' && c != '{' && c != '$' && !c.is_whitespace()),
            '}',
        ),
        take_while(1.., is_ident_char),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "variable name",
    )))
    .parse_next(input)
}

// -- Literals ---------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn quoted(input: &mut &str) -> ModalResult<String> {
    ws.parse_next(input)?;
    string_literal
        .context(StrContext::Expected(StrContextValue::Description(
            "quoted string",
        )))
        .parse_next(input)
}

// -- Variable tests ---------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum TestOp {
    Equals,
    EqualsIgnoreCase,
    NotEquals,
    Contains,
}

fn test_op(input: &mut &str) -> ModalResult<TestOp> {
    ws.parse_next(input)?;
    alt((
        "==".value(TestOp::Equals),
        "~=".value(TestOp::EqualsIgnoreCase),
        "!=".value(TestOp::NotEquals),
        keyword("contains").value(TestOp::Contains),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "comparison operator",
    )))
    .parse_next(input)
}

fn variable_test(input: &mut &str) -> ModalResult<ConditionExpr> {
    '$'.parse_next(input)?;
    let name = cut_err(variable_name).parse_next(input)?.to_owned();
    let op = cut_err(test_op).parse_next(input)?;
    let operand = cut_err(quoted).parse_next(input)?;
    Ok(match op {
        TestOp::Equals => ConditionExpr::VariableEquals {
            name,
            expected: operand,
            case_sensitive: true,
        },
        TestOp::EqualsIgnoreCase => ConditionExpr::VariableEquals {
            name,
            expected: operand,
            case_sensitive: false,
        },
        TestOp::NotEquals => !ConditionExpr::VariableEquals {
            name,
            expected: operand,
            case_sensitive: true,
        },
        TestOp::Contains => ConditionExpr::VariableContains {
            name,
            substring: operand,
        },
    })
}

fn external_predicate(input: &mut &str) -> ModalResult<ConditionExpr> {
    '@'.parse_next(input)?;
    let handle = cut_err(take_while(1.., is_ident_char))
        .context(StrContext::Expected(StrContextValue::Description(
            "predicate name",
        )))
        .parse_next(input)?;
    Ok(ConditionExpr::External(PredicateHandle::new(handle)))
}

// -- Expressions (precedence: OR < XOR < AND < NOT < primary) ---------------

fn primary(input: &mut &str) -> ModalResult<ConditionExpr> {
    ws.parse_next(input)?;
    alt((
        delimited('(', expr, (ws, cut_err(')'))),
        variable_test,
        external_predicate,
        keyword("true").value(ConditionExpr::Const(true)),
        keyword("false").value(ConditionExpr::Const(false)),
        condition_id.map(|id: &str| ConditionExpr::Ref(id.to_owned())),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

fn unary(input: &mut &str) -> ModalResult<ConditionExpr> {
    ws.parse_next(input)?;
    if opt(keyword("not")).parse_next(input)?.is_some() {
        let inner = cut_err(unary).parse_next(input)?;
        Ok(!inner)
    } else {
        primary(input)
    }
}

fn flatten(
    first: ConditionExpr,
    rest: Vec<ConditionExpr>,
    list: fn(Vec<ConditionExpr>) -> ConditionExpr,
) -> ConditionExpr {
    if rest.is_empty() {
        return first;
    }
    let mut members = Vec::with_capacity(rest.len() + 1);
    members.push(first);
    members.extend(rest);
    list(members)
}

fn and_expr(input: &mut &str) -> ModalResult<ConditionExpr> {
    let first = unary(input)?;
    let rest: Vec<ConditionExpr> =
        repeat(0.., preceded((ws, keyword("and")), cut_err(unary))).parse_next(input)?;
    Ok(flatten(first, rest, ConditionExpr::And))
}

fn xor_expr(input: &mut &str) -> ModalResult<ConditionExpr> {
    let first = and_expr(input)?;
    let rest: Vec<ConditionExpr> =
        repeat(0.., preceded((ws, keyword("xor")), cut_err(and_expr))).parse_next(input)?;
    Ok(rest.into_iter().fold(first, ConditionExpr::xor))
}

fn or_expr(input: &mut &str) -> ModalResult<ConditionExpr> {
    let first = xor_expr(input)?;
    let rest: Vec<ConditionExpr> =
        repeat(0.., preceded((ws, keyword("or")), cut_err(xor_expr))).parse_next(input)?;
    Ok(flatten(first, rest, ConditionExpr::Or))
}

fn expr(input: &mut &str) -> ModalResult<ConditionExpr> {
    ws.parse_next(input)?;
    or_expr(input)
}

// -- Definitions ------------------------------------------------------------

fn condition_def(input: &mut &str) -> ModalResult<Definition> {
    ws.parse_next(input)?;
    keyword("condition").parse_next(input)?;
    ws.parse_next(input)?;

    let id = cut_err(condition_id).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err(':').parse_next(input)?;

    let body = cut_err(expr)
        .context(StrContext::Expected(StrContextValue::Description(
            "condition body",
        )))
        .parse_next(input)?;

    Ok(Definition::Condition(Condition::new(id, body)))
}

fn filter_args(input: &mut &str) -> ModalResult<Vec<String>> {
    delimited(
        (ws, '('),
        separated(0.., quoted, (ws, ',')),
        (ws, cut_err(')')),
    )
    .parse_next(input)
}

fn filter_call(input: &mut &str) -> ModalResult<FilterSpec> {
    ws.parse_next(input)?;
    let filter = name
        .context(StrContext::Expected(StrContextValue::Description(
            "filter name",
        )))
        .parse_next(input)?;
    let args = opt(filter_args).parse_next(input)?.unwrap_or_default();
    Ok(FilterSpec {
        name: filter.to_ascii_lowercase(),
        args,
    })
}

fn variable_def(input: &mut &str) -> ModalResult<Definition> {
    ws.parse_next(input)?;
    keyword("variable").parse_next(input)?;
    ws.parse_next(input)?;

    let name = cut_err(variable_name).parse_next(input)?.to_owned();

    ws.parse_next(input)?;
    cut_err('=').parse_next(input)?;
    let value = cut_err(quoted).parse_next(input)?;

    let filters: Vec<FilterSpec> =
        repeat(0.., preceded((ws, '|'), cut_err(filter_call))).parse_next(input)?;

    Ok(Definition::Variable(VariableDefinition {
        name,
        value,
        filters,
    }))
}

enum Definition {
    Condition(Condition),
    Variable(VariableDefinition),
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_definitions(input: &mut &str) -> ModalResult<ParsedDefinitions> {
    let mut conditions = Vec::new();
    let mut variables = Vec::new();

    let defs: Vec<Definition> = repeat(0.., alt((condition_def, variable_def))).parse_next(input)?;
    for def in defs {
        match def {
            Definition::Condition(condition) => conditions.push(condition),
            Definition::Variable(variable) => variables.push(variable),
        }
    }

    ws.parse_next(input)?;

    Ok(ParsedDefinitions {
        conditions,
        variables,
    })
}
