#![allow(dead_code)]

use std::sync::Arc;

use installer_core::{
    Condition, ConditionExpr, PredicateRegistry, RulesEngine, VariableStore, condition_ref,
    external, variable,
};
use proptest::prelude::*;

// --- Fixed variable schema ---
// os.name       : one of {"Linux", "Windows", "Mac OS X"}
// install.mode  : one of {"gui", "console", "unattended"}
// packs         : comma-separated subset of {"core", "docs", "samples"}
// arch          : one of {"amd64", "aarch64"} or unset

pub const OS_NAMES: &[&str] = &["Linux", "Windows", "Mac OS X"];
pub const MODES: &[&str] = &["gui", "console", "unattended"];
pub const PACKS: &[&str] = &["core", "docs", "samples"];
pub const ARCHES: &[&str] = &["amd64", "aarch64"];

// --- Fixed predicate set ---
pub const PREDICATES: &[&str] = &["p.yes", "p.no", "p.fails", "p.missing"];

/// Resolver matching [`PREDICATES`]: `p.missing` is never registered.
pub fn registry() -> Arc<PredicateRegistry> {
    Arc::new(
        PredicateRegistry::new()
            .register("p.yes", || true)
            .register("p.no", || false)
            .register_fallible("p.fails", || Err("probe failed".to_owned())),
    )
}

/// What the resolver from [`registry`] answers, with failures folded to `false`.
pub fn predicate_value(name: &str) -> bool {
    name == "p.yes"
}

/// Generate a store that aligns with the fixed variable schema.
pub fn arb_store() -> impl Strategy<Value = VariableStore> {
    (
        prop::sample::select(OS_NAMES),
        prop::sample::select(MODES),
        prop::sample::subsequence(PACKS.to_vec(), 0..=PACKS.len()),
        prop::option::of(prop::sample::select(ARCHES)),
    )
        .prop_map(|(os, mode, packs, arch)| {
            let store = VariableStore::new()
                .with("os.name", os)
                .with("install.mode", mode)
                .with("packs", packs.join(","));
            match arch {
                Some(arch) => store.with("arch", arch),
                None => store,
            }
        })
}

/// Generate a leaf test on a random variable from the schema.
fn arb_leaf_expr() -> impl Strategy<Value = ConditionExpr> {
    prop_oneof![
        (prop::sample::select(OS_NAMES), 0_u8..3).prop_map(|(os, op)| {
            let v = variable("os.name");
            match op {
                0 => v.eq(os),
                1 => v.eq_ignore_case(&os.to_lowercase()),
                _ => v.neq(os),
            }
        }),
        prop::sample::select(MODES).prop_map(|mode| variable("install.mode").eq(mode)),
        prop::sample::select(PACKS).prop_map(|pack| variable("packs").contains(pack)),
        prop::sample::select(ARCHES).prop_map(|arch| variable("arch").eq(arch)),
        prop::sample::select(PREDICATES).prop_map(external),
        any::<bool>().prop_map(ConditionExpr::Const),
    ]
}

/// Generate a composite expression tree (AND, OR, XOR, NOT of leaves), bounded depth.
pub fn arb_expr(max_depth: u32) -> impl Strategy<Value = ConditionExpr> {
    arb_leaf_expr().prop_recursive(max_depth, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..=3).prop_map(ConditionExpr::And),
            prop::collection::vec(inner.clone(), 0..=3).prop_map(ConditionExpr::Or),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.xor(b)),
            inner.prop_map(|e| !e),
        ]
    })
}

/// A generated condition set whose references only point backwards, so it
/// is always acyclic.
#[derive(Debug, Clone)]
pub struct GenConditionSet {
    pub conditions: Vec<Condition>,
}

impl GenConditionSet {
    /// Register every condition into an engine reading `store`.
    ///
    /// # Panics
    ///
    /// Panics if the generated set fails to validate (should not happen with
    /// valid generators).
    #[must_use]
    pub fn build(&self, store: VariableStore) -> RulesEngine {
        let mut builder = RulesEngine::builder().resolver(registry());
        for condition in &self.conditions {
            builder = builder.with_condition(condition.clone());
        }
        builder.build(store).expect("generated condition set should validate")
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(Condition::id)
    }
}

/// Generate a condition set with variable tests only, no references.
pub fn arb_flat_set() -> impl Strategy<Value = GenConditionSet> {
    prop::collection::vec(arb_expr(2), 1..=8).prop_map(|exprs| GenConditionSet {
        conditions: exprs
            .into_iter()
            .enumerate()
            .map(|(i, expr)| Condition::new(format!("leaf_{i}"), expr))
            .collect(),
    })
}

/// Generate a condition set with chained references.
///
/// Leaf conditions test variables only; each chained condition combines two
/// earlier conditions (leaf or chained) with one of the binary operators,
/// optionally mixed with a fresh leaf expression and optionally negated.
pub fn arb_chained_set() -> impl Strategy<Value = GenConditionSet> {
    (2_usize..=5, 1_usize..=5).prop_flat_map(|(n_leaves, n_chained)| {
        let leaves = prop::collection::vec(arb_expr(1), n_leaves);
        let links = prop::collection::vec(
            (
                any::<prop::sample::Index>(),
                any::<prop::sample::Index>(),
                0_u8..3,
                prop::option::of(arb_leaf_expr()),
                any::<bool>(),
            ),
            n_chained,
        );
        (leaves, links).prop_map(|(leaf_exprs, links)| {
            let mut conditions: Vec<Condition> = leaf_exprs
                .into_iter()
                .enumerate()
                .map(|(i, expr)| Condition::new(format!("leaf_{i}"), expr))
                .collect();
            for (i, (a, b, op, extra, negate)) in links.into_iter().enumerate() {
                let ref_a = condition_ref(conditions[a.index(conditions.len())].id());
                let ref_b = condition_ref(conditions[b.index(conditions.len())].id());
                let mut combined = match op {
                    0 => ref_a.and(ref_b),
                    1 => ref_a.or(ref_b),
                    _ => ref_a.xor(ref_b),
                };
                if let Some(extra) = extra {
                    combined = combined.and(extra);
                }
                if negate {
                    combined = !combined;
                }
                conditions.push(Condition::new(format!("chain_{i}"), combined));
            }
            GenConditionSet { conditions }
        })
    })
}

/// Generate a chained set, then shuffle registration order so forward
/// references occur.
pub fn arb_shuffled_set() -> impl Strategy<Value = GenConditionSet> {
    arb_chained_set().prop_flat_map(|set| {
        Just(set.conditions)
            .prop_shuffle()
            .prop_map(|conditions| GenConditionSet { conditions })
    })
}

/// Generate plain text interleaved with `$NAME `, `${NAME}` and malformed
/// `${` / `${}` tokens over the variable schema. No generated value contains
/// `$`, so substituting the output again changes nothing.
pub fn arb_template() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-zA-Z /:=,.-]{0,12}",
        prop::sample::select(&["os.name", "install.mode", "packs", "arch", "unknown"][..])
            .prop_map(|name| format!("${{{name}}}")),
        prop::sample::select(&["os.name", "packs", "arch", "unknown"][..])
            .prop_map(|name| format!("${name} ")),
        Just("${".to_owned()),
        Just("${}".to_owned()),
    ];
    prop::collection::vec(piece, 0..10).prop_map(|pieces| pieces.concat())
}
