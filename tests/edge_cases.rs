use std::sync::Arc;

use installer_core::{
    Condition, ConditionError, ConditionExpr, Configurable, ConfigurationOption, Diagnostic,
    PredicateHandle, PredicateRegistry, RulesEngine, SubstitutionType, VariableStore,
    VariableSubstitutor, all, any, condition_ref, external, variable,
};

#[test]
fn single_condition_engine() {
    let engine = RulesEngine::builder()
        .condition("only", variable("x").eq("1"))
        .build(VariableStore::new().with("x", "1"))
        .unwrap();
    assert!(engine.is_true("only").unwrap());
}

#[test]
fn deeply_chained_dependencies() {
    // c0 <- c1 <- ... <- c25
    let store = VariableStore::new().with("x", "1");
    let mut builder = RulesEngine::builder().condition("c0", variable("x").eq("1"));
    for i in 1..26 {
        builder = builder.condition(&format!("c{i}"), condition_ref(&format!("c{}", i - 1)));
    }
    let engine = builder.build(store.clone()).unwrap();

    assert!(engine.is_true("c25").unwrap());
    store.set("x", "0");
    assert!(!engine.is_true("c25").unwrap());
    assert_eq!(engine.evaluation_order().unwrap().first(), Some(&"c0"));
}

#[test]
fn chain_registered_backwards() {
    // Every reference is forward at registration time.
    let mut engine = RulesEngine::new(VariableStore::new());
    for i in (1..10).rev() {
        engine
            .register(Condition::new(format!("c{i}"), !condition_ref(&format!("c{}", i - 1))))
            .unwrap();
    }
    assert!(engine.validate().is_err());
    engine.register(Condition::new("c0", true.into())).unwrap();
    engine.validate().unwrap();

    // Nine negations of true.
    assert!(!engine.is_true("c9").unwrap());
}

#[test]
fn wide_fan_in() {
    let mut builder = RulesEngine::builder();
    let mut store = VariableStore::new();
    for i in 0..100 {
        builder = builder.condition(&format!("leaf{i}"), variable(&format!("v{i}")).eq("on"));
        store = store.with(&format!("v{i}"), "on");
    }
    builder = builder.condition("everything", all((0..100).map(|i| condition_ref(&format!("leaf{i}")))));
    builder = builder.condition("something", any((0..100).map(|i| condition_ref(&format!("leaf{i}")))));
    let engine = builder.build(store.clone()).unwrap();

    assert!(engine.is_true("everything").unwrap());
    store.set("v42", "off");
    assert!(!engine.is_true("everything").unwrap());
    assert!(engine.is_true("something").unwrap());
    assert_eq!(engine.dependencies_of("everything").unwrap().len(), 100);
}

#[test]
fn empty_and_or() {
    let engine = RulesEngine::builder()
        .condition("all_of_nothing", ConditionExpr::And(vec![]))
        .condition("any_of_nothing", ConditionExpr::Or(vec![]))
        .build(VariableStore::new())
        .unwrap();
    assert!(engine.is_true("all_of_nothing").unwrap());
    assert!(!engine.is_true("any_of_nothing").unwrap());
}

#[test]
fn unset_variable_reads_as_empty() {
    let engine = RulesEngine::builder()
        .condition("empty", variable("missing").eq(""))
        .condition("not_x", variable("missing").neq("x"))
        .condition("contains_nothing", variable("missing").contains(""))
        .build(VariableStore::new())
        .unwrap();
    assert!(engine.is_true("empty").unwrap());
    assert!(engine.is_true("not_x").unwrap());
    assert!(engine.is_true("contains_nothing").unwrap());
}

#[test]
fn unicode_values_compare() {
    let store = VariableStore::new().with("lang", "Ελληνικά");
    let engine = RulesEngine::builder()
        .condition("greek", variable("lang").eq_ignore_case("ΕΛΛΗΝΙΚΆ"))
        .condition("exact", variable("lang").eq("ελληνικά"))
        .build(store)
        .unwrap();
    assert!(engine.is_true("greek").unwrap());
    assert!(!engine.is_true("exact").unwrap());
}

#[test]
fn unknown_condition_is_an_error() {
    let engine = RulesEngine::new(VariableStore::new());
    assert_eq!(
        engine.is_true("nope"),
        Err(ConditionError::UnknownCondition { id: "nope".into() })
    );
    assert!(engine.evaluate_detailed("nope").is_err());
}

#[test]
fn undefined_reference_is_false_with_diagnostic() {
    let mut engine = RulesEngine::new(VariableStore::new());
    engine
        .register(Condition::new("a", !condition_ref("ghost")))
        .unwrap();

    let report = engine.evaluate_detailed("a").unwrap();
    // NOT(false) is true: the missing condition reads as false.
    assert!(report.result());
    assert!(report.diagnostics().contains(&Diagnostic::UndefinedReference {
        condition: "a".into(),
        reference: "ghost".into(),
    }));
}

#[test]
fn failing_predicates_are_false() {
    let registry = PredicateRegistry::new()
        .register_fallible("broken", || Err("no display".into()))
        .register("boom", || panic!("predicate exploded"));
    let engine = RulesEngine::builder()
        .resolver(Arc::new(registry))
        .condition("broken", external("broken"))
        .condition("boom", external("boom"))
        .condition("unknown", external("unknown"))
        .condition("either", condition_ref("broken").or(condition_ref("boom")))
        .build(VariableStore::new())
        .unwrap();

    let mut pass = engine.pass();
    assert!(!pass.is_true("either").unwrap());
    assert!(!pass.is_true("unknown").unwrap());
    let diagnostics = pass.diagnostics();
    assert!(diagnostics.contains(&Diagnostic::Failed {
        name: "broken".into(),
        message: "no display".into(),
    }));
    assert!(diagnostics.contains(&Diagnostic::Panicked { name: "boom".into() }));
    assert!(diagnostics.contains(&Diagnostic::Unresolved {
        name: "unknown".into()
    }));
}

#[test]
fn resolver_reported_non_boolean_is_false() {
    let resolver = |handle: &PredicateHandle| -> Result<bool, Diagnostic> {
        match handle.name() {
            "arch.bits" => Err(Diagnostic::NotBoolean {
                name: handle.name().to_owned(),
            }),
            _ => Ok(true),
        }
    };
    let engine = RulesEngine::builder()
        .resolver(Arc::new(resolver))
        .condition("wide", external("arch.bits"))
        .condition("narrow", !condition_ref("wide"))
        .build(VariableStore::new())
        .unwrap();

    let report = engine.evaluate_detailed("narrow").unwrap();
    assert!(report.result());
    assert_eq!(
        report.diagnostics(),
        &[Diagnostic::NotBoolean {
            name: "arch.bits".into()
        }]
    );
}

#[test]
fn short_circuit_skips_predicates() {
    let registry = PredicateRegistry::new().register("boom", || panic!("must not run"));
    let engine = RulesEngine::builder()
        .resolver(Arc::new(registry))
        .condition("and", ConditionExpr::Const(false).and(external("boom")))
        .condition("or", ConditionExpr::Const(true).or(external("boom")))
        .build(VariableStore::new())
        .unwrap();

    let mut pass = engine.pass();
    assert!(!pass.is_true("and").unwrap());
    assert!(pass.is_true("or").unwrap());
    assert!(pass.diagnostics().is_empty());
}

#[test]
fn evaluate_detailed_reports_evaluated_conditions() {
    let store = VariableStore::new().with("age", "25").with("status", "active");
    let engine = RulesEngine::builder()
        .condition("adult", variable("age").neq(""))
        .condition("active", variable("status").eq("active"))
        .condition("blocked", variable("status").eq("blocked"))
        .condition("allowed", condition_ref("adult").and(condition_ref("active")))
        .build(store)
        .unwrap();

    let report = engine.evaluate_detailed("allowed").unwrap();
    assert!(report.result());
    assert_eq!(report.condition(), "allowed");
    for id in ["adult", "active", "allowed"] {
        assert!(report.evaluated().iter().any(|e| e == id), "{id} evaluated");
        assert!(report.satisfied().iter().any(|e| e == id), "{id} satisfied");
    }
    assert!(!report.evaluated().iter().any(|e| e == "blocked"));
}

#[test]
fn configuration_option_gated_by_condition() {
    let store = VariableStore::new().with("install.mode", "gui");
    let engine = RulesEngine::builder()
        .condition("gui", variable("install.mode").eq("gui"))
        .build(store.clone())
        .unwrap();
    let panel = Configurable::new()
        .with_option(
            "launcher",
            ConfigurationOption::new("desktop")
                .with_condition("gui")
                .with_default("none"),
        )
        .with_option("title", ConfigurationOption::new("Setup"))
        .with_option("splash", ConfigurationOption::new("splash.png").with_condition("gui"));

    assert_eq!(panel.option_value("launcher", Some(&engine)), Ok(Some("desktop")));
    store.set("install.mode", "console");
    assert_eq!(panel.option_value("launcher", Some(&engine)), Ok(Some("none")));
    assert_eq!(panel.option_value("splash", Some(&engine)), Ok(None));
    assert_eq!(panel.option_value("title", Some(&engine)), Ok(Some("Setup")));
    // Without an engine every option yields its configured value.
    assert_eq!(panel.option_value("splash", None), Ok(Some("splash.png")));
    assert_eq!(panel.option_value("absent", Some(&engine)), Ok(None));
}

#[test]
fn configuration_option_with_unknown_condition() {
    let engine = RulesEngine::new(VariableStore::new());
    let option = ConfigurationOption::new("x").with_condition("missing");
    assert_eq!(
        option.value(Some(&engine)),
        Err(ConditionError::UnknownCondition {
            id: "missing".into()
        })
    );
}

#[test]
fn substitution_edge_tokens() {
    let store = VariableStore::new()
        .with("HOME", "/home/me")
        .with("EMPTY", "")
        .with("名前", "taro");
    let sub = VariableSubstitutor::new(store);

    assert_eq!(sub.substitute(""), "");
    assert_eq!(sub.substitute("$"), "$");
    assert_eq!(sub.substitute("$$HOME"), "$/home/me");
    assert_eq!(sub.substitute("${}"), "${}");
    assert_eq!(sub.substitute("${HOME"), "${HOME");
    assert_eq!(sub.substitute("${ HOME}"), "${ HOME}");
    assert_eq!(sub.substitute("[$EMPTY]"), "[]");
    assert_eq!(sub.substitute("$HOME."), "/home/me.");
    assert_eq!(sub.substitute("${名前}@$名前"), "taro@taro");
    assert_eq!(sub.substitute("$UNKNOWN and ${UNKNOWN}"), "$UNKNOWN and ${UNKNOWN}");
}

#[test]
fn braces_required_ignores_bare_tokens() {
    let store = VariableStore::new().with("A", "1");
    let sub = VariableSubstitutor::builder(store)
        .substitution_type(SubstitutionType::Shell)
        .braces_required(true)
        .build()
        .unwrap();
    assert_eq!(sub.substitute("$A ${A}"), "$A 1");
}

#[test]
fn at_syntax_tokens() {
    let store = VariableStore::new().with("app.name", "Demo").with("VERSION", "2.1");
    let sub = VariableSubstitutor::builder(store)
        .substitution_type(SubstitutionType::At)
        .build()
        .unwrap();
    assert_eq!(sub.substitute("@app.name@ v@VERSION@"), "Demo v2.1");
    assert_eq!(sub.substitute("mail me@example.com"), "mail me@example.com");
    assert_eq!(sub.substitute("@missing@ $VERSION"), "@missing@ $VERSION");
}

#[test]
fn escaping_per_type() {
    let store = VariableStore::new().with("V", "a<b & c=d:\"e\"");
    let xml = VariableSubstitutor::builder(store.clone())
        .substitution_type(SubstitutionType::Xml)
        .build()
        .unwrap();
    assert_eq!(
        xml.substitute("<v>$V</v>"),
        "<v>a&lt;b &amp; c=d:&quot;e&quot;</v>"
    );

    let props = VariableSubstitutor::builder(store.clone())
        .substitution_type(SubstitutionType::JavaProperties)
        .build()
        .unwrap();
    assert_eq!(props.substitute("v=$V"), "v=a<b & c\\=d\\:\"e\"");

    for kind in [SubstitutionType::Plain, SubstitutionType::Shell, SubstitutionType::Ant] {
        let sub = VariableSubstitutor::builder(store.clone())
            .substitution_type(kind)
            .build()
            .unwrap();
        assert_eq!(sub.substitute("$V"), "a<b & c=d:\"e\"", "{kind}");
    }
}
