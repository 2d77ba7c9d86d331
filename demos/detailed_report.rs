use std::sync::Arc;

use installer_core::{PredicateRegistry, RulesEngine, VariableStore, condition_ref, external, variable};

fn main() {
    let registry = PredicateRegistry::new()
        .register("user.is_admin", || false)
        .register_fallible("display.available", || Err("no DISPLAY set".to_owned()));

    let engine = RulesEngine::builder()
        .resolver(Arc::new(registry))
        .condition("is_linux", variable("os.name").eq_ignore_case("linux"))
        .condition("has_display", external("display.available"))
        .condition("system_wide", external("user.is_admin"))
        .condition("docs_selected", variable("packs").contains("docs"))
        .condition(
            "install_menu_entry",
            condition_ref("is_linux")
                .and(condition_ref("has_display").or(condition_ref("system_wide")))
                .and(condition_ref("docs_selected")),
        )
        .build(
            VariableStore::new()
                .with("os.name", "Linux")
                .with("packs", "core,docs"),
        )
        .expect("failed to build rules engine");

    let report = engine
        .evaluate_detailed("install_menu_entry")
        .expect("known condition");

    println!("{report}");
    println!();
    println!("Evaluation order: {:?}", engine.evaluation_order().expect("acyclic"));
    println!("Conditions evaluated: {:?}", report.evaluated());
    println!("Conditions that were true: {:?}", report.satisfied());
    for diagnostic in report.diagnostics() {
        println!("Diagnostic: {diagnostic}");
    }
    println!("Duration: {:?}", report.duration());
}
