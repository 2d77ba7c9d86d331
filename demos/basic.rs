use installer_core::{RulesEngine, VariableStore, condition_ref, variable};

fn main() {
    let store = VariableStore::new()
        .with("os.name", "Linux")
        .with("install.mode", "gui");

    // Define conditions
    let engine = RulesEngine::builder()
        .condition("is_linux", variable("os.name").eq_ignore_case("linux"))
        .condition("gui_mode", variable("install.mode").eq("gui"))
        .condition(
            "desktop_shortcut",
            condition_ref("is_linux").and(condition_ref("gui_mode")),
        )
        .build(store.clone())
        .expect("failed to build rules engine");

    println!("{engine}");
    println!(
        "desktop_shortcut: {}",
        engine.is_true("desktop_shortcut").expect("known condition")
    );

    // Variable changes are picked up on the next query.
    store.set("install.mode", "console");
    println!(
        "desktop_shortcut after switching to console: {}",
        engine.is_true("desktop_shortcut").expect("known condition")
    );
}
