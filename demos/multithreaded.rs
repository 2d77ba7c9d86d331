use std::sync::Arc;
use std::thread;

use installer_core::{RulesEngine, VariableStore, condition_ref, variable};

fn main() {
    let store = VariableStore::new().with("os.name", "Linux");
    let engine = Arc::new(
        RulesEngine::builder()
            .condition("is_linux", variable("os.name").eq_ignore_case("linux"))
            .condition("docs", variable("packs").contains("docs"))
            .condition("linux_docs", condition_ref("is_linux").and(condition_ref("docs")))
            .build(store.clone())
            .expect("failed to build rules engine"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                // Each pass sees one consistent snapshot of the store.
                let mut pass = engine.pass();
                let result = pass.is_true("linux_docs").expect("known condition");
                println!(
                    "Thread {i}: linux_docs = {result} (store generation {})",
                    pass.snapshot().generation()
                );
            })
        })
        .collect();

    // Concurrent writers are fine; readers pick up whichever value they see.
    store.set("packs", "core,docs");

    for h in handles {
        h.join().unwrap();
    }
}
