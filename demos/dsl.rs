use std::sync::Arc;

use installer_core::{PredicateRegistry, Session, SessionOptions};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = PredicateRegistry::new().register("headless", || false);
    let session = Session::from_file(
        "demos/installer.conf",
        SessionOptions::default().resolver(Arc::new(registry)),
    )
    .expect("failed to load definitions");

    println!("{}", session.engine());
    for (id, result) in session.engine().evaluate_all().expect("acyclic") {
        println!("  {id:<20} {result}");
    }

    println!();
    println!(
        "{}",
        session
            .substitutor()
            .substitute("Installing $APP_NAME ${VERSION} into ${INSTALL_PATH}/${APP_ID}")
    );
}
