use std::io;

use installer_core::filter::{CaseStyle, CaseStyleFilter, RegexFilter};
use installer_core::{SubstitutionType, VariableStore, VariableSubstitutor};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let store = VariableStore::new()
        .with("APP_NAME", "Demo App")
        .with("INSTALL_PATH", "C:\\Program Files\\Démo")
        .with("VERSION", "4.2.0-beta");

    let properties = VariableSubstitutor::builder(store.clone())
        .substitution_type(SubstitutionType::JavaProperties)
        .filter("VERSION", RegexFilter::select(r"^(\d+\.\d+)", "$1"))
        .build()
        .expect("valid filters");

    let shell = VariableSubstitutor::builder(store)
        .substitution_type(SubstitutionType::Shell)
        .braces_required(true)
        .filter("APP_NAME", CaseStyleFilter::new(CaseStyle::Lowercase))
        .filter("APP_NAME", RegexFilter::replace(" ", "-").global())
        .build()
        .expect("valid filters");

    let template = "app=$APP_NAME\nhome=${INSTALL_PATH}\nversion=$VERSION\n";

    // Properties files are ISO-8859-1 unless told otherwise.
    println!("-- app.properties (ISO-8859-1 bytes, shown lossily)");
    let mut bytes = Vec::new();
    properties.substitute_stream(template.as_bytes(), &mut bytes, None)?;
    println!("{}", String::from_utf8_lossy(&bytes));

    println!("-- install.sh");
    let script = "#!/bin/sh\nmkdir -p \"${INSTALL_PATH}\"\necho $APP_NAME ${APP_NAME}\n";
    shell.substitute_stream(script.as_bytes(), io::stdout().lock(), None)?;
    Ok(())
}
