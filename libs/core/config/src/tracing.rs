use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Install color-eyre as the report handler for `main`'s errors.
///
/// Repeated calls are ignored.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Directives used when `RUST_LOG` is unset. Statement logging from sqlx stays
/// at warn unless asked for.
fn default_directives(environment: &Environment) -> &'static str {
    match environment {
        Environment::Production => "info,tower_http=info,sea_orm=warn,sqlx=warn",
        Environment::Development => "debug,tower_http=debug,sea_orm=info,sqlx=warn",
    }
}

fn output_layer(environment: &Environment) -> Box<dyn Layer<Registry> + Send + Sync> {
    match environment {
        Environment::Production => fmt::layer()
            .json()
            .with_target(false)
            .flatten_event(true)
            .boxed(),
        Environment::Development => fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .pretty()
            .boxed(),
    }
}

/// Install the global subscriber: JSON lines in production, pretty output in
/// development, plus [`tracing_error::ErrorLayer`] for span traces in reports.
///
/// A second call leaves the first subscriber in place.
pub fn init_tracing(environment: &Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)));

    let installed = tracing_subscriber::registry()
        .with(output_layer(environment))
        .with(tracing_error::ErrorLayer::default())
        .with(filter)
        .try_init();

    match installed {
        Ok(()) => info!(?environment, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized"),
    }
}
