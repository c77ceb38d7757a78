//! # movielist Main Entry Point
//!
//! Upcoming movies from the catalog, or from the saved copy when offline.

use anyhow::Result;
use movielist::cmd_args::CommandLineArgs;
use movielist::config::{self, IniProfileStore};
use movielist::controller::AppController;
use movielist::view::OutputFormat;
use tracing_subscriber::{filter::Directive, fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cmd_args = CommandLineArgs::parse();
    init_tracing_subscriber(cmd_args.verbose());

    // Load profile from INI file by name specified in --profile argument
    // (default to "default"). If the profile is not found, use a blank profile.
    let profile_name = cmd_args.profile();
    let profile_path = config::get_profile_path();
    tracing::debug!("Loading profile '{}' from '{}'", profile_name, profile_path);
    let profile = IniProfileStore::new(&profile_path).get_profile_or_blank(profile_name)?;

    let format = OutputFormat::detect(cmd_args.json());
    let mut app =
        AppController::new(&profile, cmd_args.offline(), format, std::io::stdout()).await?;
    app.run(cmd_args.command()).await
}

fn init_tracing_subscriber(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(config::LOG_LEVEL_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let filter = [
        "reqwest=warn",
        "hyper=warn",
        "hyper_util=warn",
        "tokio=warn",
        "tower=warn",
        "rustls=warn",
        "h2=warn",
    ]
    .iter()
    .filter_map(|directive| directive.parse::<Directive>().ok())
    .fold(filter, |filter, directive| filter.add_directive(directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_timer(ChronoLocal::rfc_3339())
        .init();
}
