use std::sync::Arc;

use clap::Parser;
use miette::Result;
use tracing_subscriber::{fmt, EnvFilter};

use fieldgate::authz::loader::compile_grants;
use fieldgate::authz::GroupGrantResolver;
use fieldgate::{registry, settings, web};

#[derive(Parser, Debug)]
#[command(
    name = "fieldgate",
    version,
    about = "Field-level edit authorization and change tracking service"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "fieldgate.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(?settings, "Loaded configuration");

    registry::validate()?;

    let grants = compile_grants(&settings.grants, &settings.admins)?;
    let resolver = Arc::new(GroupGrantResolver::new(grants));

    web::serve(settings, resolver).await?;
    Ok(())
}
