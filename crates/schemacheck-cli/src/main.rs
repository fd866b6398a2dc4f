use clap::Parser;
use schemacheck::{ExportLoader, IntrospectionLoader, Verification};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

mod config;
mod mysql;
mod render;
mod runner;

use config::Settings;
use mysql::MySqlIntrospector;
use render::Format;
use runner::CommandRunner;

/// Verify that migrations reproduce a production MySQL schema.
///
/// Runs the configured migration command against a shadow database, then
/// compares the result with a CSV export of production's information_schema.
#[derive(Parser, Debug)]
#[command(name = "schemacheck", version)]
struct Cli {
    /// Production schema export (CSV)
    export: PathBuf,

    /// Compare the shadow database as-is, without running migrations
    #[arg(long)]
    skip_migrations: bool,

    /// Shadow database connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Config file (default: nearest .config/schemacheck.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    // Must come before parsing so clap sees DATABASE_URL from .env.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded environment file");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "schemacheck=debug"
    } else {
        "schemacheck=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(filter)
        .init();
}

/// Fatal errors: the run stops before any report is printed.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Verify(#[from] schemacheck::Error),

    #[error("invalid database URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let (config, config_path) = config::load(cli.config.as_deref())?;
    match &config_path {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => info!("no config file found, using defaults"),
    }

    let settings = Settings::resolve(config, cli.database_url, cli.skip_migrations)?;
    info!(database = %mask_password(&settings.database_url), "shadow database");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let verification = runtime.block_on(verify(&cli.export, &settings))?;

    let color = cli.format == Format::Text && std::io::stdout().is_terminal();
    print!("{}", render::render(&verification, cli.format, color));
    Ok(())
}

async fn verify(export: &std::path::Path, settings: &Settings) -> Result<Verification, CliError> {
    let runner = settings.migrate.as_ref().and_then(CommandRunner::from_config);

    let introspector = MySqlIntrospector::connect_lazy(&settings.database_url).map_err(|source| {
        CliError::InvalidUrl {
            url: mask_password(&settings.database_url),
            source,
        }
    })?;

    let result = schemacheck::verify(
        &runner,
        &settings.database_url,
        &ExportLoader::new(export, settings.options.clone()),
        &IntrospectionLoader::new(&introspector, settings.options.clone()),
    )
    .await;

    introspector.close().await;
    Ok(result?)
}

/// Mask password in database URL for display
fn mask_password(url: &str) -> String {
    if let Some(start) = url.find("://")
        && let Some(at) = url.rfind('@')
        && at > start
        && let Some(colon) = url[start + 3..at].find(':')
    {
        let user = &url[start + 3..start + 3 + colon];
        return format!("{}{}:***{}", &url[..start + 3], user, &url[at..]);
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "schemacheck",
            "production.csv",
            "--skip-migrations",
            "--database-url",
            "mysql://root@localhost/shadow",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.export, PathBuf::from("production.csv"));
        assert!(cli.skip_migrations);
        assert_eq!(
            cli.database_url.as_deref(),
            Some("mysql://root@localhost/shadow")
        );
        assert_eq!(cli.format, Format::Json);
        assert!(cli.verbose);
    }

    #[test]
    fn test_export_is_required() {
        assert!(Cli::try_parse_from(["schemacheck"]).is_err());
    }

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("mysql://root:hunter2@db:3306/shadow"),
            "mysql://root:***@db:3306/shadow"
        );
        assert_eq!(
            mask_password("mysql://root@db/shadow"),
            "mysql://root@db/shadow"
        );
        assert_eq!(mask_password("not a url"), "not a url");
    }
}
