//! Plansculpt - small-business ERP server
//!
//! Serves the REST API and runs maintenance tasks against the database.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plansculpt_api::{ApiServer, ApiServerConfig};
use plansculpt_core::Store;
use sea_orm::DatabaseConnection;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DATABASE_URL: &str = "sqlite://plansculpt.db?mode=rwc";

#[derive(Parser, Debug)]
#[command(name = "plansculpt")]
#[command(about = "Employees, projects, invoices, ledger and payroll for a small business")]
#[command(version = env!("GIT_TAG"))]
#[command(long_version = concat!(env!("GIT_TAG"), "\nCommit: ", env!("GIT_HASH"), "\nBuilt: ", env!("BUILD_TIME")))]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Database connection URL
    #[arg(long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, env = "PLANSCULPT_BIND", default_value = "0.0.0.0")]
        bind: IpAddr,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value = "3001")]
        port: u16,

        /// Secret used to sign session tokens
        #[arg(long, env = "PLANSCULPT_JWT_SECRET")]
        jwt_secret: String,

        /// Disable CORS headers
        #[arg(long)]
        no_cors: bool,

        /// Allowed CORS origin (repeatable); all origins when omitted
        #[arg(long = "cors-origin")]
        cors_origins: Vec<String>,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Assign custom ids to employees and projects that have none
    BackfillIds,

    /// Create an admin account, or promote and re-key an existing one
    CreateAdmin {
        #[arg(long, env = "ADMIN_USERNAME")]
        username: String,

        #[arg(long, env = "ADMIN_PASSWORD")]
        password: String,

        #[arg(long)]
        full_name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Serve {
            bind,
            port,
            jwt_secret,
            no_cors,
            cors_origins,
        } => {
            let db = open_database(&cli.database_url).await?;
            let config = ApiServerConfig {
                bind_addr: SocketAddr::new(bind, port),
                enable_cors: !no_cors,
                cors_origins: if cors_origins.is_empty() {
                    None
                } else {
                    Some(cors_origins)
                },
                jwt_secret,
            };
            serve(config, Store::new(db)).await
        }
        Commands::Migrate => {
            open_database(&cli.database_url).await?;
            info!("Database is up to date");
            Ok(())
        }
        Commands::BackfillIds => {
            let db = open_database(&cli.database_url).await?;
            let report = Store::new(db)
                .backfill_ids()
                .await
                .context("Identifier backfill failed")?;

            info!(
                "Backfill complete: {} employees, {} projects assigned",
                report.employees_assigned, report.projects_assigned
            );
            if report.skipped > 0 {
                warn!(
                    "{} rows skipped because their computed id was already taken",
                    report.skipped
                );
            }
            Ok(())
        }
        Commands::CreateAdmin {
            username,
            password,
            full_name,
        } => {
            let db = open_database(&cli.database_url).await?;
            let (user, created) = Store::new(db)
                .create_admin(&username, &password, full_name)
                .await
                .context("Failed to create admin account")?;

            if created {
                info!("Created admin account {} ({})", user.username, user.id);
            } else {
                info!("Promoted existing account {} to admin", user.username);
            }
            Ok(())
        }
    }
}

async fn open_database(database_url: &str) -> Result<DatabaseConnection> {
    plansculpt_db::open(database_url)
        .await
        .with_context(|| format!("Failed to open database at {}", database_url))
}

async fn serve(config: ApiServerConfig, store: Store) -> Result<()> {
    let server = ApiServer::new(config, store);

    info!("Press Ctrl+C to stop");
    server.start(shutdown_signal()).await
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received, draining connections...");
        }
        Err(err) => {
            error!("Error listening for shutdown signal: {}", err);
        }
    }
}

fn init_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();

    Ok(())
}
