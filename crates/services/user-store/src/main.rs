//! User Store - operator CLI for the user document store.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use common::AppError;
use user_store_lib::config::UserStoreConfig;
use user_store_lib::repository::{FULL_VIEW, PUBLIC_VIEW};
use user_store_lib::{MigrateAction, UserQuery};

#[derive(Parser)]
#[command(name = "user-store")]
#[command(about = "User document store administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Inspect stored users
    Users {
        #[command(subcommand)]
        query: UsersCommands,
        /// Include credential fields in the output
        #[arg(long, global = true)]
        full: bool,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[derive(Subcommand)]
enum UsersCommands {
    /// List all users
    List,
    /// Show a user by identity
    Get { id: Uuid },
    /// Find the first user with an email address
    Find {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let config = UserStoreConfig::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.service.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    tracing::info!(service = %config.service.service_name, "starting");

    match cli.command {
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            user_store_lib::run_migrations(migrate_action)
                .await
                .inspect_err(report)?;
        }
        Commands::Users { query, full } => {
            let query = match query {
                UsersCommands::List => UserQuery::List,
                UsersCommands::Get { id } => UserQuery::ById(id),
                UsersCommands::Find { email } => UserQuery::ByEmail(email),
            };
            let view = if full { FULL_VIEW } else { PUBLIC_VIEW };

            let repo = user_store_lib::connect_repository(&config)
                .await
                .inspect_err(report)?;
            let users = user_store_lib::run_query(repo.as_ref(), query, view)
                .await
                .inspect_err(report)?;
            println!("{}", serde_json::to_string_pretty(&users)?);
        }
    }

    Ok(())
}

fn report(err: &AppError) {
    if err.is_unavailable() {
        tracing::error!(code = err.code(), "document store unreachable, check DATABASE_URL: {}", err);
    } else {
        tracing::error!(code = err.code(), "{}", err);
    }
}
