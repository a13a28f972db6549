use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::infrastructure::store::Store;
use crate::migrations::{MigrationError, Migrator};

#[derive(Debug, Parser)]
#[command(name = "transcode-backend", version, about = "Transcode records backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Manage schema migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum MigrateAction {
    /// Apply every pending migration
    Up,
    /// Revert the most recent migrations
    Down {
        #[arg(default_value_t = 1)]
        count: usize,
    },
    /// List migrations and whether they are applied
    Status,
}

/// Runs a `migrate` subcommand. Needs nothing but the store.
pub async fn run_migrate(store: Arc<dyn Store>, action: &MigrateAction) -> Result<(), MigrationError> {
    let migrator = Migrator::new(store);
    match action {
        MigrateAction::Up => {
            let applied = migrator.up().await?;
            info!("Applied {} migration(s): {:?}", applied.len(), applied);
        }
        MigrateAction::Down { count } => {
            let reverted = migrator.down(*count).await?;
            info!("Reverted {} migration(s): {:?}", reverted.len(), reverted);
        }
        MigrateAction::Status => {
            for status in migrator.status().await? {
                let mark = if status.applied { "applied" } else { "pending" };
                let kind = if status.system { " (system)" } else { "" };
                println!("{:<8} {}{}", mark, status.file, kind);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["transcode-backend"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["transcode-backend", "migrate", "down"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Migrate { action: MigrateAction::Down { count: 1 } })
        ));

        let cli = Cli::try_parse_from(["transcode-backend", "migrate", "down", "3"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Migrate { action: MigrateAction::Down { count: 3 } })
        ));

        assert!(Cli::try_parse_from(["transcode-backend", "migrate", "sideways"]).is_err());
    }

    #[tokio::test]
    async fn migrate_commands_run_on_a_bare_store() {
        let store = store::connect(None).await.unwrap();

        run_migrate(store.clone(), &MigrateAction::Up).await.unwrap();
        assert_eq!(store.applied_migrations().await.unwrap().len(), 4);

        run_migrate(store.clone(), &MigrateAction::Down { count: 1 }).await.unwrap();
        run_migrate(store.clone(), &MigrateAction::Status).await.unwrap();
        let applied = store.applied_migrations().await.unwrap();
        assert_eq!(applied.last().map(String::as_str), Some("1699764454_updated_transcodes"));
    }
}
