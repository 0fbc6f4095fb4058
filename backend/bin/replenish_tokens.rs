// Monthly token replenishment job. Run from cron (or by hand) once per
// period; per-user failures are reported but do not stop the batch.

use std::sync::Arc;

use anyhow::Result;
use clap::{Arg, Command};
use daymatch::db::{DatabaseConfig, PgLedgerStore, PgUserDirectory, get_db_pool};
use daymatch::ports::UserDirectory;
use daymatch::services::TokenLedger;
use daymatch::utils;

#[tokio::main]
async fn main() -> Result<()> {
    utils::init_logging();

    let matches = Command::new("replenish-tokens")
        .about("Expires remaining balances and grants the monthly token allowance to every user")
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("List the users that would be processed without writing any transactions")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    let users = Arc::new(PgUserDirectory::new(pool.clone()));

    if matches.get_flag("dry-run") {
        let user_ids = users.list_all_user_ids().await?;
        println!("Would replenish {} users:", user_ids.len());
        for user_id in user_ids {
            println!("  {user_id}");
        }
        return Ok(());
    }

    let ledger = TokenLedger::new(Arc::new(PgLedgerStore::new(pool)), users);
    let report = ledger.replenish_all_users().await?;

    println!(
        "Replenishment complete: {} succeeded, {} failed, {} skipped",
        report.success, report.failed, report.skipped
    );

    if report.failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
