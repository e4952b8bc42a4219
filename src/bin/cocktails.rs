use anyhow::Result;
use cocktails::{
    cli::{Cli, Commands},
    commands, db,
};

#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env file is fine, everything can be given as flags or real env vars
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    cli.init_logger()?;

    let pg = db::connect(&cli.database_url).await?;
    match &cli.command {
        Commands::Scrape(args) => {
            let summary = commands::scrape(&pg, args).await?;
            if summary.stored == 0 && summary.failed > 0 {
                anyhow::bail!("no drinks stored, {} failed", summary.failed);
            }
        }
        Commands::Review { seed } => {
            commands::review(&pg, *seed).await?;
        }
        Commands::Sample { name } => commands::sample(&pg, name).await?,
        Commands::Report { ingredient, limit } => {
            commands::report(&pg, ingredient, *limit).await?
        }
    }
    pg.close().await;
    Ok(())
}
