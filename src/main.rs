use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gator::app::AppContext;
use gator::cli::{commands, Cli, Commands};
use gator::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gator=info")))
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::resolve_path()?,
    };
    let mut ctx = AppContext::new(config_path)?;

    match cli.command {
        Commands::Register { name } => {
            commands::register(&mut ctx, &name)?;
        }
        Commands::Login { name } => {
            commands::login(&mut ctx, &name)?;
        }
        Commands::Users => {
            commands::list_users(&ctx)?;
        }
        Commands::Reset => {
            commands::reset(&ctx)?;
        }
        Commands::Feeds => {
            commands::list_feeds(&ctx)?;
        }
        Commands::Addfeed { name, url } => {
            let session = ctx.session()?;
            commands::add_feed(&ctx, &session.user, &name, &url)?;
        }
        Commands::Follow { url } => {
            let session = ctx.session()?;
            commands::follow_feed(&ctx, &session.user, &url)?;
        }
        Commands::Following => {
            let session = ctx.session()?;
            commands::list_following(&ctx, &session.user)?;
        }
        Commands::Unfollow { url } => {
            let session = ctx.session()?;
            commands::unfollow_feed(&ctx, &session.user, &url)?;
        }
        Commands::Agg { interval } => {
            let session = ctx.session()?;
            commands::aggregate(&ctx, &session.user, &interval).await?;
        }
    }

    Ok(())
}
