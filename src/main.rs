use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vbind_site::{handle_extract_command, purge, render_config, render_head, Cli, Commands, SiteConfig};

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("vbind_site=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Purge(mut args) => {
            // Log lines and a progress bar would interleave on stderr
            args.no_progress |= cli.verbose;
            let result = tokio::task::spawn_blocking(move || purge(args))
                .await
                .context("Purge task panicked")?;
            match result {
                Ok(result) => {
                    println!("Purge successful! ({} mode)", result.mode);
                    println!("  - Scanned {} files", result.total_files_scanned);
                    println!("  - Found {} unique classes", result.total_classes);
                    println!(
                        "  - Removed {} rules, kept {}",
                        result.stats.rules_removed, result.stats.rules_kept
                    );
                    Ok(())
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Extract(args) => {
            handle_extract_command(args).await?;
            Ok(())
        }
        Commands::Config(args) => {
            let config = SiteConfig::load(args.config.as_deref()).context("Failed to load site configuration")?;
            println!("{}", render_config(&config, args.format)?);
            Ok(())
        }
        Commands::Head(args) => {
            let config = SiteConfig::load(args.config.as_deref()).context("Failed to load site configuration")?;
            println!("{}", render_head(&config));
            Ok(())
        }
    }
}
