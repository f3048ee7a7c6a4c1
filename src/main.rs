use clap::Parser;
use finroute::cli::commands::{Cli, Commands};
use finroute::config::FinRouteConfig;
use finroute::domain::entities::metric_record::MetricRecord;
use finroute::domain::values::metric_key::MetricKey;
use finroute::FinRoute;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FINROUTE_LOG")
                .unwrap_or_else(|_| EnvFilter::new("finroute=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match FinRouteConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let fr = match FinRoute::from_config(config) {
        Ok(fr) => fr,
        Err(e) => {
            eprintln!("Error initializing finroute: {e}");
            std::process::exit(1);
        }
    };

    let result = run_command(fr, cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(fr: FinRoute, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Ask { text } => {
            let reply = fr.ask(&text.join(" ")).await?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Commands::Parse { text } => {
            let text = text.join(" ");
            match fr.parse(&text) {
                Some(cmd) => {
                    println!("{}", cmd.canonical());
                    println!("{}", serde_json::to_string_pretty(&cmd)?);
                }
                None => println!("(free-form)"),
            }
        }
        Commands::Resolve { phrase } => {
            let phrase = phrase.join(" ");
            match fr.resolve(&phrase) {
                Some(hit) => println!("{}", serde_json::to_string_pretty(&hit)?),
                None => {
                    eprintln!("Ticker not found for \"{phrase}\" (normalized: \"{}\")", fr.normalize_name(&phrase));
                    std::process::exit(2);
                }
            }
        }
        Commands::Fuzzy { phrase, limit, cutoff } => {
            let matches = fr.resolve_fuzzy(&phrase, limit, cutoff);
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }
        Commands::AliasAdd { name, ticker } => {
            if fr.add_alias(&name, &ticker)? {
                println!("Added alias \"{name}\" -> {}", ticker.to_uppercase());
            } else {
                println!("Alias \"{name}\" -> {} already exists", ticker.to_uppercase());
            }
        }
        Commands::AliasImport { path } => {
            let count = fr.import_aliases(&path)?;
            println!("Imported {count} aliases");
        }
        Commands::MetricAdd {
            ticker,
            metric,
            year,
            value,
            quarter,
        } => {
            let key: MetricKey = metric.parse().map_err(|e: String| e)?;
            let record = match quarter {
                Some(q) => MetricRecord::quarterly(&ticker.to_uppercase(), key, year, q, value),
                None => MetricRecord::annual(&ticker.to_uppercase(), key, year, value),
            };
            fr.add_metric(&record)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Reload => {
            let stats = fr.reload_aliases();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Summary { ticker } => {
            let reply = fr.summary(&ticker).await?;
            println!("{}", reply.text);
        }
        Commands::History { limit } => {
            let messages = fr.history(limit)?;
            println!("{}", serde_json::to_string_pretty(&messages)?);
        }
    }
    Ok(())
}
