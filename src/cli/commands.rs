use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "finroute", about = "Route financial questions to structured commands")]
pub struct Cli {
    /// SQLite database (overrides FINROUTE_DB)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a question or run a canonical command
    Ask {
        /// Question text, e.g. "compare Apple and Microsoft revenue 2023"
        text: Vec<String>,
    },
    /// Show the canonical command a question normalizes to
    Parse {
        text: Vec<String>,
    },
    /// Resolve a company phrase to a ticker
    Resolve {
        phrase: Vec<String>,
    },
    /// Ranked approximate matches for a company phrase
    Fuzzy {
        phrase: String,
        #[arg(long, default_value = "5")]
        limit: usize,
        #[arg(long, default_value = "0.6")]
        cutoff: f64,
    },
    /// Store a company alias and rebuild the alias index
    AliasAdd {
        name: String,
        ticker: String,
    },
    /// Import aliases from a CSV with Symbol, Company Name and Alternate Names columns
    AliasImport {
        path: String,
    },
    /// Store a metric value (annual unless --quarter is given)
    MetricAdd {
        ticker: String,
        /// Metric key (revenue, net_income, eps, ...)
        metric: String,
        year: i32,
        value: f64,
        #[arg(long)]
        quarter: Option<u8>,
    },
    /// Rebuild the alias index from the database (after editing it outside finroute)
    Reload,
    /// Narrative summary for a ticker
    Summary {
        ticker: String,
    },
    /// Recent conversation turns
    History {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiword_question() {
        let cli = Cli::parse_from(["finroute", "ask", "compare", "AAPL", "and", "MSFT"]);
        match cli.command {
            Commands::Ask { text } => assert_eq!(text.join(" "), "compare AAPL and MSFT"),
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn metric_add_with_quarter() {
        let cli = Cli::parse_from([
            "finroute", "--db", "x.db", "metric-add", "AAPL", "revenue", "2023", "81.8", "--quarter", "2",
        ]);
        assert_eq!(cli.db.as_deref(), Some("x.db"));
        match cli.command {
            Commands::MetricAdd { quarter, year, .. } => {
                assert_eq!(quarter, Some(2));
                assert_eq!(year, 2023);
            }
            _ => panic!("expected metric-add"),
        }
    }
}
