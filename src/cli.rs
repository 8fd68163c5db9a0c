use clap::{Parser, Subcommand};

use crate::entities::adverse_event::{self, AdverseEventOptions};
use crate::render;
use crate::resolve::synonyms;

#[derive(Debug, Parser)]
#[command(
    name = "faerscope",
    version,
    about = "Drug adverse-event discovery against openFDA FAERS"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search adverse-event reports for a drug or compound name
    Search {
        /// Free-text drug or compound name (brand, generic, or variant spelling)
        name: String,
        /// Result budget for retrieval (default 100, max 1000)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Additional synonym to search with; repeatable
        #[arg(short = 's', long = "synonym", value_name = "NAME")]
        synonyms: Vec<String>,
        /// Bypass the local HTTP cache for this query
        #[arg(long)]
        fresh: bool,
        /// Emit pretty JSON instead of markdown
        #[arg(short, long)]
        json: bool,
    },
    /// Show the synonym expansion for a name without querying openFDA
    Expand {
        /// Free-text drug or compound name
        name: String,
        /// Additional synonym to merge into the expansion; repeatable
        #[arg(short = 's', long = "synonym", value_name = "NAME")]
        synonyms: Vec<String>,
        /// Emit pretty JSON instead of markdown
        #[arg(short, long)]
        json: bool,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Commands::Search {
            name,
            limit,
            synonyms,
            fresh,
            json,
        } => {
            let options = AdverseEventOptions {
                max_results: limit,
                synonyms,
            };
            let resp = crate::sources::with_no_cache(
                fresh,
                adverse_event::get_adverse_events(&name, &options),
            )
            .await?;
            if json {
                Ok(render::json::to_pretty(&resp)?)
            } else {
                Ok(render::markdown::render_adverse_events(&name, &resp))
            }
        }
        Commands::Expand {
            name,
            synonyms: external,
            json,
        } => {
            let set = synonyms::expand(&name, &external);
            if json {
                Ok(render::json::to_pretty(&set)?)
            } else {
                Ok(render::markdown::render_synonyms(&name, &set))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_with_options() {
        let cli = Cli::parse_from([
            "faerscope", "search", "aspirin", "--limit", "50", "-s", "asa", "-s",
            "acetylsalicylic acid", "--fresh", "--json",
        ]);
        match cli.command {
            Commands::Search {
                name,
                limit,
                synonyms,
                fresh,
                json,
            } => {
                assert_eq!(name, "aspirin");
                assert_eq!(limit, Some(50));
                assert_eq!(synonyms, vec!["asa", "acetylsalicylic acid"]);
                assert!(fresh);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_expand_defaults() {
        let cli = Cli::parse_from(["faerscope", "expand", "tylenol"]);
        match cli.command {
            Commands::Expand {
                name,
                synonyms,
                json,
            } => {
                assert_eq!(name, "tylenol");
                assert!(synonyms.is_empty());
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
