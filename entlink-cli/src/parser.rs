//! CLI argument parsing and structure definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Entity disambiguation CLI
#[derive(Parser)]
#[command(name = "entlink")]
#[command(
    author,
    version,
    about = "Link detected mentions to knowledge-base senses",
    long_about = r#"
entlink - entity disambiguation against per-language knowledge bases

PIPELINE:
  candidates -> rank -> selector prune -> score prune -> overlaps -> enrich

INPUT:
  Knowledge bases are JSON snapshots, one per language (--kb, repeatable).
  Requests are JSON documents read from --input or stdin, or built from
  --text and --mention flags.

EXAMPLES:
  entlink link --kb en.json -t "Paris is in France" -m Paris:0:5 -m France:12:18
  entlink link --kb en.json --kb fr.json --input request.json --format tsv
  entlink terms --kb en.json --input terms.json
  entlink config show
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Disambiguate the mentions of a document
    #[command(visible_alias = "l")]
    Link(LinkArgs),

    /// Disambiguate a weighted term vector
    #[command(visible_alias = "t")]
    Terms(TermsArgs),

    /// Inspect the engine configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Options shared by the disambiguation commands.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Knowledge base snapshot (JSON); repeat for several languages
    #[arg(long = "kb", value_name = "FILE", required = true)]
    pub kbs: Vec<PathBuf>,

    /// Engine configuration (TOML); defaults to the user config file if present
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Language code; detected from the text when omitted
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Keep several candidates per mention
    #[arg(long)]
    pub nbest: bool,

    /// Attach titles in these languages (comma-separated)
    #[arg(long, value_delimiter = ',', value_name = "LANGS")]
    pub targets: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Args, Debug, Clone)]
pub struct LinkArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Request JSON file (`-` for stdin)
    #[arg(short, long, value_name = "FILE", conflicts_with_all = ["text", "mentions"])]
    pub input: Option<PathBuf>,

    /// Source text
    #[arg(short, long)]
    pub text: Option<String>,

    /// Mention as SURFACE:START:END or SURFACE:TYPE:START:END (repeatable)
    #[arg(short, long = "mention", value_name = "SPEC")]
    pub mentions: Vec<String>,

    /// Relaxed thresholds; overlapping losers are demoted instead of removed
    #[arg(short, long)]
    pub short_text: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TermsArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Term request JSON file (`-` for stdin)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show {
        /// Configuration file; defaults to the user config file if present
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print the default configuration file location
    Path,
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// One JSON object per line
    Jsonl,
    /// Tab-separated columns
    Tsv,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn link_flags_parse() {
        let cli = Cli::try_parse_from([
            "entlink", "-v", "link", "--kb", "en.json", "-t", "Paris", "-m", "Paris:0:5",
            "--targets", "de,fr", "--format", "tsv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Link(args) = cli.command else {
            panic!("expected link");
        };
        assert_eq!(args.engine.targets, vec!["de", "fr"]);
        assert_eq!(args.engine.format, OutputFormat::Tsv);
        assert_eq!(args.mentions, vec!["Paris:0:5"]);
    }

    #[test]
    fn kb_is_required() {
        assert!(Cli::try_parse_from(["entlink", "link", "-t", "Paris"]).is_err());
    }
}
