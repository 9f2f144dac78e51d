//! Subcommand implementations. Each returns a printable error string.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use entlink::kb::{InMemoryKb, KbSet, KnowledgeBase};
use entlink::{
    DisambiguationRequest, Disambiguator, EngineConfig, EntityType, LinkedEntity, Mention,
    TermRequest,
};

use crate::parser::{ConfigAction, EngineArgs, LinkArgs, OutputFormat, TermsArgs};

const CONFIG_FILE: &str = "config.toml";

/// `<config dir>/entlink/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut dir| {
        dir.push("entlink");
        dir.push(CONFIG_FILE);
        dir
    })
}

/// Explicit file, else the user config file if it exists, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig, String> {
    if let Some(path) = explicit {
        return EngineConfig::load(path)
            .map_err(|e| format!("Failed to load config {}: {}", path.display(), e));
    }
    match default_config_path() {
        Some(path) if path.is_file() => {
            tracing::debug!(path = %path.display(), "using user config");
            EngineConfig::load(&path)
                .map_err(|e| format!("Failed to load config {}: {}", path.display(), e))
        }
        _ => Ok(EngineConfig::default()),
    }
}

fn build_engine(args: &EngineArgs) -> Result<Disambiguator, String> {
    let config = load_config(args.config.as_deref())?;
    let mut kbs = KbSet::new();
    for path in &args.kbs {
        let kb = InMemoryKb::load(path)
            .map_err(|e| format!("Failed to load knowledge base {}: {}", path.display(), e))?;
        tracing::info!(path = %path.display(), language = kb.language(), labels = kb.len(), "loaded knowledge base");
        kbs = kbs.with(kb);
    }
    Disambiguator::builder(kbs)
        .config(config)
        .build()
        .map_err(|e| format!("Invalid configuration: {}", e))
}

/// Read a file, or stdin for `-` / no path.
fn read_input(path: Option<&Path>) -> Result<String, String> {
    match path {
        Some(p) if p != Path::new("-") => fs::read_to_string(p)
            .map_err(|e| format!("Failed to read {}: {}", p.display(), e)),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

/// Parse `SURFACE:START:END` or `SURFACE:TYPE:START:END`.
pub fn parse_mention(arg: &str) -> Result<Mention, String> {
    let mut parts = arg.rsplitn(3, ':');
    let (end, start, rest) = match (parts.next(), parts.next(), parts.next()) {
        (Some(end), Some(start), Some(rest)) => (end, start, rest),
        _ => {
            return Err(format!(
                "Invalid mention '{}': expected SURFACE:START:END or SURFACE:TYPE:START:END",
                arg
            ))
        }
    };
    let start: usize = start
        .parse()
        .map_err(|_| format!("Invalid start offset in mention '{}'", arg))?;
    let end: usize = end
        .parse()
        .map_err(|_| format!("Invalid end offset in mention '{}'", arg))?;

    let mention = match rest.rsplit_once(':') {
        Some((surface, label)) => {
            Mention::new(surface, start, end).with_type(EntityType::from_label(label))
        }
        None => Mention::new(rest, start, end),
    };
    Ok(mention)
}

fn link_request(args: &LinkArgs) -> Result<DisambiguationRequest, String> {
    let mut request = if args.input.is_some() || (args.text.is_none() && args.mentions.is_empty())
    {
        let json = read_input(args.input.as_deref())?;
        serde_json::from_str::<DisambiguationRequest>(&json)
            .map_err(|e| format!("Invalid request JSON: {}", e))?
    } else {
        let mentions = args
            .mentions
            .iter()
            .map(|m| parse_mention(m))
            .collect::<Result<Vec<_>, _>>()?;
        let mut request = DisambiguationRequest::new(mentions);
        request.text = args.text.clone();
        request
    };

    if args.engine.lang.is_some() {
        request.language = args.engine.lang.clone();
    }
    request.short_text |= args.short_text;
    request.nbest |= args.engine.nbest;
    if !args.engine.targets.is_empty() {
        request.target_languages = args.engine.targets.clone();
    }
    Ok(request)
}

fn write_entities(
    out: &mut impl Write,
    entities: &[LinkedEntity],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, entities)?;
            writeln!(out)
        }
        OutputFormat::Jsonl => {
            for entity in entities {
                serde_json::to_writer(&mut *out, entity)?;
                writeln!(out)?;
            }
            Ok(())
        }
        OutputFormat::Tsv => {
            for e in entities {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}\t{:.4}",
                    e.raw_text,
                    e.start,
                    e.end,
                    e.resolved_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                    e.preferred_title.as_deref().unwrap_or("-"),
                    e.confidence
                )?;
            }
            Ok(())
        }
    }
}

pub fn link(args: LinkArgs) -> Result<(), String> {
    let engine = build_engine(&args.engine)?;
    let request = link_request(&args)?;
    let entities = engine
        .disambiguate(&request)
        .map_err(|e| format!("Disambiguation failed: {}", e))?;

    let stdout = io::stdout();
    write_entities(&mut stdout.lock(), &entities, args.engine.format)
        .map_err(|e| format!("Failed to write output: {}", e))
}

pub fn terms(args: TermsArgs) -> Result<(), String> {
    let engine = build_engine(&args.engine)?;
    let json = read_input(args.input.as_deref())?;
    let mut request: TermRequest =
        serde_json::from_str(&json).map_err(|e| format!("Invalid term request JSON: {}", e))?;
    if args.engine.lang.is_some() {
        request.language = args.engine.lang.clone();
    }
    request.nbest |= args.engine.nbest;
    if !args.engine.targets.is_empty() {
        request.target_languages = args.engine.targets.clone();
    }

    let results = engine
        .disambiguate_terms(&request)
        .map_err(|e| format!("Disambiguation failed: {}", e))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = match args.engine.format {
        OutputFormat::Json => serde_json::to_writer_pretty(&mut out, &results)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(out)),
        OutputFormat::Jsonl => results.iter().try_for_each(|r| {
            serde_json::to_writer(&mut out, r)?;
            writeln!(out)
        }),
        OutputFormat::Tsv => results.iter().try_for_each(|r| {
            let best = r.entities.first();
            writeln!(
                out,
                "{}\t{:.4}\t{}\t{}",
                r.term,
                r.score,
                best.and_then(|e| e.resolved_id)
                    .map_or_else(|| "-".to_string(), |id| id.to_string()),
                best.and_then(|e| e.preferred_title.as_deref()).unwrap_or("-")
            )
        }),
    };
    written.map_err(|e| format!("Failed to write output: {}", e))
}

pub fn config(action: ConfigAction) -> Result<(), String> {
    match action {
        ConfigAction::Show { config } => {
            let config = load_config(config.as_deref())?;
            let toml = config
                .to_toml_string()
                .map_err(|e| format!("Failed to render config: {}", e))?;
            print!("{}", toml);
            Ok(())
        }
        ConfigAction::Path => {
            let path = default_config_path()
                .ok_or_else(|| "No configuration directory on this platform".to_string())?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
