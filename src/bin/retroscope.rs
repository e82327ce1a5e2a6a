use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use retroscope::catalog;
use retroscope::config::{self, Config};
use retroscope::model::{DiscoveredPattern, QuestionAnswer, ReflectionEntry};
use retroscope::stats::{self, JournalStats};
use retroscope::store::{JsonFileRepository, ReflectionStore};
use retroscope::PatternEngine;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "retroscope", version, about = "Reflection journal with pattern discovery")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (TOML). Defaults to the platform config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Journal directory; overrides the config file.
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// Output format: json | table
    #[arg(long, default_value = "table", global = true)]
    format: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a new entry
    Add {
        /// Answers as question_id=text. May be repeated.
        #[arg(short, long = "answer")]
        answers: Vec<String>,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Emoji or emotion id (tired, happy, ...)
        #[arg(short, long)]
        emotion: Option<String>,
        /// 1-10
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u8).range(1..=10))]
        energy: Option<u8>,
    },
    /// Delete an entry by id
    Delete { id: Uuid },
    /// List entries, newest first
    Entries {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Re-run analysis and print the discovered patterns
    Analyze {
        /// Include resolved patterns
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Mark a pattern as noticed
    Resolve { id: String },
    /// Remove a pattern from the current list
    Dismiss { id: String },
    /// Journal statistics
    Stats,
    /// Write entries and patterns as one JSON document
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge entries from an exported JSON document
    Import { path: PathBuf },
    /// Print the question catalog
    Questions,
    /// Suggested tags and how often each tag was used
    Tags,
    /// Delete every entry and pattern
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("retroscope=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn parse_answer(raw: &str) -> anyhow::Result<QuestionAnswer> {
    let Some((id, text)) = raw.split_once('=') else {
        bail!("answer must look like question_id=text, got {raw:?}");
    };
    let q = catalog::question(id.trim()).with_context(|| format!("unknown question id {id:?}"))?;
    Ok(QuestionAnswer::new(q.id, q.question, text.trim()))
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let cfg_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut cfg = Config::load_or_default(&cfg_path).with_context(|| format!("loading {}", cfg_path.display()))?;
    if let Some(dir) = &cli.data_dir {
        cfg.storage.data_dir = dir.clone();
    }
    let offset = cfg.engine.offset();

    let repo = JsonFileRepository::open(&cfg.storage.data_dir)
        .with_context(|| format!("opening journal at {}", cfg.storage.data_dir.display()))?;
    tracing::debug!(dir = %repo.dir().display(), "journal directory");
    let mut store = ReflectionStore::open(repo, PatternEngine::new(cfg.engine.clone()))?;
    let json = cli.format == "json";

    match cli.command {
        Command::Add { answers, tags, emotion, energy } => {
            let answers = answers.iter().map(|a| parse_answer(a)).collect::<anyhow::Result<Vec<_>>>()?;
            let emotion = match emotion.as_deref() {
                Some(code) => catalog::resolve_emotion(code)
                    .map(|e| e.emoji.to_string())
                    .with_context(|| format!("unknown emotion {code:?}"))?,
                None => String::new(),
            };
            let entry = ReflectionEntry::new(answers, tags, emotion, energy.unwrap_or(0));
            let id = entry.id;
            store.add_entry(entry)?;
            println!("{id}");
        }
        Command::Delete { id } => store.delete_entry(id)?,
        Command::Entries { limit } => {
            let entries = &store.entries()[..limit.min(store.entries().len())];
            if json {
                println!("{}", serde_json::to_string_pretty(entries)?);
            } else {
                print_entries_table(entries, offset);
            }
        }
        Command::Analyze { all } => {
            store.reanalyze()?;
            let pats: Vec<&DiscoveredPattern> = store.patterns().iter().filter(|p| all || !p.is_resolved).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&pats)?);
            } else {
                print_patterns_table(&pats);
            }
        }
        Command::Resolve { id } => store.resolve_pattern(&id)?,
        Command::Dismiss { id } => store.dismiss_pattern(&id)?,
        Command::Stats => {
            let stats = JournalStats::compute(store.entries(), store.patterns(), chrono::Utc::now(), offset);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        Command::Export { output } => {
            let doc = store.export_json()?;
            match output {
                Some(path) => std::fs::write(&path, doc).with_context(|| format!("writing {}", path.display()))?,
                None => println!("{doc}"),
            }
        }
        Command::Import { path } => {
            let raw = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let added = store.import_json(&raw)?;
            println!("imported {added} entries");
        }
        Command::Questions => {
            if json {
                println!("{}", serde_json::to_string_pretty(catalog::QUESTIONS)?);
            } else {
                for q in catalog::QUESTIONS {
                    println!("{:<20} {:<8} {} {}", q.id, q.category.label(), q.emoji, q.question.replace('\n', " "));
                }
            }
        }
        Command::Tags => {
            let used = stats::tag_distribution(store.entries());
            let count_of = |tag: &str| used.iter().find(|c| c.name == tag).map_or(0, |c| c.count);
            let custom = used.iter().filter(|c| !catalog::DEFAULT_TAGS.contains(&c.name.as_str()));
            for tag in catalog::DEFAULT_TAGS {
                println!("{:<6} {}", count_of(tag), tag);
            }
            for c in custom {
                println!("{:<6} {} (custom)", c.count, c.name);
            }
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear the journal without --yes");
            }
            store.clear()?;
        }
    }
    Ok(())
}

fn print_entries_table(entries: &[ReflectionEntry], offset: chrono::FixedOffset) {
    println!("{:<36} {:<16} {:<6} {:<3} {}", "Id", "Date", "Energy", "Emo", "Tags");
    for e in entries {
        println!(
            "{:<36} {:<16} {:<6} {:<3} {}",
            e.id,
            e.date.with_timezone(&offset).format("%Y-%m-%d %H:%M"),
            e.energy_level,
            e.emotion,
            e.tags.join(", ")
        );
    }
}

fn print_patterns_table(pats: &[&DiscoveredPattern]) {
    println!("{:<10} {:<10} {:<18} {:<6} {:<8} {:<30} {}", "Severity", "", "Type", "Count", "Resolved", "Id", "Name");
    for p in pats {
        println!(
            "{:<10} {:<10} {:<18} {:<6} {:<8} {:<30} {}",
            p.severity.as_str(),
            p.severity.label(),
            p.pattern_type.as_str(),
            p.frequency,
            if p.is_resolved { "yes" } else { "" },
            p.id,
            p.name
        );
        if let Some(causes) = &p.possible_causes {
            println!("{:>16} causes: {}", "", causes.join(" | "));
        }
        if let Some(symptoms) = &p.symptoms {
            println!("{:>16} symptoms: {}", "", symptoms.join(" | "));
        }
    }
}

fn print_stats(s: &JournalStats) {
    println!("entries: {}  avg energy: {:.1}  streak: {}d", s.total_entries, s.average_energy, s.streak_days);
    println!("patterns: {} active, {} resolved", s.active_patterns, s.resolved_patterns);
    println!("\n# tags");
    for t in &s.tag_distribution {
        println!("{:<6} {}", t.count, t.name);
    }
    println!("\n# emotions");
    for e in &s.emotion_distribution {
        println!("{:<6} {}", e.count, e.name);
    }
    println!("\n# questions");
    for q in &s.question_rates {
        println!("{:<6.2} {} {}", q.rate, q.emoji, q.short_name);
    }
}
