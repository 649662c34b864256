use std::fmt;

use drill_core::catalog::RuleTopic;
use drill_core::model::{AnswerMode, AppSettingsDraft, GroupFilter};
use services::{AppServices, Clock, PhaseRequest};
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingCommand,
    UnknownArg(String),
    UnknownCommand(String),
    MissingTopic,
    UnknownTopic { raw: String },
    InvalidMode { raw: String },
    InvalidDuration { raw: String },
    InvalidDbUrl { raw: String },
    NotApplicable { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingCommand => write!(f, "missing command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingTopic => write!(f, "rules requires a topic"),
            ArgsError::UnknownTopic { raw } => write!(f, "unknown rule topic: {raw}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
            ArgsError::InvalidDuration { raw } => write!(f, "invalid --duration value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::NotApplicable { flag } => {
                write!(f, "{flag} does not apply to this command")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  drill [--api <url>] [--db <sqlite_url>] [--offline] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  sounds [--group <group>] [--mode typing|recognition]");
    eprintln!("  rules <u-rule|whole-syllable|tone-placement|confusion>");
    eprintln!("  chars");
    eprintln!("  words");
    eprintln!("  speed [--duration <seconds>]");
    eprintln!("  stats");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:pinyin.sqlite3");
    eprintln!("  --group all, --mode typing");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PINYIN_API_URL, PINYIN_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Drill(PhaseRequest),
    Speed { duration: Option<u32> },
    Stats,
}

#[derive(Debug)]
struct Args {
    api_url: Option<String>,
    db_url: String,
    offline: bool,
    command: Command,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api_url = std::env::var("PINYIN_API_URL").ok();
        let mut db_url = std::env::var("PINYIN_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("sqlite:pinyin.sqlite3".into()), normalize_sqlite_url);
        let mut offline = false;
        let mut group = None;
        let mut mode = None;
        let mut duration = None;
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api_url = Some(require_value(args, "--api")?),
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--offline" => offline = true,
                "--group" => group = Some(require_value(args, "--group")?),
                "--mode" => {
                    let value = require_value(args, "--mode")?;
                    mode = Some(
                        AnswerMode::parse(&value).ok_or(ArgsError::InvalidMode { raw: value })?,
                    );
                }
                "--duration" => {
                    let value = require_value(args, "--duration")?;
                    let parsed: u32 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDuration { raw: value.clone() })?;
                    duration = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let name = positional.next().ok_or(ArgsError::MissingCommand)?;
        let is_sounds = name == "sounds";
        let command = match name.as_str() {
            "sounds" => Command::Drill(PhaseRequest::Sounds {
                filter: GroupFilter::parse(group.as_deref().unwrap_or("all")),
                mode: mode.unwrap_or_default(),
            }),
            "rules" => {
                let raw = positional.next().ok_or(ArgsError::MissingTopic)?;
                let topic = RuleTopic::parse(&raw).ok_or(ArgsError::UnknownTopic { raw })?;
                Command::Drill(PhaseRequest::Rules { topic })
            }
            "chars" => Command::Drill(PhaseRequest::Characters),
            "words" => Command::Drill(PhaseRequest::Words),
            "speed" => Command::Speed { duration },
            "stats" => Command::Stats,
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        if !is_sounds && group.is_some() {
            return Err(ArgsError::NotApplicable { flag: "--group" });
        }
        if !is_sounds && mode.is_some() {
            return Err(ArgsError::NotApplicable { flag: "--mode" });
        }
        if !matches!(command, Command::Speed { .. }) && duration.is_some() {
            return Err(ArgsError::NotApplicable { flag: "--duration" });
        }

        Ok(Self {
            api_url,
            db_url,
            offline,
            command,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let settings = AppSettingsDraft {
        api_base_url: if parsed.offline { None } else { parsed.api_url },
        ..AppSettingsDraft::new()
    }
    .validate()?;
    if settings.api_base_url().is_none() {
        tracing::info!("no backend configured, running offline");
    }

    let clock = Clock::default();
    // sqlx gives every pooled connection its own in-memory database.
    let services = if parsed.db_url == "sqlite::memory:" {
        AppServices::new_in_memory(settings, clock).await?
    } else {
        prepare_sqlite_file(&parsed.db_url)?;
        AppServices::new_sqlite(&parsed.db_url, settings, clock).await?
    };

    let streak = match services.gamification().record_visit().await {
        Ok(streak) => streak,
        Err(err) => {
            tracing::warn!(error = %err, "streak not updated");
            0
        }
    };

    let mut term = terminal::Terminal::new();
    match parsed.command {
        Command::Drill(request) => term.drill(&services, &request, streak).await,
        Command::Speed { duration } => {
            let duration = duration.unwrap_or_else(|| services.settings().default_speed_duration());
            term.speed(&services, duration).await
        }
        Command::Stats => term.stats(&services, streak).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
