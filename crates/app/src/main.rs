use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use quest_core::model::{AdvanceResult, LearnerSession, Track};
use services::{
    ChatBackend, ChatConfig, HintBackend, HintService, QuestService, ReportCard, load_track_from_path,
    starter_track,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTimeout { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTimeout { raw } => write!(f, "invalid --timeout-secs value: {raw}"),
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
    eprintln!("  cargo run -p app -- [--track <path>] [--no-ai] [--timeout-secs <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  built-in AI Starter Quest track, AI hints on when configured, 4s timeout");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUEST_AI_API_KEY, QUEST_AI_BASE_URL, QUEST_AI_MODEL");
}

struct Args {
    track_path: Option<String>,
    no_ai: bool,
    timeout_secs: u64,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            track_path: None,
            no_ai: false,
            timeout_secs: 4,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--track" => {
                    parsed.track_path = Some(require_value(args, "--track")?);
                }
                "--no-ai" => {
                    parsed.no_ai = true;
                }
                "--timeout-secs" => {
                    let value = require_value(args, "--timeout-secs")?;
                    parsed.timeout_secs = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTimeout { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn progress_bar(fraction: f64) -> String {
    const WIDTH: usize = 20;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = ((fraction.clamp(0.0, 1.0) * WIDTH as f64).round()) as usize;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u32;
    format!("[{}{}] {percent}%", "#".repeat(filled), "-".repeat(WIDTH - filled))
}

fn print_status(service: &QuestService, session: &LearnerSession) {
    let progress = service.progress(session);
    println!("Progress: {}", progress_bar(progress.fraction));
    if session.badges().is_empty() {
        println!("Badges:   (none yet)");
    } else {
        let badges: Vec<&str> = session.badges().iter().map(|b| b.as_str()).collect();
        println!("Badges:   {}", badges.join(" | "));
    }
}

fn print_current_step(session: &LearnerSession) {
    if let Some(position) = session.current_position() {
        if let Some(module) = session.track().module(position.module) {
            println!();
            println!("── {} ──", module.title());
        }
    }
    if let Some(step) = session.current_step() {
        println!("{}", step.prompt());
        println!("(answer, or: hint / skip / progress / quit)");
    }
}

fn print_advance(result: &AdvanceResult) {
    match result.correct {
        Some(true) => println!("Correct!"),
        Some(false) => println!("Good try, but that's not it. Moving on."),
        None => {}
    }
    if let Some(badge) = &result.badge_awarded {
        println!("Badge earned: {badge}");
    }
}

fn print_finale(service: &QuestService, session: &LearnerSession) {
    println!();
    println!("You've completed the free track!");
    print_status(service, session);

    if let Some(locked) = service.track().modules().iter().find(|m| m.locked()) {
        println!();
        println!("Locked level: {}", locked.title());
        println!("{}", locked.steps()[0].prompt());
    }

    let card = service.report_card(session);
    println!();
    println!("Report card (preview)");
    println!("  Concepts:         {}", ReportCard::stars(card.concepts));
    println!("  Prompt craft:     {}", ReportCard::stars(card.prompt_craft));
    println!(
        "  Applied practice: {}",
        ReportCard::stars(card.applied_practice)
    );
    println!("  Consistency:      {}", ReportCard::stars(card.consistency));
}

fn load_track(args: &Args) -> Result<Track, Box<dyn std::error::Error>> {
    match &args.track_path {
        Some(path) => Ok(load_track_from_path(path)?),
        None => Ok(starter_track()),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Track validation happens here, before any session starts. A broken
    // definition (e.g. a hint step without fallback text) aborts startup.
    let track = Arc::new(load_track(&args)?);

    let backend: Option<Arc<dyn HintBackend>> = if args.no_ai {
        None
    } else {
        ChatConfig::from_env()
            .map(|config| Arc::new(ChatBackend::new(Some(config))) as Arc<dyn HintBackend>)
    };
    if backend.is_none() {
        println!("AI hints off; pre-authored hints will be used.");
    }

    let hints = HintService::new(Arc::clone(&track), backend)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let service = QuestService::new(Arc::clone(&track), hints);

    let mut session = service.start_session();
    println!("Welcome to the Starter Quest!");
    print_current_step(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.is_complete() {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" => break,
            "progress" => {
                print_status(&service, &session);
                continue;
            }
            "hint" => {
                let hint = service.hint(&session, None).await;
                println!("Hint ({}): {}", hint.source, hint.text);
                continue;
            }
            "skip" => {
                let Some(position) = session.current_position() else {
                    break;
                };
                match service.skip_step(&mut session, position.step) {
                    Ok(result) => print_advance(&result),
                    Err(err) => println!("{err}"),
                }
            }
            _ => {
                let Some(position) = session.current_position() else {
                    break;
                };
                match service.submit_answer(&mut session, position.step, input) {
                    Ok(result) => print_advance(&result),
                    Err(err) => println!("{err}"),
                }
            }
        }

        if session.is_complete() {
            print_finale(&service, &session);
        } else {
            print_status(&service, &session);
            print_current_step(&session);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
