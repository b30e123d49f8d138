use std::process::ExitCode;

use chrono::Utc;

use danci_scheduler::config::Config;
use danci_scheduler::logging::init_tracing;
use danci_scheduler::{
    CardResponse, InMemoryVocabulary, JsonFileStore, LearningMode, LearningSession, Level,
    SchedulerError, SystemClock, Vocabulary,
};

const USAGE: &str = "usage: danci-scheduler <command>

commands:
  next                    show the next due card
  add <word-id>           enqueue a word
  fill <count>            enqueue the next <count> unused words
  answer <word-id> <y|n>  record an answer
  mode <learning|reviewing|adding>
  level <A1|A2|B1|B2>
  stats                   queue statistics and analytics
  export                  print a backup of the state
  import <file>           replace the state with a backup
  reset                   start over";

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level, config.log_dir.as_deref());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&config, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, args: &[String]) -> Result<(), SchedulerError> {
    let store = JsonFileStore::new(&config.state_path);
    let mut session = LearningSession::restore(&store, config.scheduler.clone(), SystemClock);
    let stored_date = session.state().today_stats.date.clone();
    session.roll_over_day(Utc::now().date_naive());
    let rolled_over = session.state().today_stats.date != stored_date;

    let command = args.first().map(String::as_str).unwrap_or("next");
    let mutated = match command {
        "next" => {
            let vocabulary = InMemoryVocabulary::load(&config.vocab_path)?;
            match session.next_card(&vocabulary) {
                Some(card) => println!("{}", serde_json::to_string_pretty(&card)?),
                None => println!("no card due"),
            }
            false
        }
        "add" => {
            let word_id = parse_word_id(args.get(1))?;
            if !session.add_word(word_id)? {
                println!("word {word_id} is already tracked");
            }
            true
        }
        "fill" => {
            let count: usize = match args.get(1) {
                Some(raw) => raw
                    .parse()
                    .map_err(|_| SchedulerError::InvalidArgument(format!("count {raw:?}")))?,
                None => 10,
            };
            let vocabulary = InMemoryVocabulary::load(&config.vocab_path)?;
            let mut added = 0;
            while added < count {
                let Some(word_id) = session.next_unused_word(vocabulary.len()) else {
                    break;
                };
                session.add_word(word_id)?;
                added += 1;
            }
            println!("added {added} words");
            true
        }
        "answer" => {
            let word_id = parse_word_id(args.get(1))?;
            let known = parse_answer(args.get(2))?;
            let response = CardResponse::new(word_id, known, session.now());
            let outcome = session.submit_response(&response)?;
            if outcome.was_learned {
                println!("word {word_id} learned");
            } else {
                println!("word {word_id} now at {}", outcome.item.stage);
            }
            true
        }
        "mode" => {
            let mode = parse_with(args.get(1), "mode", LearningMode::parse)?;
            session.switch_mode(mode);
            true
        }
        "level" => {
            let level = parse_with(args.get(1), "level", Level::parse)?;
            session.set_detected_level(level);
            true
        }
        "stats" => {
            println!("{}", serde_json::to_string_pretty(&session.queue_stats())?);
            println!("{}", serde_json::to_string_pretty(&session.analytics())?);
            false
        }
        "export" => {
            println!("{}", session.export_snapshot()?);
            false
        }
        "import" => {
            let path = args.get(1).map(String::as_str).unwrap_or("backup.json");
            session.import_snapshot(&std::fs::read_to_string(path)?)?;
            true
        }
        "reset" => {
            session.reset_all();
            true
        }
        _ => {
            eprintln!("{USAGE}");
            false
        }
    };

    if (mutated || rolled_over) && !session.persist(&store) {
        eprintln!("warning: state could not be saved to {}", config.state_path);
    }

    Ok(())
}

fn parse_word_id(arg: Option<&String>) -> Result<i64, SchedulerError> {
    let raw = arg.map(String::as_str).unwrap_or_default();
    raw.parse::<i64>()
        .map_err(|_| SchedulerError::InvalidArgument(format!("word id {raw:?}")))
}

fn parse_answer(arg: Option<&String>) -> Result<bool, SchedulerError> {
    match arg.map(String::as_str) {
        Some("y" | "yes" | "1") => Ok(true),
        Some("n" | "no" | "0") => Ok(false),
        other => Err(SchedulerError::InvalidArgument(format!(
            "answer {:?}, expected y or n",
            other.unwrap_or_default()
        ))),
    }
}

fn parse_with<T>(
    arg: Option<&String>,
    what: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, SchedulerError> {
    let raw = arg.map(String::as_str).unwrap_or_default();
    parse(raw).ok_or_else(|| SchedulerError::InvalidArgument(format!("{what} {raw:?}")))
}
