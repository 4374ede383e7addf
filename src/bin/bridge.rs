// Line protocol for driving the trainer from an external UI process.
//
//   PUZZLE <user>             -> PUZZLE_JSON <puzzle>
//   SUBMIT <user> <json>      -> RESULT_JSON <report>
//   SUMMARY <user>            -> SUMMARY_JSON <summary>
//   EXIT
//
// Anything that goes wrong is answered with `ERROR <message>`.
use std::io::{self, BufRead, Write};
use trainer_core::logging::init_file_logger;
use trainer_core::{FileStore, Submission, TrainerConfig, TrainerEngine, TrainerError};

fn main() -> io::Result<()> {
    let config = match TrainerConfig::discover() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[trainer_bridge] bad config: {}", e);
            std::process::exit(2);
        }
    };
    if let Err(e) = init_file_logger(&config.log_path, config.log_filter()) {
        eprintln!("[trainer_bridge] file logging disabled: {}", e);
    }
    log::info!("--- trainer bridge starting ---");

    let engine = match TrainerEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("startup failed: {}", e);
            eprintln!("[trainer_bridge] startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let input = line?;
        log::debug!("bridge <- {:?}", input);
        let (command, rest) = split_word(input.trim());

        let reply = match command {
            "PUZZLE" => handle_puzzle(&engine, rest),
            "SUBMIT" => handle_submit(&engine, rest),
            "SUMMARY" => handle_summary(&engine, rest),
            "EXIT" => {
                log::info!("bridge: received EXIT");
                break;
            }
            "" => continue,
            other => Err(format!("unknown command {}", other)),
        };

        let out = reply.unwrap_or_else(|message| format!("ERROR {}", message));
        log::debug!("bridge -> {:?}", out);
        writeln!(stdout, "{}", out)?;
        stdout.flush()?;
    }

    log::info!("bridge: shutting down");
    log::logger().flush();
    Ok(())
}

/// First whitespace-delimited word and the trimmed remainder.
fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim_start()),
        None => (s, ""),
    }
}

fn describe(e: TrainerError) -> String {
    if e.is_fatal() {
        log::error!("fatal: {}", e);
    } else {
        log::warn!("request failed: {}", e);
    }
    e.to_string()
}

fn handle_puzzle(engine: &TrainerEngine<FileStore>, rest: &str) -> Result<String, String> {
    let (user, _) = split_word(rest);
    if user.is_empty() {
        return Err("PUZZLE needs a user".to_string());
    }
    let puzzle = engine.select_and_build_puzzle(user).map_err(describe)?;
    let json = serde_json::to_string(&puzzle).map_err(|e| e.to_string())?;
    Ok(format!("PUZZLE_JSON {}", json))
}

fn handle_submit(engine: &TrainerEngine<FileStore>, rest: &str) -> Result<String, String> {
    let (user, body) = split_word(rest);
    if user.is_empty() || body.is_empty() {
        return Err("SUBMIT needs a user and a submission".to_string());
    }
    let submission: Submission =
        serde_json::from_str(body).map_err(|e| format!("malformed submission: {}", e))?;
    let report = engine.process_submission(user, &submission).map_err(describe)?;
    let json = serde_json::to_string(&report).map_err(|e| e.to_string())?;
    Ok(format!("RESULT_JSON {}", json))
}

fn handle_summary(engine: &TrainerEngine<FileStore>, rest: &str) -> Result<String, String> {
    let (user, _) = split_word(rest);
    if user.is_empty() {
        return Err("SUMMARY needs a user".to_string());
    }
    let summary = engine.user_summary(user).map_err(describe)?;
    let json = serde_json::to_string(&summary).map_err(|e| e.to_string())?;
    Ok(format!("SUMMARY_JSON {}", json))
}
