use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use std::error::Error;
use std::io::{stdin, stdout, Write};
use std::time::Instant;
use trainer_core::core::types::WordReport;
use trainer_core::logging::init_file_logger;
use trainer_core::{Puzzle, Submission, SubmissionOutcome, SubmissionReport, TrainerConfig, TrainerEngine};

fn main() -> Result<(), Box<dyn Error>> {
    let config = TrainerConfig::discover()?;
    if let Err(e) = init_file_logger(&config.log_path, config.log_filter()) {
        eprintln!("[WARN] file logging disabled: {}", e);
    }
    let engine = TrainerEngine::from_config(&config)?;
    let user = std::env::args().nth(1).unwrap_or_else(|| "player".to_string());

    loop {
        let puzzle = engine.select_and_build_puzzle(&user)?;
        print_puzzle(&puzzle, &user)?;

        let started = Instant::now();
        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let elapsed_secs = started.elapsed().as_secs_f64();

        let answer = input.trim();
        if answer.eq_ignore_ascii_case("exit") {
            break;
        }
        let gave_up = answer.eq_ignore_ascii_case("give up") || answer.is_empty();
        let submission = Submission {
            word_index: puzzle.word_index,
            target_anagrams: puzzle.primary_words.clone(),
            submitted_word: if gave_up { String::new() } else { answer.to_string() },
            elapsed_secs,
            is_failed: gave_up,
        };

        let report = engine.process_submission(&user, &submission)?;
        print_report(&report, &puzzle, elapsed_secs);
        print!("\nPress [Enter] for the next word ");
        stdout().flush()?;
        input.clear();
        if stdin().read_line(&mut input)? == 0 || input.trim().eq_ignore_ascii_case("exit") {
            break;
        }
    }

    let summary = engine.user_summary(&user)?;
    let overall = &summary.overall;
    println!("\nSession over for {}.", user.as_str().bold());
    println!(
        "  direct <10s: {}  direct 10-20s: {}  indirect: {}  failed: {}",
        overall.success_direct_under_10,
        overall.success_direct_between_10_and_20,
        overall.success_indirect,
        overall.fail
    );
    println!(
        "  average success time: {:.1}s, total likelihood {:.0} of {:.0}",
        overall.average_success_time, summary.total_likelihood, summary.baseline_likelihood
    );
    Ok(())
}

fn print_puzzle(puzzle: &Puzzle, user: &str) -> std::io::Result<()> {
    let mut out = stdout();
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    println!("{}", "Countdown Word Trainer".bold());
    println!("---------------------------------------------------------------");
    println!("Player: {}. Type the longest word you can find.", user);
    println!("'give up' (or empty) to reveal, 'exit' to quit.\n");

    let tiles: Vec<String> = puzzle.letters.chars().map(|c| format!("[{}]", c)).collect();
    println!("    {}", tiles.join(" ").yellow().bold());
    if puzzle.is_fallback {
        println!("{}", "    (padded rack: a longer word may exist)".dark_grey());
    }
    print!("\n> ");
    out.flush()
}

fn print_report(report: &SubmissionReport, puzzle: &Puzzle, elapsed_secs: f64) {
    let headline = match report.outcome {
        SubmissionOutcome::DirectSuccess => format!("Correct in {:.1}s!", elapsed_secs).green().bold(),
        SubmissionOutcome::IndirectSuccess => {
            format!("A tracked word, but not the target ({:.1}s).", elapsed_secs).cyan().bold()
        }
        SubmissionOutcome::UntrackedWord => String::from("A real word, but not one we track.").cyan(),
        SubmissionOutcome::Failed => String::from("Gave up.").red().bold(),
        SubmissionOutcome::UnrecognizedTreatedAsFail => String::from("Not a word we know.").red().bold(),
    };
    println!("\n{}", headline);
    println!("Target: {}", puzzle.primary_words.join(" / ").bold());
    if puzzle.correct_words.len() > puzzle.primary_words.len() {
        println!("Also possible: {}", puzzle.correct_words[puzzle.primary_words.len()..].join(", "));
    }

    print_word(&report.target_word);
    if let Some(word) = &report.submitted_word {
        print_word(word);
    }
    println!(
        "Overall likelihood {:.1} ({:+.1}), average time {:.1}s ({:+.1}s)",
        report.overall.old_likelihood,
        report.overall.change_in_likelihood,
        report.overall.old_average_success_time,
        report.overall.change_in_average_success_time
    );
}

fn print_word(word: &WordReport) {
    let Some(category) = word.category else {
        return;
    };
    println!(
        "  {} [{:?}]: likelihood {:.1} ({:+.1}), average time {:.1}s ({:+.1}s)",
        word.word_data.anagrams[0],
        category,
        word.old_likelihood,
        word.change_in_likelihood,
        word.old_average_success_time,
        word.change_in_average_success_time
    );
}
