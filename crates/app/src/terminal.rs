//! Line-based terminal front end: prompts on stdout, answers from stdin.

use std::error::Error;
use std::io::Write;

use drill_core::model::{DrillItem, SessionSummary};
use drill_core::pool::PoolError;
use drill_core::session::SessionError;
use services::dashboard::{Dashboard, MasteryCell};
use services::{AnswerFeedback, AppServices, DrillError, PhaseRequest, SpeedFeedback};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type CliResult = Result<(), Box<dyn Error>>;

pub struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Run one bounded session until it finishes or stdin closes.
    pub async fn drill(
        &mut self,
        services: &AppServices,
        request: &PhaseRequest,
        streak: u32,
    ) -> CliResult {
        let drills = services.drills();
        if let PhaseRequest::Rules { topic } = request {
            println!("{}\n{}", topic.title(), topic.summary());
            for line in topic.lesson_lines(services.mappings()) {
                println!("  {line}");
            }
            println!();
        }

        let mut session = match drills.start(request).await {
            Ok(session) => session,
            Err(err) => match start_failure_message(&err) {
                Some(message) => {
                    println!("{message}");
                    return Ok(());
                }
                None => return Err(err.into()),
            },
        };
        println!("Streak: {streak} day(s). Blank lines are ignored; Ctrl-D quits.");

        while let Some(item) = session.current_item().cloned() {
            prompt_item(session.cursor() + 1, session.total_items(), &item)?;
            let Some(line) = self.lines.next_line().await? else {
                println!();
                return Ok(());
            };
            if let Some(feedback) = drills.submit(&mut session, &line).await? {
                print_feedback(&feedback);
            }
        }
        Ok(())
    }

    /// Run a countdown drill; the countdown interrupts a pending prompt.
    pub async fn speed(&mut self, services: &AppServices, duration: u32) -> CliResult {
        let mut drill = services.speed().start(duration).await?;
        let mut finished = drill.finished();
        println!("Speed drill: {duration}s. Type the pinyin for each zhuyin.");

        while let Some(item) = drill.current_item() {
            print!("[{:>3}s] {} > ", drill.stats().time_left, item.prompt());
            std::io::stdout().flush()?;

            tokio::select! {
                biased;
                _ = finished.wait_for(|done| *done) => {
                    println!("\nTime is up.");
                    break;
                }
                line = self.lines.next_line() => match line? {
                    Some(line) => match speed_step(drill.submit(&line).await)? {
                        SpeedStep::Answered(feedback) => print_speed_feedback(&feedback),
                        SpeedStep::Ignored => {}
                        SpeedStep::TimeUp => {
                            println!("\nTime is up.");
                            break;
                        }
                    },
                    None => {
                        drill.stop();
                        println!();
                        break;
                    }
                },
            }
        }

        let stats = drill.stats();
        println!(
            "Answered {} | correct {} | {:.0}% | {:.1} per minute",
            stats.total, stats.correct, stats.accuracy_percent, stats.throughput
        );
        Ok(())
    }

    /// Print XP, streak and the progress dashboard.
    pub async fn stats(&mut self, services: &AppServices, streak: u32) -> CliResult {
        let xp = services.gamification().xp().await?;
        println!("XP {xp} | streak {streak} day(s)");
        match services.dashboard().load().await {
            Ok(dashboard) => print_dashboard(&dashboard),
            Err(err) => println!("Progress unavailable: {err}"),
        }
        Ok(())
    }
}

/// Message for a session that could not start but leaves the CLI usable.
fn start_failure_message(err: &DrillError) -> Option<String> {
    match err {
        DrillError::Session(SessionError::Empty) => {
            Some("Nothing to drill for that selection.".to_string())
        }
        DrillError::NoQuiz { topic } => Some(format!("There is no quiz for {topic}.")),
        DrillError::Pool(PoolError::NoDistractors { item }) => Some(format!(
            "Recognition needs at least two sounds; {item} has nothing to choose against. Try typing mode or a larger group."
        )),
        _ => None,
    }
}

/// What the speed loop does with one submitted line.
#[derive(Debug)]
enum SpeedStep {
    Answered(SpeedFeedback),
    Ignored,
    /// The countdown ran out between the prompt and the answer.
    TimeUp,
}

fn speed_step(result: Result<Option<SpeedFeedback>, DrillError>) -> Result<SpeedStep, DrillError> {
    match result {
        Ok(Some(feedback)) => Ok(SpeedStep::Answered(feedback)),
        Ok(None) => Ok(SpeedStep::Ignored),
        Err(DrillError::Session(SessionError::NotInProgress)) => Ok(SpeedStep::TimeUp),
        Err(err) => Err(err),
    }
}

fn prompt_item(position: usize, total: usize, item: &DrillItem) -> std::io::Result<()> {
    println!("\n[{position}/{total}] {}", item.prompt());
    if let Some(options) = item.options() {
        for (index, option) in options.iter().enumerate() {
            println!("  {}. {option}", index + 1);
        }
    }
    print!("> ");
    std::io::stdout().flush()
}

fn print_feedback(feedback: &AnswerFeedback) {
    let outcome = &feedback.outcome;
    if outcome.correct {
        match feedback.xp_total {
            Some(xp) => println!("Correct! (XP {xp})"),
            None => println!("Correct!"),
        }
    } else {
        println!("Wrong: expected {}", outcome.item.expected_answer());
    }
    if let Some(hint) = &feedback.hint {
        println!("  {hint}");
    }
    if let Some(summary) = &feedback.summary {
        print_summary(summary);
    }
}

fn print_speed_feedback(feedback: &SpeedFeedback) {
    let answer = &feedback.answer;
    if answer.correct {
        println!("  ok");
    } else {
        println!("  no: {}", answer.item.expected_answer());
    }
}

fn print_summary(summary: &SessionSummary) {
    println!(
        "\nDone: {}/{} correct ({:.0}%) in {}s",
        summary.correct(),
        summary.total(),
        summary.accuracy_percent(),
        summary.elapsed_secs()
    );
    for mistake in summary.mistakes() {
        println!(
            "  {}: expected {}, got {}",
            mistake.prompt, mistake.expected, mistake.got
        );
    }
}

fn print_dashboard(dashboard: &Dashboard) {
    println!(
        "Studied {}/{} | mastered {}/{} | sessions {}",
        dashboard.studied,
        dashboard.total_items,
        dashboard.mastered,
        dashboard.total_items,
        dashboard.session_count
    );
    println!("\nInitials");
    print_grid(&dashboard.initials);
    println!("\nFinals");
    print_grid(&dashboard.finals);

    println!("\nWeakest");
    if dashboard.weak_items.is_empty() {
        println!("  none yet");
    }
    for item in &dashboard.weak_items {
        println!(
            "  {} ({}): wrong {} / right {}",
            item.item_id, item.item_type, item.wrong_count, item.correct_count
        );
    }

    println!("\nRecent sessions");
    if dashboard.recent_sessions.is_empty() {
        println!("  none yet");
    }
    for row in &dashboard.recent_sessions {
        let date = row
            .created_at
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string());
        println!(
            "  {date}  phase {} {}  {}/{} ({}%)  {}s",
            row.phase, row.mode, row.correct, row.total, row.accuracy, row.duration
        );
    }
}

fn print_grid(cells: &[MasteryCell]) {
    for row in cells.chunks(6) {
        let line: Vec<String> = row
            .iter()
            .map(|cell| format!("{:<3}{:<5}{}", cell.zhuyin, cell.pinyin, cell.level))
            .collect();
        println!("  {}", line.join("  "));
    }
}
