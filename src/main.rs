//! FlowCal - a headless focus timer driven from the terminal.
//!
//! Ticks the timer engine on a background thread and reads commands from
//! stdin, one per line.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use flowcal::event::{self, Command, EventResult};
use flowcal::timer::{self, TimerMessage};
use flowcal::{App, Database, Phase, PhaseEvent, SystemClock};

/// How long the driver waits for input before draining timer messages again.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "flowcal", version, about = "Pomodoro and stopwatch focus timer")]
struct Args {
    /// Database file (defaults to $FLOWCAL_DB, then the platform data directory)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Milliseconds between timer ticks
    #[arg(long, default_value_t = timer::TICK_INTERVAL.as_millis() as u64)]
    tick_ms: u64,
}

/// Driver state for the terminal loop.
struct Flowcal {
    app: Arc<Mutex<App>>,
    timer_rx: Receiver<TimerMessage>,
    input_rx: Receiver<String>,
}

impl Flowcal {
    fn process_timer_messages(&self) {
        while let Ok(msg) = self.timer_rx.try_recv() {
            match msg {
                TimerMessage::StateChanged { title } => {
                    log::trace!("{}", title);
                }
                TimerMessage::PhaseChanged(event) => announce(event),
            }
        }
    }

    /// Handles one input line. Returns false once the user quits.
    fn process_line(&self, line: &str) -> bool {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return true,
            Err(e) => {
                println!("{}", e);
                return true;
            }
        };

        let Ok(mut app) = self.app.lock() else {
            log::error!("App lock poisoned");
            return false;
        };
        match event::handle_command(&mut app, command) {
            EventResult::Reply(text) => println!("{}", text),
            EventResult::StateChanged => println!("{}", timer::format_status(app.timer())),
            EventResult::Quit => {
                // Credit whatever is running before exit
                app.stop_timer();
                return false;
            }
        }
        true
    }

    fn run(&self) {
        prompt();
        loop {
            self.process_timer_messages();
            match self.input_rx.recv_timeout(POLL_INTERVAL) {
                Ok(line) => {
                    if !self.process_line(&line) {
                        break;
                    }
                    prompt();
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    if let Ok(mut app) = self.app.lock() {
                        app.stop_timer();
                    }
                    break;
                }
            }
        }
    }
}

fn announce(event: PhaseEvent) {
    match event {
        PhaseEvent::WorkComplete {
            cycles_completed,
            next,
        } => println!(
            "\nPomodoro {} complete, time for a {}",
            cycles_completed,
            match next {
                Phase::LongBreak => "long break",
                _ => "short break",
            }
        ),
        PhaseEvent::BreakComplete => println!("\nBreak over, back to work"),
    }
}

fn prompt() {
    print!("> ");
    if let Err(e) = io::stdout().flush() {
        log::warn!("Failed to flush stdout: {}", e);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let app = match &args.db {
        Some(path) => App::with_db(Database::open(path)?, Arc::new(SystemClock))?,
        None => App::new()?,
    };
    let app = Arc::new(Mutex::new(app));

    // Create channel for timer messages
    let (timer_tx, timer_rx) = mpsc::channel();

    // Spawn timer tick thread
    let app_clone = Arc::clone(&app);
    let interval = Duration::from_millis(args.tick_ms.max(1));
    thread::spawn(move || {
        timer::run_timer_loop(app_clone, timer_tx, interval);
    });

    // Read stdin on its own thread so timer messages keep flowing
    let (input_tx, input_rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if input_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    let driver = Flowcal {
        app,
        timer_rx,
        input_rx,
    };
    driver.run();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_ms_defaults_to_engine_interval() {
        let args = Args::parse_from(["flowcal"]);
        assert_eq!(Duration::from_millis(args.tick_ms), timer::TICK_INTERVAL);
        assert!(args.db.is_none());

        let args = Args::parse_from(["flowcal", "--tick-ms", "10"]);
        assert_eq!(args.tick_ms, 10);
    }
}
