use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use clap::Subcommand;
use lemonstudys_core::{Config, PomodoroTimer, TimerEvent};
use tracing::info;

#[derive(Subcommand)]
pub enum PomodoroAction {
    /// Run one work/break session, printing timer events as JSON lines
    Run {
        /// Work phase length in seconds (default from config)
        #[arg(long)]
        work: Option<u32>,
        /// Break phase length in seconds (default from config)
        #[arg(long = "break")]
        break_secs: Option<u32>,
    },
}

pub fn run(action: PomodoroAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PomodoroAction::Run { work, break_secs } => {
            let config = Config::load()?;
            let work = work.unwrap_or(config.pomodoro.work_secs);
            let break_secs = break_secs.unwrap_or(config.pomodoro.break_secs);
            run_session(work, break_secs)
        }
    }
}

fn run_session(work_secs: u32, break_secs: u32) -> Result<(), Box<dyn std::error::Error>> {
    let ended = Rc::new(Cell::new(false));
    let mut timer = PomodoroTimer::new();

    // Subscribe after starting so the reset to Idle is not printed.
    timer.start_session(work_secs, break_secs);
    print_event(&TimerEvent::StateChanged {
        state: timer.state(),
    });
    print_event(&TimerEvent::RemainingChanged {
        remaining_secs: timer.remaining_secs(),
    });

    let flag = ended.clone();
    timer.subscribe(move |event| {
        print_event(event);
        if matches!(event, TimerEvent::SessionEnded) {
            flag.set(true);
        }
    });

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    timer.poll();
                    if ended.get() {
                        break;
                    }
                }
                res = &mut ctrl_c => {
                    res?;
                    info!("interrupted, stopping session");
                    timer.stop();
                    break;
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn print_event(event: &TimerEvent) {
    if let Ok(line) = serde_json::to_string(event) {
        println!("{line}");
    }
}
