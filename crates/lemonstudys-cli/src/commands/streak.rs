use clap::Subcommand;
use lemonstudys_core::{Config, Database, StreakManager, SystemClock, ValidationError};

#[derive(Subcommand)]
pub enum StreakAction {
    /// List all streaks as JSON
    List,
    /// Create a new streak
    Add {
        /// Streak title
        title: String,
    },
    /// Delete a streak
    Remove {
        /// Row index as shown by `list`
        index: usize,
    },
    /// Record today's activity and extend the streak
    Increment { index: usize },
    /// Zero the current streak, keeping the best
    Reset { index: usize },
    /// Change a streak's title
    Rename { index: usize, title: String },
    /// Zero every streak inactive for longer than the expiry window
    Sweep,
    /// Print total and active counts
    Summary,
}

fn open_manager() -> Result<StreakManager<Database>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open_with(&config)?;
    Ok(StreakManager::new(db, SystemClock, config.streak_settings())?)
}

fn check_index(
    manager: &StreakManager<Database>,
    index: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if index >= manager.count() {
        return Err(ValidationError::OutOfBounds {
            collection: "streaks".into(),
            index,
            len: manager.count(),
        }
        .into());
    }
    Ok(())
}

fn print_row(
    manager: &StreakManager<Database>,
    index: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(row) = manager.row(index) {
        println!("{}", serde_json::to_string_pretty(&row)?);
    }
    Ok(())
}

pub fn run(action: StreakAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut manager = open_manager()?;

    match action {
        StreakAction::List => {
            println!("{}", serde_json::to_string_pretty(&manager.rows())?);
        }
        StreakAction::Add { title } => {
            let index = manager
                .add(&title)
                .ok_or_else(|| format!("could not add streak '{title}'"))?;
            print_row(&manager, index)?;
        }
        StreakAction::Remove { index } => {
            check_index(&manager, index)?;
            manager.remove(index);
            println!(
                "{}",
                serde_json::json!({ "type": "streak_removed", "index": index })
            );
        }
        StreakAction::Increment { index } => {
            check_index(&manager, index)?;
            manager.increment(index);
            print_row(&manager, index)?;
        }
        StreakAction::Reset { index } => {
            check_index(&manager, index)?;
            manager.reset(index);
            print_row(&manager, index)?;
        }
        StreakAction::Rename { index, title } => {
            check_index(&manager, index)?;
            if !manager.rename(index, &title) {
                return Err(ValidationError::InvalidValue {
                    field: "title".into(),
                    message: "must not be blank".into(),
                }
                .into());
            }
            print_row(&manager, index)?;
        }
        StreakAction::Sweep => {
            let expired = manager.sweep_expired();
            println!(
                "{}",
                serde_json::json!({ "type": "streaks_swept", "expired": expired })
            );
        }
        StreakAction::Summary => {
            println!("{}", serde_json::to_string_pretty(&manager.summary())?);
        }
    }
    Ok(())
}
