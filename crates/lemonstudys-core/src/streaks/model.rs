//! Presentation-boundary view of the streak collection.
//!
//! A UI binds to rows by field name; [`StreakField`] carries the names and
//! [`FieldValue`] the dynamically typed cell. [`StreakRow`] is the whole row
//! flattened for serialization.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::streak::Streak;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreakField {
    Title,
    StreakDuration,
    BestStreak,
    LastActivity,
    IsActiveToday,
    IsStreakBroken,
    DaysSinceLastActivity,
    IsBestStreakZero,
}

impl StreakField {
    pub const ALL: [StreakField; 8] = [
        StreakField::Title,
        StreakField::StreakDuration,
        StreakField::BestStreak,
        StreakField::LastActivity,
        StreakField::IsActiveToday,
        StreakField::IsStreakBroken,
        StreakField::DaysSinceLastActivity,
        StreakField::IsBestStreakZero,
    ];

    /// Binding name used by the presentation layer.
    pub fn name(&self) -> &'static str {
        match self {
            StreakField::Title => "title",
            StreakField::StreakDuration => "streakDuration",
            StreakField::BestStreak => "bestStreak",
            StreakField::LastActivity => "lastActivity",
            StreakField::IsActiveToday => "isActiveToday",
            StreakField::IsStreakBroken => "isStreakBroken",
            StreakField::DaysSinceLastActivity => "daysSinceLastActivity",
            StreakField::IsBestStreakZero => "isBestStreakZero",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Only the title and the current duration can be written back.
    pub fn is_editable(&self) -> bool {
        matches!(self, StreakField::Title | StreakField::StreakDuration)
    }

    pub(crate) fn read(&self, streak: &Streak, today: NaiveDate) -> FieldValue {
        match self {
            StreakField::Title => FieldValue::Text(streak.title().to_string()),
            StreakField::StreakDuration => FieldValue::Int(streak.streak_duration().into()),
            StreakField::BestStreak => FieldValue::Int(streak.best_streak().into()),
            StreakField::LastActivity => FieldValue::Timestamp(streak.last_activity()),
            StreakField::IsActiveToday => FieldValue::Bool(streak.is_active_on(today)),
            StreakField::IsStreakBroken => FieldValue::Bool(streak.is_streak_broken_on(today)),
            StreakField::DaysSinceLastActivity => {
                FieldValue::Int(streak.days_since_last_activity_on(today))
            }
            StreakField::IsBestStreakZero => FieldValue::Bool(streak.is_best_streak_zero()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Timestamp(Option<DateTime<Local>>),
}

/// One row with every derived field evaluated at the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRow {
    pub index: usize,
    pub id: i64,
    pub title: String,
    pub streak_duration: u32,
    pub best_streak: u32,
    pub last_activity: Option<DateTime<Local>>,
    pub is_active_today: bool,
    pub is_streak_broken: bool,
    pub days_since_last_activity: i64,
    pub is_best_streak_zero: bool,
}

impl StreakRow {
    pub fn from_streak(index: usize, streak: &Streak, today: NaiveDate) -> Self {
        Self {
            index,
            id: streak.id(),
            title: streak.title().to_string(),
            streak_duration: streak.streak_duration(),
            best_streak: streak.best_streak(),
            last_activity: streak.last_activity(),
            is_active_today: streak.is_active_on(today),
            is_streak_broken: streak.is_streak_broken_on(today),
            days_since_last_activity: streak.days_since_last_activity_on(today),
            is_best_streak_zero: streak.is_best_streak_zero(),
        }
    }
}

/// Aggregate counters shown next to the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub total_streaks: usize,
    pub active_streaks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for field in StreakField::ALL {
            assert_eq!(StreakField::from_name(field.name()), Some(field));
        }
        assert_eq!(StreakField::from_name("id"), None);
    }

    #[test]
    fn only_title_and_duration_are_editable() {
        let editable: Vec<_> = StreakField::ALL
            .into_iter()
            .filter(StreakField::is_editable)
            .collect();
        assert_eq!(editable, vec![StreakField::Title, StreakField::StreakDuration]);
    }

    #[test]
    fn row_serializes_with_binding_names() {
        let streak = Streak::new("Reading");
        let today = Local::now().date_naive();
        let json = serde_json::to_value(StreakRow::from_streak(0, &streak, today)).unwrap();
        for field in StreakField::ALL {
            assert!(json.get(field.name()).is_some(), "missing {}", field.name());
        }
        assert_eq!(json["daysSinceLastActivity"], -1);
        assert_eq!(json["isStreakBroken"], true);
    }
}
