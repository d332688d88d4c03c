//! Engine-level error taxonomy.

use thiserror::Error;

use crate::pricing::DayKind;

/// Errors that abort a simulation run or reject a schedule at construction.
///
/// Every variant is fatal to the run that raised it and is surfaced to the
/// caller unmodified; the engine never recovers silently or substitutes
/// defaults for missing data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// An input series or rule violated an ordering or range invariant.
    #[error("malformed input at index {index}: {reason}")]
    MalformedInput { index: usize, reason: String },

    /// No pricing rule covers some instant of the horizon.
    #[error("pricing schedule gap: no rule covers {day_kind} hour {hour}")]
    ScheduleGap { day_kind: DayKind, hour: u32 },

    /// More than one pricing rule claims the same instant.
    #[error("pricing schedule overlap: multiple rules cover {day_kind} hour {hour}")]
    ScheduleOverlap { day_kind: DayKind, hour: u32 },

    /// Aggregation was requested on an empty record sequence.
    #[error("cannot summarize an empty run")]
    EmptyRun,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_names_the_index() {
        let err = SimError::MalformedInput {
            index: 7,
            reason: "negative usage -1.5".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("index 7"));
        assert!(msg.contains("negative usage"));
    }

    #[test]
    fn schedule_errors_name_the_cell() {
        let gap = SimError::ScheduleGap {
            day_kind: DayKind::Weekend,
            hour: 3,
        };
        assert!(gap.to_string().contains("weekend hour 3"));

        let overlap = SimError::ScheduleOverlap {
            day_kind: DayKind::Weekday,
            hour: 12,
        };
        assert!(overlap.to_string().contains("weekday hour 12"));
    }
}
