// src/aggregation/session.rs
//
// Cross-participant summary for one device: one row per participant summary,
// followed by the Sum/Mean/Std/Min/Max rows.

use super::participant::ParticipantSummary;
use super::table::Table;
use crate::evaluation::FieldValue;

pub const PARTICIPANT_HEADER: &str = "Participant";

/// Label of a participant row, `<pseudo>_<device>`
pub fn participant_label(summary: &ParticipantSummary) -> String {
    format!("{}_{}", summary.pseudo, summary.device_id)
}

pub fn global_summary(summaries: &[ParticipantSummary]) -> Table {
    Table::from_rows(summaries.iter().map(|s| {
        let cells = s
            .metrics
            .iter()
            .map(|(name, value)| {
                let cell = value.map_or(FieldValue::Missing, FieldValue::Float);
                (name.clone(), cell)
            })
            .collect();
        (participant_label(s), cells)
    }))
    .with_stats()
}
