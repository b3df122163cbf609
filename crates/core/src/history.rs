use crate::model::{HistoryRecord, ScoreBand};

/// One line per archived interview: `#id date score/100 band verdict`.
pub fn summarize(record: &HistoryRecord) -> String {
    let date = if record.date.trim().is_empty() {
        "unknown date"
    } else {
        record.date.trim()
    };
    let verdict = if record.verdict.trim().is_empty() {
        "no verdict"
    } else {
        record.verdict.trim()
    };
    format!(
        "#{} {} {}/100 {} {}",
        record.id,
        date,
        record.score,
        ScoreBand::from_score(record.score),
        verdict
    )
}
