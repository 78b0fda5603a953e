//! Chiếu một mục lâm sàng thành các điểm Onset / Progression / Current.

use chrono::Duration;

use crate::duration::parse_optional_duration;
use crate::model::{ClinicalEntry, Phase, ProjectedPoint, VisitAnchor, VisitType};

/// Chiếu một mục lâm sàng của lượt khám thành 1–3 điểm.
///
/// Chỉ lượt khám `First` mới lùi ngày Onset/Progression theo `duration_text`;
/// lượt tái khám chỉ có điểm Current. Điểm không có giá trị bị bỏ qua.
pub fn project_entry(entry: &ClinicalEntry, anchor: &VisitAnchor) -> Vec<ProjectedPoint> {
    let current_at = anchor.instant();
    let point = |at, value: Option<f64>, phase| {
        value.map(|value| ProjectedPoint {
            at,
            value,
            phase,
            visit_id: anchor.visit_id,
            reported_on: anchor.date,
            detail: entry.note.clone(),
        })
    };

    match anchor.visit_type {
        VisitType::First => {
            let lookback = parse_optional_duration(entry.duration_text.as_deref())
                .map(|parsed| parsed.span())
                .unwrap_or_else(Duration::zero);
            let onset_at = current_at
                .checked_sub_signed(lookback)
                .unwrap_or(current_at);
            let progression_at = onset_at + (current_at - onset_at) / 2;

            [
                point(onset_at, entry.score_onset, Phase::Onset),
                point(progression_at, entry.score_progression, Phase::Progression),
                point(current_at, Some(entry.score_current), Phase::Current),
            ]
            .into_iter()
            .flatten()
            .collect()
        }
        VisitType::FollowUp => point(current_at, Some(entry.score_current), Phase::Current)
            .into_iter()
            .collect(),
    }
}
