//! Trải liều thuốc thành chuỗi điểm theo ngày, kể cả phác đồ giảm liều.

use chrono::{DateTime, Duration, Utc};

use crate::dose::normalize_dose;
use crate::duration::parse_optional_duration;
use crate::frequency::describe_frequency;
use crate::model::{MedicationEntry, Phase, ProjectedPoint, TaperStep, VisitAnchor};
use crate::LifeChartConfig;

/// Trải một mục thuốc thành các điểm liều mỗi ngày kể từ ngày khám.
///
/// Khi đang giảm liều, mỗi bước nối tiếp bước trước, không hở và không chồng ngày.
/// Phác đồ không đọc được thì quay về liều và thời lượng của chính mục thuốc.
pub fn expand_medication(
    entry: &MedicationEntry,
    anchor: &VisitAnchor,
    config: &LifeChartConfig,
) -> Vec<ProjectedPoint> {
    let mut schedule = Schedule::new(anchor, config);

    if entry.is_tapering {
        if let Some(steps) = entry.taper_steps() {
            let total = steps.len();
            for (index, step) in steps.iter().enumerate() {
                let detail = step_detail(index, total, step);
                schedule.extend(&step.dose, step.duration_text.as_deref(), detail);
            }
            return schedule.points;
        }
        tracing::debug!(
            medication = %entry.name,
            visit_id = anchor.visit_id,
            "taper plan unreadable, using top-level dose"
        );
    }

    let detail = dose_detail(&entry.dose, &entry.frequency, &entry.note);
    schedule.extend(&entry.dose, entry.duration_text.as_deref(), detail);
    schedule.points
}

struct Schedule<'a> {
    anchor: &'a VisitAnchor,
    config: &'a LifeChartConfig,
    cursor: DateTime<Utc>,
    remaining_days: i64,
    points: Vec<ProjectedPoint>,
}

impl<'a> Schedule<'a> {
    fn new(anchor: &'a VisitAnchor, config: &'a LifeChartConfig) -> Self {
        Self {
            anchor,
            config,
            cursor: anchor.instant(),
            remaining_days: i64::from(config.max_schedule_days),
            points: Vec::new(),
        }
    }

    fn extend(&mut self, dose: &str, duration_text: Option<&str>, detail: String) {
        let value = normalize_dose(dose);
        let days = self.step_days(duration_text);

        for _ in 0..days {
            self.points.push(ProjectedPoint {
                at: self.cursor,
                value,
                phase: Phase::Current,
                visit_id: self.anchor.visit_id,
                reported_on: self.anchor.date,
                detail: detail.clone(),
            });
            match self.cursor.checked_add_signed(Duration::days(1)) {
                Some(next) => self.cursor = next,
                None => {
                    self.remaining_days = 0;
                    return;
                }
            }
        }
        self.remaining_days -= days;
    }

    fn step_days(&self, duration_text: Option<&str>) -> i64 {
        let minimum = i64::from(self.config.min_medication_days.max(1));
        let days = parse_optional_duration(duration_text)
            .map(|parsed| parsed.days())
            .filter(|days| *days > 0)
            .unwrap_or(minimum);

        if days > self.remaining_days {
            tracing::debug!(
                visit_id = self.anchor.visit_id,
                requested = days,
                allowed = self.remaining_days,
                "medication schedule clamped"
            );
        }
        days.min(self.remaining_days).max(0)
    }
}

fn dose_detail(dose: &str, frequency: &str, note: &str) -> String {
    let frequency = describe_frequency(frequency);
    [dose.trim(), frequency.as_str(), note.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

fn step_detail(index: usize, total: usize, step: &TaperStep) -> String {
    let base = dose_detail(&step.dose, &step.frequency, &step.note);
    if base.is_empty() {
        format!("Step {}/{total}", index + 1)
    } else {
        format!("Step {}/{total}: {base}", index + 1)
    }
}
