//! Gom các điểm đã chiếu thành chuỗi theo tên cho toàn bộ lịch sử khám.

use std::collections::HashMap;

use crate::medication::expand_medication;
use crate::model::{
    ByCategory, Category, NamedSeries, Phase, ProjectedPoint, ScaleAssessment, Visit, VisitAnchor,
};
use crate::projector::project_entry;
use crate::LifeChartConfig;

/// Chiếu mọi mục của mọi lượt khám và gom theo nhóm, theo tên.
///
/// Lượt khám được xử lý theo (ngày, id); thứ tự tên giữ theo lần xuất hiện đầu tiên,
/// điểm trong từng chuỗi được sắp theo thời gian tăng dần.
pub fn aggregate_series(
    visits: &[Visit],
    config: &LifeChartConfig,
) -> ByCategory<Vec<NamedSeries>> {
    let mut ordered: Vec<&Visit> = visits.iter().collect();
    ordered.sort_by_key(|visit| (visit.date, visit.id));

    let mut accumulators: ByCategory<SeriesAccumulator> = ByCategory::default();

    for visit in ordered {
        let anchor = visit.anchor();
        let entries = &visit.entries;

        for entry in &entries.symptoms {
            accumulators
                .symptom
                .push(&entry.name, project_entry(entry, &anchor));
        }
        for entry in &entries.side_effects {
            accumulators
                .side_effect
                .push(&entry.name, project_entry(entry, &anchor));
        }
        for finding in &entries.mse {
            accumulators
                .mse
                .push(finding.series_name(), project_entry(&finding.entry, &anchor));
        }
        for medication in &entries.medications {
            accumulators.medication.push(
                &medication.name,
                expand_medication(medication, &anchor, config),
            );
        }
        for scale in &entries.scales {
            accumulators
                .scale
                .push(&scale.scale_id, vec![project_scale(scale, &anchor)]);
        }
    }

    let mut result = ByCategory::default();
    for category in Category::ALL {
        let accumulator = std::mem::take(accumulators.get_mut(category));
        *result.get_mut(category) = accumulator.finish();
    }
    result
}

fn project_scale(scale: &ScaleAssessment, anchor: &VisitAnchor) -> ProjectedPoint {
    ProjectedPoint {
        at: anchor.instant(),
        value: scale.total_score,
        phase: Phase::Current,
        visit_id: anchor.visit_id,
        reported_on: anchor.date,
        detail: scale.severity.clone(),
    }
}

#[derive(Default)]
struct SeriesAccumulator {
    series: Vec<NamedSeries>,
    index: HashMap<String, usize>,
}

impl SeriesAccumulator {
    fn push(&mut self, name: &str, points: Vec<ProjectedPoint>) {
        let name = name.trim();
        if name.is_empty() || points.is_empty() {
            return;
        }

        let slot = match self.index.get(name) {
            Some(slot) => *slot,
            None => {
                self.series.push(NamedSeries {
                    name: name.to_string(),
                    points: Vec::new(),
                });
                self.index.insert(name.to_string(), self.series.len() - 1);
                self.series.len() - 1
            }
        };
        self.series[slot].points.extend(points);
    }

    fn finish(self) -> Vec<NamedSeries> {
        self.series
            .into_iter()
            .map(|mut series| {
                series.points.sort_by_key(|point| point.at);
                series
            })
            .collect()
    }
}
