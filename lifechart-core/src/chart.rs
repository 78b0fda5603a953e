//! Dữ liệu life chart hoàn chỉnh cho tầng hiển thị.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frequency::describe_frequency;
use crate::model::{ByCategory, NamedSeries, PatientId, UnifiedSeries, Visit, VisitId, VisitType};
use crate::series::aggregate_series;
use crate::store::RecordStore;
use crate::unified::unify_series;
use crate::{LifeChartConfig, LifeChartError};

/// Kết quả tổng hợp cuối cùng: chuỗi theo nhóm, đường hợp nhất và chi tiết lượt khám.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChartData {
    pub series_by_category: ByCategory<Vec<NamedSeries>>,
    pub unified_by_category: ByCategory<Option<UnifiedSeries>>,
    pub visit_details_by_id: BTreeMap<VisitId, VisitDetail>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.visit_details_by_id.is_empty()
    }

    /// Tổng số điểm trên mọi chuỗi.
    pub fn point_count(&self) -> usize {
        let counts = self
            .series_by_category
            .map(|_, series| series.iter().map(|s| s.points.len()).sum::<usize>());
        counts.symptom + counts.medication + counts.side_effect + counts.mse + counts.scale
    }
}

/// Tóm tắt một lượt khám cho hộp thoại chi tiết.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitDetail {
    pub date: NaiveDate,
    pub visit_type: VisitType,
    pub diagnosis: String,
    pub note: String,
    pub symptoms: Vec<EntrySummary>,
    pub medications: Vec<MedicationSummary>,
    pub side_effects: Vec<EntrySummary>,
    pub mse: Vec<EntrySummary>,
    pub scales: Vec<EntrySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntrySummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub score: f64,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationSummary {
    pub name: String,
    pub dose: String,
    pub frequency: String,
    pub note: String,
    pub taper_steps: usize,
}

impl VisitDetail {
    fn from_visit(visit: &Visit) -> Self {
        let entries = &visit.entries;
        Self {
            date: visit.date,
            visit_type: visit.visit_type,
            diagnosis: visit.provisional_diagnosis.clone(),
            note: visit.note.clone(),
            symptoms: entries
                .symptoms
                .iter()
                .map(|entry| EntrySummary {
                    name: entry.name.clone(),
                    category: None,
                    score: entry.score_current,
                    note: entry.note.clone(),
                })
                .collect(),
            medications: entries
                .medications
                .iter()
                .map(|entry| MedicationSummary {
                    name: entry.name.clone(),
                    dose: entry.dose.clone(),
                    frequency: describe_frequency(&entry.frequency),
                    note: entry.note.clone(),
                    taper_steps: entry.taper_steps().map_or(0, |steps| steps.len()),
                })
                .collect(),
            side_effects: entries
                .side_effects
                .iter()
                .map(|entry| EntrySummary {
                    name: entry.name.clone(),
                    category: None,
                    score: entry.score_current,
                    note: entry.note.clone(),
                })
                .collect(),
            mse: entries
                .mse
                .iter()
                .map(|finding| EntrySummary {
                    name: finding.entry.name.clone(),
                    category: Some(finding.category.clone()),
                    score: finding.entry.score_current,
                    note: finding.entry.note.clone(),
                })
                .collect(),
            scales: entries
                .scales
                .iter()
                .map(|scale| EntrySummary {
                    name: scale.scale_id.clone(),
                    category: None,
                    score: scale.total_score,
                    note: scale.severity.clone(),
                })
                .collect(),
        }
    }
}

/// Dựng dữ liệu biểu đồ từ lịch sử khám đã có sẵn.
pub fn build_chart(visits: &[Visit], config: &LifeChartConfig) -> ChartData {
    let series_by_category = aggregate_series(visits, config);
    let unified_by_category = series_by_category.map(|category, series| {
        unify_series(series, category.unified_label(), config.unified_precision)
    });
    let visit_details_by_id = visits
        .iter()
        .map(|visit| (visit.id, VisitDetail::from_visit(visit)))
        .collect();

    ChartData {
        series_by_category,
        unified_by_category,
        visit_details_by_id,
    }
}

/// Dựng dữ liệu biểu đồ cho một bệnh nhân từ kho hồ sơ.
pub fn prepare_chart_data<S>(
    store: &S,
    patient_id: PatientId,
    config: &LifeChartConfig,
) -> Result<ChartData, LifeChartError>
where
    S: RecordStore + ?Sized,
{
    let visits = store.visits_for_patient(patient_id)?;
    tracing::debug!(patient_id, visits = visits.len(), "preparing life chart");
    Ok(build_chart(&visits, config))
}
