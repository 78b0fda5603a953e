//! Mô hình dữ liệu: lượt khám, các mục lâm sàng và điểm dữ liệu đã chiếu.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub type PatientId = i64;
pub type VisitId = i64;

/// Loại lượt khám.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum VisitType {
    First,
    #[serde(rename = "Follow-up", alias = "FollowUp")]
    FollowUp,
}

impl VisitType {
    pub fn as_str(self) -> &'static str {
        match self {
            VisitType::First => "First",
            VisitType::FollowUp => "Follow-up",
        }
    }
}

/// Một quan sát lâm sàng gắn với lượt khám (triệu chứng, tác dụng phụ, MSE).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClinicalEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score_onset: Option<f64>,
    #[serde(default)]
    pub score_progression: Option<f64>,
    #[serde(default)]
    pub score_current: f64,
    #[serde(default)]
    pub duration_text: Option<String>,
    #[serde(default)]
    pub note: String,
}

impl ClinicalEntry {
    pub fn new(name: impl Into<String>, score_current: f64) -> Self {
        Self {
            name: name.into(),
            score_current,
            ..Self::default()
        }
    }

    pub fn with_history(
        mut self,
        score_onset: Option<f64>,
        score_progression: Option<f64>,
        duration_text: impl Into<String>,
    ) -> Self {
        self.score_onset = score_onset;
        self.score_progression = score_progression;
        self.duration_text = Some(duration_text.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Dấu hiệu khám tâm thần (MSE), có thêm nhóm phân loại.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MseFinding {
    pub category: String,
    #[serde(flatten)]
    pub entry: ClinicalEntry,
}

impl MseFinding {
    /// Tên chuỗi dữ liệu: tên dấu hiệu, hoặc nhóm khi tên trống.
    pub fn series_name(&self) -> &str {
        let name = self.entry.name.trim();
        if name.is_empty() {
            self.category.trim()
        } else {
            name
        }
    }
}

/// Một bước trong phác đồ giảm liều.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TaperStep {
    #[serde(default, alias = "dose_mg")]
    pub dose: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default, alias = "duration")]
    pub duration_text: Option<String>,
    #[serde(default)]
    pub note: String,
}

/// Phác đồ giảm liều: danh sách bước tường minh hoặc chuỗi JSON lưu trong kho.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TaperPlan {
    Steps(Vec<TaperStep>),
    Encoded(String),
}

impl TaperPlan {
    /// Các bước hợp lệ; `None` nếu dữ liệu hỏng hoặc rỗng.
    pub fn steps(&self) -> Option<Cow<'_, [TaperStep]>> {
        let steps = match self {
            TaperPlan::Steps(steps) => Cow::Borrowed(steps.as_slice()),
            TaperPlan::Encoded(raw) => {
                Cow::Owned(serde_json::from_str::<Vec<TaperStep>>(raw).ok()?)
            }
        };
        if steps.is_empty() {
            None
        } else {
            Some(steps)
        }
    }
}

/// Một thuốc được kê trong lượt khám.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MedicationEntry {
    pub name: String,
    #[serde(default)]
    pub drug_type: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default, alias = "dose_mg")]
    pub dose: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration_text: Option<String>,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub is_tapering: bool,
    #[serde(default)]
    pub taper_plan: Option<TaperPlan>,
}

impl MedicationEntry {
    pub fn new(
        name: impl Into<String>,
        dose: impl Into<String>,
        duration_text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dose: dose.into(),
            duration_text: Some(duration_text.into()),
            ..Self::default()
        }
    }

    /// Gắn phác đồ giảm liều; bước đầu tiên trở thành liều của chính mục thuốc.
    pub fn with_taper(mut self, steps: Vec<TaperStep>) -> Self {
        if let Some(first) = steps.first() {
            self.dose = first.dose.clone();
            self.frequency = first.frequency.clone();
            self.duration_text = first.duration_text.clone();
            self.is_tapering = true;
            self.taper_plan = Some(TaperPlan::Steps(steps));
        }
        self
    }

    /// Các bước giảm liều nếu mục thuốc đang giảm liều và phác đồ đọc được.
    pub fn taper_steps(&self) -> Option<Cow<'_, [TaperStep]>> {
        if !self.is_tapering {
            return None;
        }
        self.taper_plan.as_ref()?.steps()
    }
}

/// Kết quả một thang điểm sàng lọc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScaleAssessment {
    pub scale_id: String,
    pub total_score: f64,
    #[serde(default)]
    pub severity: String,
}

/// Toàn bộ các mục ghi nhận của một lượt khám.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VisitEntries {
    #[serde(default)]
    pub symptoms: Vec<ClinicalEntry>,
    #[serde(default)]
    pub side_effects: Vec<ClinicalEntry>,
    #[serde(default)]
    pub mse: Vec<MseFinding>,
    #[serde(default)]
    pub medications: Vec<MedicationEntry>,
    #[serde(default)]
    pub scales: Vec<ScaleAssessment>,
}

impl VisitEntries {
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
            && self.side_effects.is_empty()
            && self.mse.is_empty()
            && self.medications.is_empty()
            && self.scales.is_empty()
    }
}

/// Một lượt khám của bệnh nhân.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    #[serde(default)]
    pub id: VisitId,
    pub patient_id: PatientId,
    pub date: NaiveDate,
    pub visit_type: VisitType,
    #[serde(default)]
    pub provisional_diagnosis: String,
    #[serde(default)]
    pub differential_diagnosis: String,
    #[serde(default)]
    pub note: String,
    #[serde(flatten)]
    pub entries: VisitEntries,
}

impl Visit {
    pub fn new(id: VisitId, patient_id: PatientId, date: NaiveDate, visit_type: VisitType) -> Self {
        Self {
            id,
            patient_id,
            date,
            visit_type,
            provisional_diagnosis: String::new(),
            differential_diagnosis: String::new(),
            note: String::new(),
            entries: VisitEntries::default(),
        }
    }

    /// Mốc chiếu của lượt khám.
    pub fn anchor(&self) -> VisitAnchor {
        VisitAnchor {
            visit_id: self.id,
            date: self.date,
            visit_type: self.visit_type,
        }
    }
}

/// Những gì bộ chiếu cần biết về lượt khám sở hữu một mục.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitAnchor {
    pub visit_id: VisitId,
    pub date: NaiveDate,
    pub visit_type: VisitType,
}

impl VisitAnchor {
    /// Nửa đêm UTC của ngày khám.
    pub fn instant(&self) -> DateTime<Utc> {
        self.date.and_time(NaiveTime::MIN).and_utc()
    }
}

/// Giai đoạn của một điểm trên timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Onset,
    Progression,
    Current,
}

/// Giai đoạn của điểm hợp nhất; `Mixed` khi nhiều giai đoạn trùng ngày.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum UnifiedPhase {
    Onset,
    Progression,
    Current,
    Mixed,
}

impl From<Phase> for UnifiedPhase {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Onset => UnifiedPhase::Onset,
            Phase::Progression => UnifiedPhase::Progression,
            Phase::Current => UnifiedPhase::Current,
        }
    }
}

/// Một điểm đã chiếu lên trục thời gian, dạng `{x, y, ...}` cho biểu đồ.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectedPoint {
    #[serde(rename = "x")]
    pub at: DateTime<Utc>,
    #[serde(rename = "y")]
    pub value: f64,
    pub phase: Phase,
    pub visit_id: VisitId,
    pub reported_on: NaiveDate,
    #[serde(default)]
    pub detail: String,
}

/// Chuỗi điểm theo một tên (triệu chứng, thuốc, dấu hiệu, thang điểm).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NamedSeries {
    pub name: String,
    pub points: Vec<ProjectedPoint>,
}

/// Một thành phần đóng góp vào điểm hợp nhất.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakdownItem {
    pub name: String,
    pub value: f64,
}

/// Điểm trung bình hợp nhất theo ngày.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnifiedPoint {
    #[serde(rename = "x")]
    pub date: NaiveDate,
    #[serde(rename = "y")]
    pub average: f64,
    pub breakdown: Vec<BreakdownItem>,
    pub phase: UnifiedPhase,
    pub visit_ids: Vec<VisitId>,
}

/// Đường hợp nhất của một nhóm lâm sàng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnifiedSeries {
    pub label: String,
    pub points: Vec<UnifiedPoint>,
}

/// Nhóm lâm sàng hiển thị trên life chart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Symptom,
    Medication,
    SideEffect,
    Mse,
    Scale,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Symptom,
        Category::Medication,
        Category::SideEffect,
        Category::Mse,
        Category::Scale,
    ];

    pub fn unified_label(self) -> &'static str {
        match self {
            Category::Symptom => "Unified Symptoms (Avg)",
            Category::Medication => "Unified Meds (Avg Dose)",
            Category::SideEffect => "Unified Side Effects (Avg)",
            Category::Mse => "Unified MSE (Avg)",
            Category::Scale => "Unified Scales (Avg)",
        }
    }
}

/// Giá trị theo từng nhóm lâm sàng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ByCategory<T> {
    pub symptom: T,
    pub medication: T,
    pub side_effect: T,
    pub mse: T,
    pub scale: T,
}

impl<T> ByCategory<T> {
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Symptom => &self.symptom,
            Category::Medication => &self.medication,
            Category::SideEffect => &self.side_effect,
            Category::Mse => &self.mse,
            Category::Scale => &self.scale,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Symptom => &mut self.symptom,
            Category::Medication => &mut self.medication,
            Category::SideEffect => &mut self.side_effect,
            Category::Mse => &mut self.mse,
            Category::Scale => &mut self.scale,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Category, &T) -> U) -> ByCategory<U> {
        ByCategory {
            symptom: f(Category::Symptom, &self.symptom),
            medication: f(Category::Medication, &self.medication),
            side_effect: f(Category::SideEffect, &self.side_effect),
            mse: f(Category::Mse, &self.mse),
            scale: f(Category::Scale, &self.scale),
        }
    }
}
