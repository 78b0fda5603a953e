//! Biểu mẫu lượt khám thô -> các dòng có kiểu -> `VisitEntries`.
//!
//! Biểu mẫu là multi-map tên trường -> danh sách giá trị theo thứ tự; mỗi trường
//! `name[]` là một cột của nhóm dòng lặp. Các cột được ghép theo vị trí thành
//! dòng có kiểu tại đây, phía sau không còn thấy mảng song song.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use lifechart_core::{
    ClinicalEntry, MedicationEntry, MseFinding, PatientId, Scale, ScaleAssessment, TaperStep,
    Visit, VisitEntries, VisitId, VisitType,
};
use serde_json::Value;

/// Lỗi khi đọc biểu mẫu gửi lên.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Không đọc được dữ liệu biểu mẫu: {0}")]
    Parse(String),
}

/// Các trường biểu mẫu nhiều giá trị, theo tên trường.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gom các cặp `(tên, giá trị)` theo thứ tự gửi.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = Self::new();
        for (name, value) in pairs {
            form.push(name, value);
        }
        form
    }

    /// Đọc từ object JSON có giá trị là scalar hoặc mảng scalar.
    pub fn from_json_value(value: &Value) -> Result<Self, FormError> {
        let object = value
            .as_object()
            .ok_or_else(|| FormError::Parse("Biểu mẫu phải là một object JSON".into()))?;

        let mut form = Self::new();
        for (name, value) in object {
            match value {
                Value::Array(items) => {
                    for item in items {
                        form.push(name.as_str(), scalar_text(item));
                    }
                }
                other => form.push(name.as_str(), scalar_text(other)),
            }
        }
        Ok(form)
    }

    pub fn from_json_str(json: &str) -> Result<Self, FormError> {
        let value: Value =
            serde_json::from_str(json).map_err(|err| FormError::Parse(err.to_string()))?;
        Self::from_json_value(&value)
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    /// Mọi giá trị gửi dưới tên `name`.
    pub fn list(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Giá trị không rỗng đầu tiên của `name`, đã cắt khoảng trắng.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.list(name)
            .iter()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    fn column(&self, name: &str, index: usize) -> &str {
        self.list(name)
            .get(index)
            .map(|value| value.trim())
            .unwrap_or_default()
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Một dòng lâm sàng có điểm (triệu chứng hoặc tác dụng phụ).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClinicalRow {
    pub name: String,
    pub onset: Option<f64>,
    pub progression: Option<f64>,
    pub current: Option<f64>,
    pub duration_text: String,
    pub note: String,
}

impl ClinicalRow {
    pub fn into_entry(self) -> ClinicalEntry {
        ClinicalEntry {
            name: self.name,
            score_onset: self.onset,
            score_progression: self.progression,
            score_current: self.current.unwrap_or(0.0),
            duration_text: non_empty(self.duration_text),
            note: self.note,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MseRow {
    pub category: String,
    pub finding: ClinicalRow,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MedicationRow {
    pub name: String,
    pub drug_type: String,
    pub form: String,
    pub dose: String,
    pub frequency: String,
    pub duration_text: String,
    pub note: String,
}

impl MedicationRow {
    fn same_drug(&self, other: &MedicationRow) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }

    fn to_step(&self) -> TaperStep {
        TaperStep {
            dose: self.dose.clone(),
            frequency: self.frequency.clone(),
            duration_text: non_empty(self.duration_text.clone()),
            note: self.note.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScaleRow {
    pub scale_id: String,
    pub total_score: Option<f64>,
    pub severity: String,
}

impl ScaleRow {
    /// Mức độ để trống được suy ra từ điểm với các thang được hỗ trợ.
    pub fn into_assessment(self) -> ScaleAssessment {
        let total_score = self.total_score.unwrap_or(0.0);
        let severity = if self.severity.is_empty() {
            match self.scale_id.parse::<Scale>() {
                Ok(scale) => scale.severity(total_score.round() as i64).to_string(),
                Err(err) => {
                    tracing::debug!(%err, "severity left blank");
                    String::new()
                }
            }
        } else {
            self.severity
        };
        ScaleAssessment {
            scale_id: self.scale_id,
            total_score,
            severity,
        }
    }
}

/// Biểu mẫu lượt khám đã kiểm tra và tách thành các dòng có kiểu.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisitForm {
    pub visit_date: Option<NaiveDate>,
    pub provisional_diagnosis: String,
    pub note: String,
    pub symptoms: Vec<ClinicalRow>,
    pub side_effects: Vec<ClinicalRow>,
    pub mse: Vec<MseRow>,
    pub medications: Vec<MedicationRow>,
    pub scales: Vec<ScaleRow>,
}

impl VisitForm {
    /// `visit_date` sai định dạng được coi như vắng mặt.
    pub fn from_fields(fields: &FormFields) -> Self {
        let visit_date = fields.first("visit_date").and_then(|raw| {
            match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    tracing::warn!(value = raw, "ignoring unparseable visit_date");
                    None
                }
            }
        });

        Self {
            visit_date,
            provisional_diagnosis: fields
                .first("provisional_diagnosis")
                .unwrap_or_default()
                .to_string(),
            note: fields.first("visit_note").unwrap_or_default().to_string(),
            symptoms: clinical_rows(fields, SYMPTOM_COLUMNS),
            side_effects: clinical_rows(fields, SIDE_EFFECT_COLUMNS),
            mse: mse_rows(fields),
            medications: medication_rows(fields),
            scales: scale_rows(fields),
        }
    }

    /// Các mục của lượt khám; dòng thuốc liền nhau cùng tên gộp thành phác đồ giảm liều.
    pub fn entries(&self) -> VisitEntries {
        VisitEntries {
            symptoms: self.symptoms.iter().cloned().map(ClinicalRow::into_entry).collect(),
            side_effects: self
                .side_effects
                .iter()
                .cloned()
                .map(ClinicalRow::into_entry)
                .collect(),
            mse: self
                .mse
                .iter()
                .cloned()
                .map(|row| MseFinding {
                    category: row.category,
                    entry: row.finding.into_entry(),
                })
                .collect(),
            medications: merge_tapers(&self.medications),
            scales: self.scales.iter().cloned().map(ScaleRow::into_assessment).collect(),
        }
    }

    /// Dựng lượt khám, lấy ngày `visit_date` nếu có, ngược lại `fallback_date`.
    pub fn into_visit(
        self,
        id: VisitId,
        patient_id: PatientId,
        visit_type: VisitType,
        fallback_date: NaiveDate,
    ) -> Visit {
        let mut visit = Visit::new(
            id,
            patient_id,
            self.visit_date.unwrap_or(fallback_date),
            visit_type,
        );
        visit.entries = self.entries();
        visit.provisional_diagnosis = self.provisional_diagnosis;
        visit.note = self.note;
        visit
    }
}

struct ClinicalColumns {
    kind: &'static str,
    name: &'static str,
    onset: &'static str,
    progression: &'static str,
    current: &'static str,
    duration: &'static str,
    note: &'static str,
}

const SYMPTOM_COLUMNS: &ClinicalColumns = &ClinicalColumns {
    kind: "symptom",
    name: "symptom_name[]",
    onset: "symptom_onset[]",
    progression: "symptom_progression[]",
    current: "symptom_current[]",
    duration: "duration_text[]",
    note: "symptom_note[]",
};

const SIDE_EFFECT_COLUMNS: &ClinicalColumns = &ClinicalColumns {
    kind: "side effect",
    name: "side_effect_name[]",
    onset: "side_effect_onset[]",
    progression: "side_effect_progression[]",
    current: "side_effect_score[]",
    duration: "side_effect_duration[]",
    note: "side_effect_note[]",
};

const MSE_COLUMNS: &ClinicalColumns = &ClinicalColumns {
    kind: "mse",
    name: "mse_finding_name[]",
    onset: "mse_onset[]",
    progression: "mse_progression[]",
    current: "mse_score[]",
    duration: "mse_duration[]",
    note: "mse_note[]",
};

fn clinical_rows(fields: &FormFields, columns: &ClinicalColumns) -> Vec<ClinicalRow> {
    fields
        .list(columns.name)
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let name = name.trim();
            if name.is_empty() {
                tracing::warn!(kind = columns.kind, row = index, "dropping row without a name");
                return None;
            }
            Some(clinical_row(fields, columns, index, name))
        })
        .collect()
}

fn clinical_row(
    fields: &FormFields,
    columns: &ClinicalColumns,
    index: usize,
    name: &str,
) -> ClinicalRow {
    ClinicalRow {
        name: name.to_string(),
        onset: parse_score(fields.column(columns.onset, index), columns.onset),
        progression: parse_score(fields.column(columns.progression, index), columns.progression),
        current: parse_score(fields.column(columns.current, index), columns.current),
        duration_text: fields.column(columns.duration, index).to_string(),
        note: fields.column(columns.note, index).to_string(),
    }
}

fn mse_rows(fields: &FormFields) -> Vec<MseRow> {
    fields
        .list("mse_category[]")
        .iter()
        .enumerate()
        .filter_map(|(index, category)| {
            let category = category.trim();
            if category.is_empty() {
                tracing::warn!(row = index, "dropping mse row without a category");
                return None;
            }
            let name = fields.column(MSE_COLUMNS.name, index);
            Some(MseRow {
                category: category.to_string(),
                finding: clinical_row(fields, MSE_COLUMNS, index, name),
            })
        })
        .collect()
}

fn medication_rows(fields: &FormFields) -> Vec<MedicationRow> {
    fields
        .list("drug_name[]")
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let name = name.trim();
            if name.is_empty() {
                tracing::warn!(row = index, "dropping medication row without a drug name");
                return None;
            }
            Some(MedicationRow {
                name: name.to_string(),
                drug_type: fields.column("drug_type[]", index).to_string(),
                form: fields.column("form_type[]", index).to_string(),
                dose: fields.column("dose_mg[]", index).to_string(),
                frequency: fields.column("frequency[]", index).to_string(),
                duration_text: fields.column("med_duration_text[]", index).to_string(),
                note: fields.column("med_note[]", index).to_string(),
            })
        })
        .collect()
}

fn scale_rows(fields: &FormFields) -> Vec<ScaleRow> {
    fields
        .list("scale_id[]")
        .iter()
        .enumerate()
        .filter_map(|(index, scale_id)| {
            let scale_id = scale_id.trim();
            if scale_id.is_empty() {
                return None;
            }
            Some(ScaleRow {
                scale_id: scale_id.to_string(),
                total_score: parse_score(fields.column("scale_score[]", index), "scale_score[]"),
                severity: fields.column("scale_severity[]", index).to_string(),
            })
        })
        .collect()
}

/// Chuỗi dòng liền nhau cùng tên thuốc gộp thành một mục giảm liều.
fn merge_tapers(rows: &[MedicationRow]) -> Vec<MedicationEntry> {
    let mut merged = Vec::new();
    let mut start = 0;

    while start < rows.len() {
        let first = &rows[start];
        let end = rows[start..]
            .iter()
            .position(|row| !row.same_drug(first))
            .map_or(rows.len(), |offset| start + offset);
        let run = &rows[start..end];

        let mut entry = MedicationEntry {
            name: first.name.clone(),
            drug_type: non_empty(first.drug_type.clone()),
            form: non_empty(first.form.clone()),
            dose: first.dose.clone(),
            frequency: first.frequency.clone(),
            duration_text: non_empty(first.duration_text.clone()),
            note: first.note.clone(),
            ..MedicationEntry::default()
        };
        if run.len() > 1 {
            entry = entry.with_taper(run.iter().map(MedicationRow::to_step).collect());
        }
        merged.push(entry);
        start = end;
    }

    merged
}

fn parse_score(raw: &str, field: &'static str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            tracing::warn!(field, value = raw, "ignoring non-numeric score");
            None
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
