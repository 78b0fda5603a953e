//! Ranh giới với kho hồ sơ lượt khám.

use std::collections::BTreeMap;

use crate::model::{PatientId, Visit, VisitEntries, VisitId};
use crate::LifeChartError;

/// Kho hồ sơ cung cấp lượt khám theo bệnh nhân.
pub trait RecordStore {
    /// Các lượt khám của bệnh nhân, sắp theo ngày tăng dần.
    fn visits_for_patient(&self, patient_id: PatientId) -> Result<Vec<Visit>, LifeChartError>;
}

/// Kho trong bộ nhớ, dùng cho CLI, WASM và kiểm thử.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    visits: BTreeMap<VisitId, Visit>,
    next_id: VisitId,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nạp danh sách lượt khám từ JSON.
    pub fn from_json_str(json: &str) -> Result<Self, LifeChartError> {
        let visits: Vec<Visit> =
            serde_json::from_str(json).map_err(|err| LifeChartError::Parse(err.to_string()))?;
        let mut store = Self::new();
        for visit in visits {
            store.save_visit(visit);
        }
        Ok(store)
    }

    /// Lưu lượt khám; id <= 0 được cấp mới. Trả về id đã lưu.
    pub fn save_visit(&mut self, mut visit: Visit) -> VisitId {
        if visit.id <= 0 || self.visits.contains_key(&visit.id) {
            visit.id = self.next_id.max(1);
        }
        self.next_id = self.next_id.max(visit.id + 1);
        let id = visit.id;
        self.visits.insert(id, visit);
        id
    }

    /// Sửa lượt khám: xoá toàn bộ mục cũ và thay bằng mục mới.
    pub fn replace_entries(
        &mut self,
        visit_id: VisitId,
        entries: VisitEntries,
    ) -> Result<(), LifeChartError> {
        let visit = self
            .visits
            .get_mut(&visit_id)
            .ok_or(LifeChartError::VisitNotFound(visit_id))?;
        visit.entries = entries;
        Ok(())
    }

    /// Xoá lượt khám cùng mọi mục thuộc về nó.
    pub fn delete_visit(&mut self, visit_id: VisitId) -> Result<Visit, LifeChartError> {
        self.visits
            .remove(&visit_id)
            .ok_or(LifeChartError::VisitNotFound(visit_id))
    }

    pub fn visit(&self, visit_id: VisitId) -> Option<&Visit> {
        self.visits.get(&visit_id)
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn visits_for_patient(&self, patient_id: PatientId) -> Result<Vec<Visit>, LifeChartError> {
        let mut visits: Vec<Visit> = self
            .visits
            .values()
            .filter(|visit| visit.patient_id == patient_id)
            .cloned()
            .collect();
        visits.sort_by_key(|visit| (visit.date, visit.id));
        Ok(visits)
    }
}
