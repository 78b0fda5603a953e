//! Logic lõi chiếu dữ liệu lâm sàng lên trục thời gian và tổng hợp life chart.

pub mod chart;
pub mod dose;
pub mod duration;
pub mod frequency;
pub mod medication;
pub mod model;
pub mod projector;
pub mod scales;
pub mod series;
pub mod store;
pub mod unified;

use serde::{Deserialize, Serialize};

pub use chart::{build_chart, prepare_chart_data, ChartData, VisitDetail};
pub use dose::normalize_dose;
pub use duration::{parse_duration, DurationUnit, ParsedDuration};
pub use frequency::describe_frequency;
pub use medication::expand_medication;
pub use model::*;
pub use projector::project_entry;
pub use scales::{score_scale, Scale};
pub use series::aggregate_series;
pub use store::{MemoryRecordStore, RecordStore};
pub use unified::unify_series;

/// Cấu hình engine life chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifeChartConfig {
    /// Thời gian sống (phút) của một liên kết chia sẻ cho khách.
    pub share_ttl_minutes: u32,
    /// Số ngày tối thiểu của một đơn thuốc khi không đọc được thời lượng.
    pub min_medication_days: u32,
    /// Giới hạn tổng số ngày trải ra cho một mục thuốc.
    pub max_schedule_days: u32,
    /// Số chữ số thập phân giữ lại cho giá trị trung bình hợp nhất.
    pub unified_precision: u32,
}

impl Default for LifeChartConfig {
    fn default() -> Self {
        Self {
            share_ttl_minutes: 30,
            min_medication_days: 1,
            max_schedule_days: 3650,
            unified_precision: 2,
        }
    }
}

/// Lỗi chung của engine life chart.
#[derive(Debug, thiserror::Error)]
pub enum LifeChartError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu")]
    MissingData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Không tìm thấy lượt khám {0}")]
    VisitNotFound(VisitId),
    #[error("Thang điểm không được hỗ trợ: {0}")]
    UnknownScale(String),
}
