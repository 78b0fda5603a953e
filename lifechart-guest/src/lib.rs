//! Life chart cho khách (không đăng nhập): biểu mẫu -> dữ liệu chart,
//! kèm liên kết chia sẻ tạm thời.

pub mod form;
pub mod share;

use chrono::{NaiveDate, Utc};
use lifechart_core::{build_chart, ChartData, LifeChartConfig, VisitType};
use serde_json::Value;

pub use form::{ClinicalRow, FormError, FormFields, MedicationRow, MseRow, ScaleRow, VisitForm};
pub use share::{
    share_path, Clock, GuestShareEntry, GuestShareStore, ManualClock, ShareError, ShareState,
    SystemClock,
};

/// Id của lượt khám duy nhất dựng từ biểu mẫu của khách.
pub const GUEST_VISIT_ID: i64 = 0;

/// Chiếu biểu mẫu của khách từ chuỗi JSON.
pub fn project_guest_submission_str(
    form_json: &str,
    config: &LifeChartConfig,
) -> Result<ChartData, FormError> {
    let fields = FormFields::from_json_str(form_json)?;
    Ok(project_guest_submission(&fields, config, Utc::now().date_naive()))
}

/// Chiếu biểu mẫu của khách từ `serde_json::Value`.
pub fn project_guest_submission_value(
    form: &Value,
    config: &LifeChartConfig,
) -> Result<ChartData, FormError> {
    let fields = FormFields::from_json_value(form)?;
    Ok(project_guest_submission(&fields, config, Utc::now().date_naive()))
}

/// Chiếu một biểu mẫu thành dữ liệu chart, không ghi vào kho hồ sơ.
///
/// Biểu mẫu trở thành một lượt khám `First` mang ngày `visit_date`, hoặc `today`
/// khi trường này vắng mặt hay sai định dạng.
pub fn project_guest_submission(
    fields: &FormFields,
    config: &LifeChartConfig,
    today: NaiveDate,
) -> ChartData {
    let form = VisitForm::from_fields(fields);
    let visit = form.into_visit(GUEST_VISIT_ID, GUEST_VISIT_ID, VisitType::First, today);
    tracing::debug!(date = %visit.date, "projecting guest submission");
    build_chart(std::slice::from_ref(&visit), config)
}
