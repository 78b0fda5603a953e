//! Lấy độ lớn số từ liều thuốc dạng văn bản, chỉ dùng để vẽ biểu đồ.

use std::sync::LazyLock;

use regex::Regex;

static NUMERAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?[0-9]*\.[0-9]+|[0-9]+").unwrap());

/// Số đầu tiên tìm thấy trong chuỗi liều, hoặc `0.0`.
pub fn normalize_dose(dose: &str) -> f64 {
    NUMERAL_PATTERN
        .find(dose)
        .and_then(|numeral| numeral.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}
