//! Diễn giải mã tần suất dùng thuốc theo vị trí ("1-0-1" -> "One in Morning & One in Night").

fn time_slots(count: usize) -> Option<&'static [&'static str]> {
    match count {
        2 => Some(&["Morning", "Night"]),
        3 => Some(&["Morning", "Afternoon", "Night"]),
        4 => Some(&["Morning", "Afternoon", "Evening", "Night"]),
        5 => Some(&["Dawn", "Morning", "Afternoon", "Evening", "Night"]),
        _ => None,
    }
}

fn quantity_word(value: &str) -> &str {
    match value {
        "1" => "One",
        "2" => "Two",
        "3" => "Three",
        "4" => "Four",
        "5" => "Five",
        "0.5" | "1/2" | "½" => "Half",
        "0.25" | "1/4" | "¼" => "Quarter",
        other => other,
    }
}

/// Chuyển mã tần suất thành câu mô tả.
///
/// Mã không có dấu `-` (và không phải toàn chữ số) hoặc có số vị trí không hỗ trợ
/// được trả về nguyên dạng.
pub fn describe_frequency(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return String::new();
    }
    if !code.contains('-') && !code.chars().all(|c| c.is_ascii_digit()) {
        return code.to_string();
    }

    let parts: Vec<&str> = code.split('-').map(str::trim).collect();
    let Some(slots) = time_slots(parts.len()) else {
        return code.to_string();
    };

    let phrases: Vec<String> = parts
        .iter()
        .zip(slots)
        .filter(|(value, _)| !value.is_empty() && **value != "0")
        .map(|(value, slot)| format!("{} in {slot}", quantity_word(value)))
        .collect();

    match phrases.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} & {last}", rest.join(", ")),
    }
}
