/// Base URL for a controller given as a bare host, `host:port`, or full URL.
/// Bare hosts are reached over HTTPS on port 443.
pub fn controller_base_url(controller: &str) -> String {
    let controller = controller.trim().trim_end_matches('/');
    if controller.contains("://") {
        return controller.to_string();
    }
    if controller.contains(':') {
        format!("https://{controller}")
    } else {
        format!("https://{controller}:443")
    }
}

/// Lowercase, colon-separated form of a MAC address written with `:`, `-`,
/// `.` or no separators.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ':' | '-' | '.'))
        .collect();
    if digits.len() != 12 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    let digits = digits.to_ascii_lowercase();
    let pairs: Vec<&str> = (0..12).step_by(2).map(|i| &digits[i..i + 2]).collect();
    Some(pairs.join(":"))
}
