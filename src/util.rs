//! Small utility helpers used across modules.

/// Human-readable title for a rubric category key: "thesis" -> "Thesis",
/// "partA" -> "Part A".
pub fn title_case_category(name: &str) -> String {
  let mut out = String::new();
  for (i, ch) in name.chars().enumerate() {
    if i == 0 {
      out.extend(ch.to_uppercase());
    } else if ch.is_uppercase() {
      out.push(' ');
      out.push(ch);
    } else {
      out.push(ch);
    }
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let cut = s
    .char_indices()
    .take_while(|(i, _)| *i <= max)
    .last()
    .map(|(i, _)| i)
    .unwrap_or(0);
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
