/// Append `appended` to `existing`, inserting a single `\n` between them when
/// `existing` is non-empty and not already terminated.
pub fn merge(existing: &str, appended: &str) -> String {
    if existing.is_empty() {
        return appended.to_owned();
    }
    let mut merged = String::with_capacity(existing.len() + appended.len() + 1);
    merged.push_str(existing);
    if !existing.ends_with('\n') {
        merged.push('\n');
    }
    merged.push_str(appended);
    merged
}
