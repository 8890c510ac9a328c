/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Split a comma-joined list as the backend stores it.
///
/// Entries are trimmed and empty entries dropped, so `"a, ,b,"` yields
/// `["a", "b"]`.
pub fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_skips_empty() {
        let parts: Vec<&str> = split_list(" Alpha, ,Beta,").collect();
        assert_eq!(parts, vec!["Alpha", "Beta"]);
        assert_eq!(split_list("").count(), 0);
    }
}
