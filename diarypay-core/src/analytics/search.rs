//! Case-insensitive text filter over diary entries.

use crate::types::DiaryRecord;

/// Diaries whose title or body contains `query`, ignoring case.
///
/// Only an empty query matches everything; whitespace in the query is part of
/// the text searched for. Input order is preserved.
pub fn filter_text(diaries: &[DiaryRecord], query: &str) -> Vec<DiaryRecord> {
    if query.is_empty() {
        return diaries.to_vec();
    }
    let needle = query.to_lowercase();

    diaries
        .iter()
        .filter(|d| matches(d, &needle))
        .cloned()
        .collect()
}

fn matches(diary: &DiaryRecord, needle: &str) -> bool {
    diary.title.to_lowercase().contains(needle)
        || diary
            .body
            .as_deref()
            .is_some_and(|body| body.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordId;
    use chrono::Utc;

    fn diary(title: &str, body: Option<&str>) -> DiaryRecord {
        DiaryRecord {
            id: RecordId::new(),
            date: Utc::now(),
            title: title.to_string(),
            body: body.map(str::to_string),
            rating: 3,
            tags: None,
            place_name: None,
            attachment: None,
        }
    }

    #[test]
    fn test_empty_query_returns_all() {
        let diaries = vec![diary("a", None), diary("b", Some("text"))];
        assert_eq!(filter_text(&diaries, ""), diaries);
    }

    #[test]
    fn test_whitespace_is_part_of_the_query() {
        let diaries = vec![diary("Sunday", None), diary("day off", None)];

        let titles: Vec<String> = filter_text(&diaries, "day ").into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["day off"]);

        let titles: Vec<String> = filter_text(&diaries, " ").into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["day off"]);
    }

    #[test]
    fn test_matches_title_ignoring_case() {
        let diaries = vec![diary("Beach Day", None), diary("Office", None)];
        let found = filter_text(&diaries, "beach");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Beach Day");
    }

    #[test]
    fn test_matches_body() {
        let diaries = vec![
            diary("Monday", Some("Went to the MARKET")),
            diary("Tuesday", None),
        ];
        let found = filter_text(&diaries, "market");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Monday");
    }

    #[test]
    fn test_no_match() {
        let diaries = vec![diary("Monday", Some("quiet"))];
        assert!(filter_text(&diaries, "loud").is_empty());
    }

    #[test]
    fn test_preserves_order() {
        let diaries = vec![diary("tea one", None), diary("coffee", None), diary("tea two", None)];
        let titles: Vec<String> = filter_text(&diaries, "TEA").into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["tea one", "tea two"]);
    }
}
