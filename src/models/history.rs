use serde::{Deserialize, Serialize};

/// Snapshot of an item that was successfully subscribed.
///
/// Field names match the persisted JSON layout, which keeps existing history
/// files readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub wish_count: u64,
    /// `YYYY-MM-DD` as returned by the air-date resolver
    #[serde(default)]
    pub air_date: String,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub link: String,
    #[serde(rename = "tmdbid", default)]
    pub tmdb_id: Option<u64>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    /// Processed-at, `YYYY-MM-DD HH:MM:SS` in the configured time zone
    #[serde(default)]
    pub time: String,
    /// Dedup key, see [`crate::models::CandidateItem::unique_key`]
    pub unique: String,
}

/// Newest first, the order the history view presents records in.
pub fn sort_newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| b.time.cmp(&a.time));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(unique: &str, time: &str) -> HistoryRecord {
        HistoryRecord {
            title: unique.to_string(),
            year: String::new(),
            wish_count: 0,
            air_date: String::new(),
            regions: vec![],
            genres: vec![],
            link: String::new(),
            tmdb_id: None,
            poster: None,
            overview: None,
            time: time.to_string(),
            unique: unique.to_string(),
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut records = vec![
            record("a", "2024-01-01 10:00:00"),
            record("b", "2024-03-01 10:00:00"),
            record("c", "2024-02-01 10:00:00"),
        ];
        sort_newest_first(&mut records);
        let order: Vec<_> = records.iter().map(|r| r.unique.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_deserializes_minimal_legacy_record() {
        let json = r#"{"title":"Show","unique":"doubantvcoming:Show","tmdbid":42}"#;
        let parsed: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.tmdb_id, Some(42));
        assert_eq!(parsed.wish_count, 0);
        assert!(parsed.regions.is_empty());
    }
}
