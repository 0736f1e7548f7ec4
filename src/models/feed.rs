use serde::{Deserialize, Serialize};

/// One `<item>` of the upcoming-shows feed, as published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub title: String,
    pub link: String,
    /// Free text carrying the wish count, e.g. `想看人数：6,000`
    pub description: String,
    /// `/`-delimited text: `<year> / <regions> / <genres>`
    pub category: String,
}

impl CandidateItem {
    /// Items with neither a title nor a link cannot be keyed and are dropped.
    pub fn is_identifiable(&self) -> bool {
        !self.title.is_empty() || !self.link.is_empty()
    }

    /// Deterministic dedup marker: `<namespace>:<link or title>`.
    pub fn unique_key(&self, namespace: &str) -> String {
        let identity = if self.link.is_empty() {
            &self.title
        } else {
            &self.link
        };
        format!("{namespace}:{identity}")
    }
}

/// Attributes derived from an item's free-text fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub popularity: u64,
    pub year: Option<String>,
    pub regions: Vec<String>,
    pub genres: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_key_prefers_link() {
        let item = CandidateItem {
            title: "Show A".to_string(),
            link: "https://x/subject/123/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            item.unique_key("doubantvcoming"),
            "doubantvcoming:https://x/subject/123/"
        );
    }

    #[test]
    fn test_unique_key_falls_back_to_title() {
        let item = CandidateItem {
            title: "Show A".to_string(),
            ..Default::default()
        };
        assert_eq!(item.unique_key("ns"), "ns:Show A");
        assert!(item.is_identifiable());
        assert!(!CandidateItem::default().is_identifiable());
    }
}
