use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Tv => write!(f, "tv"),
        }
    }
}

/// A media entity as identified by the recognition service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedMedia {
    pub tmdb_id: u64,
    pub title: String,
    pub year: Option<String>,
    pub media_type: MediaType,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

impl RecognizedMedia {
    /// `Title (Year)`, or just the title when the year is unknown.
    pub fn title_year(&self) -> String {
        match self.year.as_deref() {
            Some(year) if !year.is_empty() => format!("{} ({})", self.title, year),
            _ => self.title.clone(),
        }
    }

    /// Image for notifications: the backdrop if there is one, else the poster.
    pub fn message_image(&self) -> Option<String> {
        self.backdrop_url.clone().or_else(|| self.poster_url.clone())
    }
}

/// Outcome of a subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResult {
    pub id: Option<u64>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub text: String,
    pub image: Option<String>,
    pub link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_year() {
        let mut media = RecognizedMedia {
            tmdb_id: 1,
            title: "繁花".to_string(),
            year: Some("2023".to_string()),
            media_type: MediaType::Tv,
            overview: None,
            poster_url: Some("poster".to_string()),
            backdrop_url: None,
        };
        assert_eq!(media.title_year(), "繁花 (2023)");
        assert_eq!(media.message_image().as_deref(), Some("poster"));
        media.year = None;
        assert_eq!(media.title_year(), "繁花");
    }
}
