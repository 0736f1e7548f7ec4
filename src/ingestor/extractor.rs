//! Attribute extraction from the feed's free-text fields
//!
//! Every attribute is parsed independently: a malformed wish count does not
//! affect the year, regions or genres of the same item, and nothing here can
//! fail. Unparseable values degrade to their defaults.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::ItemAttributes;

fn wish_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"想看人数[：:]\s*([0-9,]+)").expect("wish count regex is valid"))
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("year regex is valid"))
}

fn tag_separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s、,，]+").expect("tag separator regex is valid"))
}

fn season_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s*(?:第\s*([0-9]+|[一二三四五六七八九十]+)\s*季|\bseason\s*([0-9]+)|\bS([0-9]{1,2})\b)\s*$")
            .expect("season regex is valid")
    })
}

/// Extract popularity, year, regions and genres from one feed item.
pub fn extract(description: &str, category: &str) -> ItemAttributes {
    let (regions, genres) = parse_regions_and_genres(category);
    ItemAttributes {
        popularity: parse_wish_count(description),
        year: parse_year(category),
        regions,
        genres,
    }
}

/// `想看人数：6,000` -> 6000; absent or unparseable -> 0
pub fn parse_wish_count(description: &str) -> u64 {
    wish_count_regex()
        .captures(description)
        .and_then(|caps| caps[1].replace(',', "").parse::<u64>().ok())
        .unwrap_or(0)
}

/// First bare `19xx`/`20xx` token in the category text.
pub fn parse_year(category: &str) -> Option<String> {
    year_regex()
        .find(category)
        .map(|m| m.as_str().to_string())
}

/// Segment 1 of the `/`-split category is the region list, segment 2 the
/// genre list. Blank segments are skipped before indexing.
pub fn parse_regions_and_genres(category: &str) -> (Vec<String>, Vec<String>) {
    let parts: Vec<&str> = category
        .split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    let regions = parts.get(1).map(|text| split_tags(text)).unwrap_or_default();
    let genres = parts.get(2).map(|text| split_tags(text)).unwrap_or_default();
    (regions, genres)
}

fn split_tags(text: &str) -> Vec<String> {
    tag_separator_regex()
        .split(text)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a trailing season marker off a title.
///
/// `繁花 第二季` -> (`繁花`, Some(2)); `Show Season 3` -> (`Show`, Some(3)).
/// Titles without a marker come back unchanged with `None`.
pub fn split_season(title: &str) -> (String, Option<u32>) {
    let title = title.trim();
    let Some(caps) = season_regex().captures(title) else {
        return (title.to_string(), None);
    };

    let season = caps
        .get(1)
        .and_then(|m| parse_season_number(m.as_str()))
        .or_else(|| caps.get(2).and_then(|m| m.as_str().parse().ok()))
        .or_else(|| caps.get(3).and_then(|m| m.as_str().parse().ok()));

    match (season, caps.get(0)) {
        (Some(season), Some(whole)) if whole.start() > 0 => {
            (title[..whole.start()].trim().to_string(), Some(season))
        }
        _ => (title.to_string(), None),
    }
}

fn parse_season_number(raw: &str) -> Option<u32> {
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    chinese_numeral(raw)
}

/// Chinese numerals up to 99 (一 .. 九十九).
fn chinese_numeral(raw: &str) -> Option<u32> {
    fn digit(c: char) -> Option<u32> {
        "一二三四五六七八九"
            .chars()
            .position(|d| d == c)
            .map(|p| p as u32 + 1)
    }

    let chars: Vec<char> = raw.chars().collect();
    match chars.as_slice() {
        [c] if *c == '十' => Some(10),
        [c] => digit(*c),
        ['十', ones] => digit(*ones).map(|o| 10 + o),
        [tens, '十'] => digit(*tens).map(|t| t * 10),
        [tens, '十', ones] => Some(digit(*tens)? * 10 + digit(*ones)?),
        _ => None,
    }
}
