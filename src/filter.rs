//! Discovery filtering over an in-memory event list.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::models::Event;

/// Transient discovery parameters, one per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub query: String,
    pub location: String,
    pub tags: BTreeSet<String>,
    pub min_audience: u32,
}

/// Query-string shape of [`FilterState`]. `minAudience` arrives as text so a
/// malformed number can be mapped to 0 instead of rejecting the request.
/// Each selected tag is its own `tags` key.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub min_audience: String,
}

impl From<FilterParams> for FilterState {
    fn from(params: FilterParams) -> Self {
        FilterState {
            query: params.query,
            location: params.location,
            tags: params
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            min_audience: parse_min_audience(&params.min_audience),
        }
    }
}

/// Reads the leading integer of `raw`, ignoring whatever follows it, so
/// `"1500.5"` is 1500. Values past `u32::MAX` saturate. Input without leading
/// digits, or a negative number, is 0.
pub fn parse_min_audience(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    digits
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add(d))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl FilterState {
    pub fn matches(&self, event: &Event) -> bool {
        let matches_query = self.query.is_empty() || contains_ci(&event.title, &self.query);
        let matches_loc = self.location.is_empty() || contains_ci(&event.location, &self.location);
        let matches_tags = self.tags.iter().all(|t| event.tags.contains(t));
        let matches_audience = event.audience_size >= self.min_audience;
        matches_query && matches_loc && matches_tags && matches_audience
    }
}

/// Stable subsequence of `events` matching every predicate in `state`.
pub fn filter_events(events: &[Event], state: &FilterState) -> Vec<Event> {
    events.iter().filter(|e| state.matches(e)).cloned().collect()
}

/// Sorted tag vocabulary across `events`.
pub fn all_tags(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .flat_map(|e| e.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_events;

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    fn tags(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn identity_filter_returns_everything() {
        let events = sample_events();
        assert_eq!(filter_events(&events, &FilterState::default()), events);
    }

    #[test]
    fn empty_source_gives_empty_result() {
        let state = FilterState {
            query: "hack".into(),
            ..Default::default()
        };
        assert!(filter_events(&[], &state).is_empty());
    }

    #[test]
    fn min_audience_is_inclusive_and_keeps_order() {
        let events = sample_events();
        let state = FilterState {
            min_audience: 1000,
            ..Default::default()
        };
        let out = filter_events(&events, &state);
        assert_eq!(ids(&out), vec!["cultural-101", "sports-050"]);

        let state = FilterState {
            min_audience: 1200,
            ..Default::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["cultural-101", "sports-050"]);
    }

    #[test]
    fn tags_require_every_selected_tag() {
        let mut events = sample_events();
        events[1].tags = vec!["tech".into()];
        let state = FilterState {
            tags: tags(&["tech", "ai"]),
            ..Default::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["hack-001"]);
    }

    #[test]
    fn unknown_tag_matches_nothing() {
        let state = FilterState {
            tags: tags(&["underwater-basket-weaving"]),
            ..Default::default()
        };
        assert!(filter_events(&sample_events(), &state).is_empty());
    }

    #[test]
    fn query_and_location_are_case_insensitive_substrings() {
        let events = sample_events();
        let state = FilterState {
            query: "HACKATHON".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["hack-001"]);

        let state = FilterState {
            location: "tx".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["cultural-101"]);
    }

    #[test]
    fn predicates_are_conjunctive() {
        let state = FilterState {
            query: "meet".into(),
            location: "boston".into(),
            ..Default::default()
        };
        assert!(filter_events(&sample_events(), &state).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let events = sample_events();
        let state = FilterState {
            min_audience: 700,
            ..Default::default()
        };
        let once = filter_events(&events, &state);
        assert_eq!(filter_events(&once, &state), once);
    }

    #[test]
    fn bad_min_audience_falls_back_to_zero() {
        assert_eq!(parse_min_audience(""), 0);
        assert_eq!(parse_min_audience("abc"), 0);
        assert_eq!(parse_min_audience("-5"), 0);
        assert_eq!(parse_min_audience(" 250 "), 250);
    }

    #[test]
    fn min_audience_keeps_the_leading_integer() {
        assert_eq!(parse_min_audience("1500.5"), 1500);
        assert_eq!(parse_min_audience("+800 people"), 800);
        assert_eq!(parse_min_audience("99999999999999"), u32::MAX);

        let events = sample_events();
        let state = FilterState {
            min_audience: parse_min_audience("99999999999999"),
            ..Default::default()
        };
        assert!(filter_events(&events, &state).is_empty());

        let state = FilterState {
            min_audience: parse_min_audience("1500.5"),
            ..Default::default()
        };
        assert_eq!(ids(&filter_events(&events, &state)), vec!["sports-050"]);
    }

    #[test]
    fn params_collect_tags_and_parse_numbers() {
        let state = FilterState::from(FilterParams {
            query: "fest".into(),
            location: String::new(),
            tags: vec!["tech".into(), " ai ".into(), "".into(), "tech".into()],
            min_audience: "NaN".into(),
        });
        assert_eq!(state.tags, tags(&["ai", "tech"]));
        assert_eq!(state.min_audience, 0);
    }

    #[test]
    fn tags_with_commas_stay_whole() {
        let mut events = sample_events();
        events[0].tags.push("food, drink".into());
        let state = FilterState::from(FilterParams {
            tags: vec!["food, drink".into()],
            ..Default::default()
        });
        assert_eq!(ids(&filter_events(&events, &state)), vec!["hack-001"]);
    }

    #[test]
    fn tag_vocabulary_is_sorted_and_unique() {
        let mut events = sample_events();
        events[2].tags.push("tech".into());
        let vocab = all_tags(&events);
        assert_eq!(vocab.first().map(String::as_str), Some("ai"));
        assert_eq!(vocab.iter().filter(|t| *t == "tech").count(), 1);
    }
}
