//! Tracking API parameter model and query serialization

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known Matomo Tracking API parameter names.
pub mod names {
    /// Site id, injected on every hit
    pub const IDSITE: &str = "idsite";
    /// Recording flag, always `1` for tracking hits
    pub const REC: &str = "rec";
    /// Full URL of the tracked action
    pub const URL: &str = "url";
    /// Title of the tracked action
    pub const ACTION_NAME: &str = "action_name";
    /// Referrer URL
    pub const URLREF: &str = "urlref";
    /// 16 hex character visitor id
    pub const VISITOR_ID: &str = "_id";
    /// Application-level user id
    pub const USER_ID: &str = "uid";
    /// Forced visitor id
    pub const CUSTOM_VISITOR_ID: &str = "cid";
    /// User agent override
    pub const USER_AGENT: &str = "ua";
    /// Accept-Language override
    pub const LANGUAGE: &str = "lang";
    /// Event category
    pub const EVENT_CATEGORY: &str = "e_c";
    /// Event action
    pub const EVENT_ACTION: &str = "e_a";
    /// Event name
    pub const EVENT_NAME: &str = "e_n";
    /// Event numeric value
    pub const EVENT_VALUE: &str = "e_v";
    /// Site search keyword
    pub const SEARCH: &str = "search";
    /// Site search category
    pub const SEARCH_CATEGORY: &str = "search_cat";
    /// Site search result count
    pub const SEARCH_COUNT: &str = "search_count";
    /// Goal id to convert
    pub const GOAL_ID: &str = "idgoal";
    /// Goal or ecommerce revenue
    pub const REVENUE: &str = "revenue";
    /// Cache buster
    pub const RAND: &str = "rand";
    /// API version, always `1`
    pub const API_VERSION: &str = "apiv";
    /// `0` asks the tracker for an empty 204 response instead of a GIF
    pub const SEND_IMAGE: &str = "send_image";
}

/// Scalar value of a tracking parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    /// Integer above `i64::MAX`
    Unsigned(u64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Returns whether the value counts as present.
    ///
    /// Empty text, zero, NaN and `false` are not truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ParamValue::Bool(value) => *value,
            ParamValue::Integer(value) => *value != 0,
            ParamValue::Unsigned(value) => *value != 0,
            ParamValue::Float(value) => *value != 0.0 && !value.is_nan(),
            ParamValue::Text(value) => !value.is_empty(),
        }
    }
}

/// Formats the value the way it appears in the query before encoding.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Integer(value) => write!(f, "{value}"),
            ParamValue::Unsigned(value) => write!(f, "{value}"),
            ParamValue::Float(value) if value.is_infinite() => {
                f.write_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
            }
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(ParamValue::Unsigned(value), ParamValue::Integer)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

/// Parameters of a single tracking hit.
///
/// Keys are unique and the last write wins. Iteration is ordered by key,
/// which keeps serialized queries stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingParams(BTreeMap<String, ParamValue>);

impl TrackingParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, returning the value it replaced.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Serializes the parameters as an `application/x-www-form-urlencoded` query.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter().map(|(key, value)| (key, value.to_string())))
            .finish()
    }

    /// Sets the URL of the tracked action.
    pub fn url(self, url: impl Into<String>) -> Self {
        self.with(names::URL, url.into())
    }

    /// Sets the title of the tracked action.
    pub fn action_name(self, name: impl Into<String>) -> Self {
        self.with(names::ACTION_NAME, name.into())
    }

    /// Sets the referrer URL.
    pub fn referrer(self, url: impl Into<String>) -> Self {
        self.with(names::URLREF, url.into())
    }

    pub fn visitor_id(self, id: impl Into<String>) -> Self {
        self.with(names::VISITOR_ID, id.into())
    }

    pub fn user_id(self, id: impl Into<String>) -> Self {
        self.with(names::USER_ID, id.into())
    }

    pub fn user_agent(self, user_agent: impl Into<String>) -> Self {
        self.with(names::USER_AGENT, user_agent.into())
    }

    pub fn language(self, language: impl Into<String>) -> Self {
        self.with(names::LANGUAGE, language.into())
    }

    /// Marks the hit as an event with category and action.
    pub fn event(self, category: impl Into<String>, action: impl Into<String>) -> Self {
        self.with(names::EVENT_CATEGORY, category.into())
            .with(names::EVENT_ACTION, action.into())
    }

    pub fn event_name(self, name: impl Into<String>) -> Self {
        self.with(names::EVENT_NAME, name.into())
    }

    pub fn event_value(self, value: f64) -> Self {
        self.with(names::EVENT_VALUE, value)
    }

    /// Marks the hit as a site search.
    pub fn site_search(
        self,
        keyword: impl Into<String>,
        category: Option<String>,
        result_count: Option<u64>,
    ) -> Self {
        let mut params = self.with(names::SEARCH, keyword.into());
        if let Some(category) = category {
            params.insert(names::SEARCH_CATEGORY, category);
        }
        if let Some(count) = result_count {
            params.insert(names::SEARCH_COUNT, count);
        }
        params
    }

    /// Converts a goal, optionally with revenue.
    pub fn goal(self, goal_id: u64, revenue: Option<f64>) -> Self {
        let mut params = self.with(names::GOAL_ID, goal_id);
        if let Some(revenue) = revenue {
            params.insert(names::REVENUE, revenue);
        }
        params
    }

    pub fn cache_buster(self, value: u64) -> Self {
        self.with(names::RAND, value)
    }

    pub fn api_version(self) -> Self {
        self.with(names::API_VERSION, 1)
    }

    /// Controls whether the tracker answers with a GIF (`true`) or 204.
    pub fn send_image(self, send: bool) -> Self {
        self.with(names::SEND_IMAGE, i32::from(send))
    }
}

#[cfg(test)]
mod params_tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(ParamValue::from(true).to_string(), "true");
        assert_eq!(ParamValue::from(7).to_string(), "7");
        assert_eq!(ParamValue::from(1.0).to_string(), "1");
        assert_eq!(ParamValue::from(2.5).to_string(), "2.5");
        assert_eq!(ParamValue::from(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(ParamValue::from("Home").to_string(), "Home");
    }

    #[test]
    fn test_value_truthiness() {
        assert!(ParamValue::from("x").is_truthy());
        assert!(ParamValue::from(1).is_truthy());
        assert!(ParamValue::from(true).is_truthy());
        assert!(!ParamValue::from("").is_truthy());
        assert!(!ParamValue::from(0).is_truthy());
        assert!(!ParamValue::from(0.0).is_truthy());
        assert!(!ParamValue::from(f64::NAN).is_truthy());
        assert!(!ParamValue::from(false).is_truthy());
    }

    #[test]
    fn test_u64_beyond_i64_is_exact() {
        assert_eq!(ParamValue::from(5u64), ParamValue::Integer(5));
        assert_eq!(ParamValue::from(u64::MAX), ParamValue::Unsigned(u64::MAX));
        assert_eq!(ParamValue::from(u64::MAX).to_string(), "18446744073709551615");

        let params = TrackingParams::new().cache_buster(9_223_372_036_854_775_809);
        assert_eq!(params.to_query_string(), "rand=9223372036854775809");
    }

    #[test]
    fn test_last_write_wins() {
        let mut params = TrackingParams::new().action_name("First");
        let previous = params.insert(names::ACTION_NAME, "Second");
        assert_eq!(previous, Some(ParamValue::from("First")));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get(names::ACTION_NAME), Some(&ParamValue::from("Second")));
    }

    #[test]
    fn test_query_string_encoding() {
        let params = TrackingParams::new()
            .url("http://example.com/page?a=1&b=2")
            .action_name("Home / Landing");

        assert_eq!(
            params.to_query_string(),
            "action_name=Home+%2F+Landing&url=http%3A%2F%2Fexample.com%2Fpage%3Fa%3D1%26b%3D2"
        );
    }

    #[test]
    fn test_event_helpers() {
        let params = TrackingParams::new()
            .url("http://example.com/video")
            .event("Video", "Play")
            .event_name("Intro")
            .event_value(12.5);

        assert_eq!(params.get(names::EVENT_CATEGORY), Some(&ParamValue::from("Video")));
        assert_eq!(params.get(names::EVENT_ACTION), Some(&ParamValue::from("Play")));
        assert_eq!(params.get(names::EVENT_NAME), Some(&ParamValue::from("Intro")));
        assert_eq!(params.get(names::EVENT_VALUE), Some(&ParamValue::Float(12.5)));
    }

    #[test]
    fn test_search_and_goal_helpers() {
        let params = TrackingParams::new()
            .site_search("rust", Some("docs".to_string()), Some(3))
            .goal(4, None);

        assert_eq!(params.get(names::SEARCH_CATEGORY), Some(&ParamValue::from("docs")));
        assert_eq!(params.get(names::SEARCH_COUNT), Some(&ParamValue::Integer(3)));
        assert_eq!(params.get(names::GOAL_ID), Some(&ParamValue::Integer(4)));
        assert!(!params.contains_key(names::REVENUE));
        assert_eq!(
            TrackingParams::new().send_image(false).get(names::SEND_IMAGE),
            Some(&ParamValue::Integer(0))
        );
    }

    #[test]
    fn test_deserialize_flat_json_object() {
        let params: TrackingParams = serde_json::from_str(
            r#"{"url": "http://example.com", "e_v": 1.5, "rand": 42, "new_visit": true}"#,
        )
        .unwrap();

        assert_eq!(params.get("url"), Some(&ParamValue::from("http://example.com")));
        assert_eq!(params.get("e_v"), Some(&ParamValue::Float(1.5)));
        assert_eq!(params.get("rand"), Some(&ParamValue::Integer(42)));
        assert_eq!(params.get("new_visit"), Some(&ParamValue::Bool(true)));

        let params: TrackingParams =
            serde_json::from_str(r#"{"rand": 18446744073709551615}"#).unwrap();
        assert_eq!(params.get("rand"), Some(&ParamValue::Unsigned(u64::MAX)));
    }

    #[test]
    fn test_deserialize_rejects_nested_values() {
        let result = serde_json::from_str::<TrackingParams>(r#"{"url": {"nested": 1}}"#);
        assert!(result.is_err());
    }
}
