use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A single tracking record as queued by the skill backend.
///
/// Every field is optional on the wire, and a `null` or mistyped field only
/// resets that field to its default. Slots are kept in a `BTreeMap` so that
/// they are always visited in lexicographic order by slot name.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingEvent {
    #[serde(deserialize_with = "lenient")]
    pub timestamp: String,
    #[serde(deserialize_with = "lenient")]
    pub client: String,
    #[serde(deserialize_with = "lenient")]
    pub request_type: String,
    #[serde(deserialize_with = "lenient")]
    pub request_id: String,
    #[serde(deserialize_with = "lenient")]
    pub session_id: String,
    #[serde(deserialize_with = "lenient")]
    pub user_id: String,
    #[serde(deserialize_with = "lenient")]
    pub locale: String,
    #[serde(deserialize_with = "lenient")]
    pub intent_name: String,
    #[serde(deserialize_with = "lenient_duration")]
    pub duration: i64,
    #[serde(deserialize_with = "lenient")]
    pub title: String,
    #[serde(deserialize_with = "lenient_slots")]
    pub slots: BTreeMap<String, String>,
    #[serde(deserialize_with = "lenient")]
    pub location: Option<UserLocation>,
    #[serde(deserialize_with = "lenient")]
    pub details: Option<EventDetails>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserLocation {
    #[serde(deserialize_with = "lenient")]
    pub zip_code: String,
    #[serde(deserialize_with = "lenient")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient")]
    pub longitude: f64,
    #[serde(alias = "tzid", deserialize_with = "lenient")]
    pub timezone_id: String,
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub state: String,
    #[serde(alias = "cc", deserialize_with = "lenient")]
    pub country_code: String,
    #[serde(deserialize_with = "lenient")]
    pub city_name: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct EventDetails {
    #[serde(deserialize_with = "lenient")]
    pub category: String,
    #[serde(deserialize_with = "lenient")]
    pub action: String,
    #[serde(deserialize_with = "lenient")]
    pub name: String,
    #[serde(deserialize_with = "lenient")]
    pub label: String,
}

// null or a value of the wrong type falls back to the default for that field only
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    match T::deserialize(value) {
        Ok(v) => Ok(v),
        Err(e) => {
            debug!(error = %e, "ignoring mistyped tracking event field");
            Ok(T::default())
        }
    }
}

// whole milliseconds; fractional values are truncated
fn lenient_duration<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let duration = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        _ => 0,
    };
    Ok(duration)
}

// slot values are strings; numbers and booleans keep their JSON text, anything else is empty
fn lenient_slots<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    let slots = map
        .into_iter()
        .map(|(slot, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => String::new(),
            };
            (slot, value)
        })
        .collect();
    Ok(slots)
}

impl TrackingEvent {
    /// Decodes a queue record body. Malformed JSON never fails the record, it
    /// yields an empty event instead.
    pub fn from_body(body: &str) -> TrackingEvent {
        match serde_json::from_str::<TrackingEvent>(body) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "failed to decode tracking event, using empty event");
                TrackingEvent::default()
            }
        }
    }

    /// `intentName`, falling back to `requestType`. Used for page paths.
    pub fn itent_name(&self) -> &str {
        if !self.intent_name.is_empty() {
            return &self.intent_name;
        }
        &self.request_type
    }

    /// `title`, falling back to [`TrackingEvent::itent_name`].
    pub fn action_name(&self) -> &str {
        if !self.title.is_empty() {
            return &self.title;
        }
        self.itent_name()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode_full_event() {
        let body = r#"{
            "timestamp": "2024-03-01T12:00:00Z",
            "client": "Mozilla/5.0 (Echo)",
            "requestType": "IntentRequest",
            "requestId": "amzn1.echo-api.request.0000",
            "sessionId": "amzn1.echo-api.session.0000",
            "userId": "abc123",
            "locale": "en-US",
            "intentName": "Holidays",
            "duration": 42,
            "title": "Holiday lookup",
            "slots": {"Holiday": "Rosh Hashana", "Year": "2025"},
            "location": {
                "zipCode": "78701",
                "latitude": 30.2672,
                "longitude": -97.7431,
                "timezoneId": "America/Chicago",
                "countryCode": "US",
                "cityName": "Austin, TX"
            },
            "details": {"category": "Skill", "action": "Launch", "name": "holiday", "label": "x"},
            "somethingNew": true
        }"#;

        let evt = TrackingEvent::from_body(body);
        assert_eq!(evt.request_type, "IntentRequest");
        assert_eq!(evt.duration, 42);
        assert_eq!(
            evt.slots.keys().collect::<Vec<_>>(),
            vec!["Holiday", "Year"]
        );
        let loc = evt.location.unwrap();
        assert_eq!(loc.country_code, "US");
        assert_eq!(loc.city_name, "Austin, TX");
        assert_eq!(loc.timezone_id, "America/Chicago");
        assert_eq!(loc.latitude, 30.2672);
        assert_eq!(evt.details.unwrap().label, "x");
    }

    #[test]
    fn test_decode_legacy_location_keys() {
        let evt = TrackingEvent::from_body(r#"{"location": {"cc": "IL", "tzid": "Asia/Jerusalem"}}"#);
        let loc = evt.location.unwrap();
        assert_eq!(loc.country_code, "IL");
        assert_eq!(loc.timezone_id, "Asia/Jerusalem");
    }

    #[test]
    fn test_null_field_only_resets_that_field() {
        let evt = TrackingEvent::from_body(
            r#"{"userId":"abc123","requestType":"LaunchRequest","title":null}"#,
        );
        assert_eq!(evt.user_id, "abc123");
        assert_eq!(evt.request_type, "LaunchRequest");
        assert_eq!(evt.title, "");
    }

    #[test]
    fn test_null_slot_value_is_empty() {
        let evt = TrackingEvent::from_body(
            r#"{"userId":"abc123","requestType":"LaunchRequest","slots":{"Holiday":null,"Year":2025,"Day":"1"}}"#,
        );
        assert_eq!(evt.user_id, "abc123");
        assert_eq!(evt.slots["Holiday"], "");
        assert_eq!(evt.slots["Year"], "2025");
        assert_eq!(evt.slots["Day"], "1");
    }

    #[test]
    fn test_fractional_duration_is_truncated() {
        let evt = TrackingEvent::from_body(
            r#"{"userId":"abc123","requestType":"LaunchRequest","duration":12.5}"#,
        );
        assert_eq!(evt.user_id, "abc123");
        assert_eq!(evt.duration, 12);

        let evt = TrackingEvent::from_body(r#"{"userId":"abc123","duration":"soon"}"#);
        assert_eq!(evt.user_id, "abc123");
        assert_eq!(evt.duration, 0);
    }

    #[test]
    fn test_mistyped_fields_keep_the_rest() {
        let evt = TrackingEvent::from_body(
            r#"{
                "userId": 42,
                "requestId": "req-1",
                "slots": ["not", "a", "map"],
                "location": {"countryCode": "US", "cityName": null, "latitude": "north"},
                "details": "Skill"
            }"#,
        );
        assert_eq!(evt.user_id, "");
        assert_eq!(evt.request_id, "req-1");
        assert!(evt.slots.is_empty());
        let loc = evt.location.unwrap();
        assert_eq!(loc.country_code, "US");
        assert_eq!(loc.city_name, "");
        assert_eq!(loc.latitude, 0.0);
        assert_eq!(evt.details, None);
    }

    #[test]
    fn test_malformed_body_yields_empty_event() {
        assert_eq!(TrackingEvent::from_body("{not json"), TrackingEvent::default());
        assert_eq!(TrackingEvent::from_body(""), TrackingEvent::default());
    }

    #[test]
    fn test_action_name_priority() {
        let mut evt = TrackingEvent::default();
        assert_eq!(evt.action_name(), "");

        evt.request_type = "LaunchRequest".to_string();
        assert_eq!(evt.action_name(), "LaunchRequest");
        assert_eq!(evt.itent_name(), "LaunchRequest");

        evt.intent_name = "Candles".to_string();
        assert_eq!(evt.action_name(), "Candles");
        assert_eq!(evt.itent_name(), "Candles");

        evt.title = "Candle lighting times".to_string();
        assert_eq!(evt.action_name(), "Candle lighting times");
        assert_eq!(evt.itent_name(), "Candles");
    }
}
