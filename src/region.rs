use fancy_regex::Regex;
use once_cell::sync::Lazy;

use crate::config::TrackingMode;
use crate::events::UserLocation;

// "Austin, TX" style city names
static CITY_STATE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r", ([A-Z]{2})$").expect("city/state suffix pattern to compile")
});

/// Geo fields ready to be sent to the collector. Empty strings are omitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geo {
    pub country: String,
    pub region: String,
    pub city: String,
    pub lat: String,
    pub long: String,
}

/// Splits `"<City>, XX"` into `("<City>", "XX")`.
pub fn split_city_state(city_name: &str) -> Option<(&str, &str)> {
    let captures = CITY_STATE_SUFFIX.captures(city_name).ok()??;
    let suffix = captures.get(0)?;
    let state = captures.get(1)?;
    Some((&city_name[..suffix.start()], state.as_str()))
}

pub fn normalize(location: &UserLocation, mode: TrackingMode) -> Geo {
    let mut region = location.state.clone();
    let mut city_name = location.city_name.as_str();

    if region.is_empty()
        && mode == TrackingMode::Full
        && location.country_code == "US"
    {
        if let Some((city, state)) = split_city_state(city_name) {
            region = state.to_string();
            city_name = city;
        }
    }

    let city = if location.name.is_empty() {
        city_name.to_string()
    } else {
        location.name.clone()
    };

    Geo {
        country: location.country_code.to_lowercase(),
        region,
        city,
        lat: format!("{:.6}", location.latitude),
        long: format!("{:.6}", location.longitude),
    }
}
