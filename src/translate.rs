use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

use crate::config::{Config, TrackingMode};
use crate::events::TrackingEvent;
use crate::identity;
use crate::region;

/// Characters left alone by query-string escaping.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Query parameters for one tracking request, ordered by key.
pub type TrackingParams = BTreeMap<&'static str, String>;

/// Escapes `value` the way a query string value is escaped (space becomes `+`).
pub fn query_escape(value: &str) -> String {
    utf8_percent_encode(value, QUERY_ESCAPE)
        .to_string()
        .replace("%20", "+")
}

/// Synthetic page url: `http://<host>/<intent>/<slot>/<value>/...`, slots in name order.
pub fn page_url(event: &TrackingEvent, page_host: &str) -> String {
    let mut path = format!("http://{}/{}", page_host, event.itent_name());
    for (slot, value) in &event.slots {
        path.push('/');
        path.push_str(slot);
        path.push('/');
        path.push_str(&query_escape(value));
    }
    path
}

/// Builds the collector query parameters for `event`.
///
/// Pure function of the event and the configuration: the same input always
/// produces the same map.
pub fn tracking_params(event: &TrackingEvent, config: &Config) -> TrackingParams {
    let mut params = TrackingParams::new();
    params.insert("rec", "1".to_string());
    params.insert("apiv", "1".to_string());
    params.insert("idsite", config.site_id.to_string());
    // ask for a 204 instead of a tracking gif
    params.insert("send_image", "0".to_string());
    params.insert("lang", event.locale.clone());

    if event.duration != 0 {
        params.insert("pf_srv", event.duration.to_string());
    }

    params.insert("action_name", event.action_name().to_string());
    params.insert("url", page_url(event, &config.page_host));

    if let Some(ids) = identity::visitor_ids(&event.user_id) {
        params.insert("uid", ids.uid);
        params.insert("_id", ids.visitor_id.clone());
        params.insert("cid", ids.visitor_id);
    }

    if config.mode == TrackingMode::Full {
        if let Some(pv_id) = identity::pageview_id(&event.request_id) {
            params.insert("pv_id", pv_id);
        }
    }

    if let Some(details) = &event.details {
        insert_non_empty(&mut params, "e_c", &details.category);
        insert_non_empty(&mut params, "e_a", &details.action);
        insert_non_empty(&mut params, "e_n", &details.name);
    }

    if let (Some(token), Some(location)) = (&config.matomo_token, &event.location) {
        params.insert("token_auth", token.clone());
        let geo = region::normalize(location, config.mode);
        insert_non_empty(&mut params, "country", &geo.country);
        insert_non_empty(&mut params, "region", &geo.region);
        insert_non_empty(&mut params, "city", &geo.city);
        params.insert("lat", geo.lat);
        params.insert("long", geo.long);
    }

    params
}

fn insert_non_empty(params: &mut TrackingParams, key: &'static str, value: &str) {
    if !value.is_empty() {
        params.insert(key, value.to_string());
    }
}
