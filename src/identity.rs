//! Stable anonymized identifiers derived from skill request data.

use base64::prelude::*;
use std::io::Cursor;
use uuid::Uuid;

/// Identifiers derived from a user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorIds {
    /// md5 of the user id forced into UUIDv4 shape
    pub uid: String,
    /// sent as both `_id` and `cid`
    pub visitor_id: String,
}

/// Derives the visitor identifiers for `user_id`, or `None` when it is empty.
///
/// The md5 digest gets the UUID version nibble (byte 6) and variant bits
/// (byte 8) overwritten, so downstream consumers see a well-formed v4 UUID.
pub fn visitor_ids(user_id: &str) -> Option<VisitorIds> {
    if user_id.is_empty() {
        return None;
    }

    let mut bytes = md5::compute(user_id.as_bytes()).0;
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let uid = Uuid::from_bytes(bytes).hyphenated().to_string();
    let visitor_id = hex::encode([&bytes[0..2], &bytes[10..16]].concat());

    Some(VisitorIds { uid, visitor_id })
}

/// Derives the pageview id for `request_id`, or `None` when it is empty.
///
/// murmur3 (32 bit, seed 0) little-endian bytes, base64url without padding,
/// with `-` and `_` swapped for `x` and `y`. Always six characters.
pub fn pageview_id(request_id: &str) -> Option<String> {
    if request_id.is_empty() {
        return None;
    }

    // reading from an in-memory cursor cannot fail
    let hash = murmur3::murmur3_32(&mut Cursor::new(request_id.as_bytes()), 0).ok()?;
    let encoded = BASE64_URL_SAFE_NO_PAD.encode(hash.to_le_bytes());

    Some(encoded.replace('-', "x").replace('_', "y"))
}
