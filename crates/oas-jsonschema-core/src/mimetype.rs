//! Media-type classification.
//!
//! Matching is substring-based so that `application/json; charset=utf-8` or a
//! multipart boundary suffix still classify correctly. Only the wildcard check
//! is an exact comparison.

const JSON_MARKERS: &[&str] = &[
    "application/json",
    "application/x-json",
    "text/json",
    "text/x-json",
    "+json",
];

const XML_MARKERS: &[&str] = &[
    "application/xml",
    "application/xml-external-parsed-entity",
    "application/xml-dtd",
    "text/xml",
    "text/xml-external-parsed-entity",
    "+xml",
];

const FORM_URL_ENCODED_MARKERS: &[&str] = &["application/x-www-form-urlencoded"];

const MULTIPART_MARKERS: &[&str] = &[
    "multipart/mixed",
    "multipart/related",
    "multipart/form-data",
    "multipart/alternative",
];

fn matches_any(markers: &[&str], media_type: &str) -> bool {
    markers.iter().any(|marker| media_type.contains(marker))
}

pub fn is_json(media_type: &str) -> bool {
    matches_any(JSON_MARKERS, media_type)
}

pub fn is_xml(media_type: &str) -> bool {
    matches_any(XML_MARKERS, media_type)
}

pub fn is_form_url_encoded(media_type: &str) -> bool {
    matches_any(FORM_URL_ENCODED_MARKERS, media_type)
}

pub fn is_multipart(media_type: &str) -> bool {
    matches_any(MULTIPART_MARKERS, media_type)
}

/// Exact `*/*` only.
pub fn is_wildcard(media_type: &str) -> bool {
    media_type == "*/*"
}

/// Pick the preferred media type out of an ordered list: the first JSON-like
/// one, otherwise the first one.
pub fn preferred<'a, I>(media_types: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut first = None;
    for media_type in media_types {
        if is_json(media_type) {
            return Some(media_type);
        }
        first.get_or_insert(media_type);
    }
    first
}
