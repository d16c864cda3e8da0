//! Content negotiation over `Content-Type` and `Accept`.
//!
//! Registry keys and request headers are compared by their media type
//! *essence*: the `type/subtype` part, lower-cased, with parameters such as
//! `charset` or `q` removed.

use http::header::{ACCEPT, CONTENT_TYPE};
use http::HeaderMap;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Media type assumed for a missing `Content-Type` and for `Accept: */*`.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Ordered writer keys to try for one request.
pub type AcceptCandidates = SmallVec<[String; 4]>;

/// The `type/subtype` of a media type, lower-cased, parameters stripped.
#[must_use]
pub fn essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether `key` is usable as a registry key (`type/subtype`, both non-empty).
#[must_use]
pub fn is_media_type(key: &str) -> bool {
    let key = essence(key);
    match key.split_once('/') {
        Some((ty, sub)) => {
            !ty.is_empty()
                && !sub.is_empty()
                && !sub.contains('/')
                && !key.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Essence of the request `Content-Type`, defaulting to JSON when absent.
#[must_use]
pub fn request_content_type(headers: &HeaderMap) -> String {
    match headers.get(CONTENT_TYPE) {
        None => DEFAULT_MEDIA_TYPE.to_string(),
        Some(value) => {
            let value = String::from_utf8_lossy(value.as_bytes());
            if value.trim().is_empty() {
                DEFAULT_MEDIA_TYPE.to_string()
            } else {
                essence(&value)
            }
        }
    }
}

/// The raw `Accept` header(s) joined, for error messages.
#[must_use]
pub fn accept_header(headers: &HeaderMap) -> String {
    headers
        .get_all(ACCEPT)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

fn quality(params: &str) -> f32 {
    params
        .split(';')
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("q"))
        .map_or(1.0, |(_, v)| v.trim().parse::<f32>().unwrap_or(0.0))
}

/// Writer keys to try for this request, best first.
///
/// A missing or empty header, or `*/*`, selects [`DEFAULT_MEDIA_TYPE`]. A list
/// is ordered by descending `q` (ties keep header order) and entries with
/// `q=0` are dropped. A wildcard never selects a media type the client
/// refused with `q=0`.
#[must_use]
pub fn accept_candidates(headers: &HeaderMap) -> AcceptCandidates {
    let header = accept_header(headers);
    if header.trim().is_empty() {
        return smallvec::smallvec![DEFAULT_MEDIA_TYPE.to_string()];
    }

    let (mut ranked, refused): (SmallVec<[(String, f32); 4]>, SmallVec<[(String, f32); 4]>) =
        header
            .split(',')
            .filter_map(|entry| {
                let (range, params) = entry.split_once(';').unwrap_or((entry, ""));
                let range = essence(range);
                (!range.is_empty()).then(|| (range, quality(params)))
            })
            .partition(|(_, q)| *q > 0.0);
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut out = AcceptCandidates::new();
    for (range, _) in ranked {
        let key = if range == "*/*" {
            if refused.iter().any(|(r, _)| r == DEFAULT_MEDIA_TYPE) {
                continue;
            }
            DEFAULT_MEDIA_TYPE.to_string()
        } else {
            range
        };
        if !out.contains(&key) {
            out.push(key);
        }
    }
    out
}
