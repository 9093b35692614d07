use crate::models::cookie::CookiePair;

/// Parses a raw `Cookie:` header string ("a=1; b=2") into ordered pairs.
///
/// Splits on `;`, trims each segment, then splits each segment on the FIRST
/// `=` only, so values may themselves contain `=` (base64 tokens). Segments
/// without `=`, empty segments, and pairs whose trimmed name or value is
/// empty are all dropped. An empty or all-malformed header yields an empty
/// list, not an error.
pub fn parse_cookie_header(header: &str) -> Vec<CookiePair> {
    header
        .split(';')
        .filter_map(|segment| {
            let (name, value) = segment.trim().split_once('=')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some(CookiePair::new(name, value))
        })
        .collect()
}
