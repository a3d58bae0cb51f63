//! Display-name normalization.
//!
//! Nominatim display names spell out the full administrative chain
//! ("West Reading, Berks County, Pennsylvania, United States"). The
//! globe only labels markers with `"City, Country"`, so the middle
//! layers are dropped.

/// Normalizes a comma-separated geocoder display string to
/// `"<first>, <last>"`. Strings with fewer than two segments come back
/// as their first segment, trimmed.
#[must_use]
pub fn normalize_display_name(display_name: &str) -> String {
    let segments: Vec<&str> = display_name
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, .., last] => format!("{first}, {last}"),
    }
}
