//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// URL of a product image under `/media`.
///
/// Usage in templates: `{{ item.image|media_url }}`
#[askama::filter_fn]
pub fn media_url(path: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let path = path.to_string();
    Ok(format!("/media/{}", path.trim_start_matches('/')))
}
