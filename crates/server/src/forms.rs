//! Form and query-string helpers shared by the page handlers.
//!
//! Browsers submit empty inputs as `""`; optional fields treat that as absent.

use std::fmt;
use std::str::FromStr;

use axum::response::Redirect;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use common::types::Flash;
use service::pagination::Pagination;
use service::ServiceError;

/// Serde adapter: `""` becomes `None`, anything else is parsed with `FromStr`.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => FromStr::from_str(s).map_err(de::Error::custom).map(Some),
    }
}

/// Checkbox semantics: present and not `false`/`0`/`off`.
pub fn checked(value: &Option<String>) -> bool {
    matches!(value.as_deref().map(str::trim), Some(v) if !matches!(v, "" | "false" | "0" | "off"))
}

/// Optional text input, trimmed; blank becomes `None`.
pub fn text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a price such as `150`, `150.5` or `1.250,75` into cents.
pub fn parse_price(raw: Option<&str>) -> Result<Option<i64>, ServiceError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let invalid = || ServiceError::invalid("price", "must be an amount like 150 or 150.50");
    // 1.250,75 / 1,250.75 / 1250,75
    let normalised = match (raw.rfind(','), raw.rfind('.')) {
        (Some(c), Some(d)) if c > d => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (Some(_), None) => raw.replace(',', "."),
        _ => raw.to_string(),
    };
    let (whole, frac) = match normalised.split_once('.') {
        Some((w, f)) => (w, f),
        None => (normalised.as_str(), ""),
    };
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let whole: i64 = whole.parse().map_err(|_| invalid())?;
    let frac: i64 = if frac.is_empty() { 0 } else { format!("{frac:0<2}").parse().map_err(|_| invalid())? };
    whole.checked_mul(100).and_then(|w| w.checked_add(frac)).map(Some).ok_or_else(invalid)
}

/// `datetime-local` input (`2025-07-01T10:30`) or RFC 3339, read as UTC.
pub fn parse_datetime(field: &str, raw: Option<&str>) -> Result<Option<DateTime<FixedOffset>>, ServiceError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt));
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).into()))
        .ok_or_else(|| ServiceError::invalid(field, "expected a date and time"))
}

pub fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ServiceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ServiceError::invalid(field, "expected YYYY-MM-DD")),
    }
}

/// `?page=&per_page=&q=` on list pages.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub q: Option<String>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        let d = Pagination::default();
        Pagination { page: self.page.unwrap_or(d.page), per_page: self.per_page.unwrap_or(d.per_page) }
    }

    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Outcome flags carried back to a page after a redirect.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FlashQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST-redirect-GET with a `?success=` flag.
pub fn done(path: &str, what: &str) -> Redirect {
    Redirect::to(&Flash::Success(what.to_string()).redirect_target(path))
}
