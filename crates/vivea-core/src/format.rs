//! Display helpers for lead rows

use chrono::{DateTime, Local, Locale, TimeZone};
use serde::Serialize;
use std::fmt::Display;
use vivea_api::{LeadRequest, LeadStatus};

/// `(xxx) xxx-xxxx` for ten-digit numbers, anything else unchanged
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        phone.to_string()
    }
}

/// French label for a `statut` code; unknown codes are returned as-is
pub fn status_label(code: &str) -> String {
    LeadStatus::from_code(code)
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| code.to_string())
}

/// `2025-01-15`
pub fn format_date_short<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%Y-%m-%d").to_string()
}

/// `15 janvier 2025 à 14 h 30`
pub fn format_long_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format_localized("%-d %B %Y à %H h %M", Locale::fr_CA)
        .to_string()
}

/// `mercredi 15 janvier 2025 à 14 h 30`
pub fn format_long_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format_localized("%A %-d %B %Y à %H h %M", Locale::fr_CA)
        .to_string()
}

/// Long local date for a table API `created_at` in milliseconds
pub fn format_created_at(millis: i64) -> Option<String> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|at| format_long_date(&at))
}

/// A lead row plus its pre-formatted display fields
#[derive(Debug, Clone, Serialize)]
pub struct DisplayLead {
    #[serde(flatten)]
    pub lead: LeadRequest,
    pub created_at_formatted: Option<String>,
    pub telephone_formatted: String,
    pub statut_label: String,
}

pub fn format_display(lead: &LeadRequest) -> DisplayLead {
    DisplayLead {
        created_at_formatted: lead.created_at.and_then(format_created_at),
        telephone_formatted: format_phone_number(&lead.phone),
        statut_label: lead.status.label().to_string(),
        lead: lead.clone(),
    }
}
