//! Plain-text lead summaries sent through the relay and the mailto handoff

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use vivea_api::FormSubmission;
use vivea_core::format_date_short;

pub const FOLLOW_UP_NOTE: &str = "Merci de contacter ce prospect dans les 24h.";
pub const WEBSITE_SOURCE: &str = "Site web Vivéa";

/// Relay body: contact fields, fr-CA request date, source and follow-up note
pub fn relay_message<Tz: TimeZone>(submission: &FormSubmission, at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let mut body = lead_lines(submission, at);
    body.push_str(&format!("Source: {}\n", WEBSITE_SOURCE));
    body.push('\n');
    body.push_str(FOLLOW_UP_NOTE);
    body
}

/// Mailto body: same summary, without the source line
pub fn mailto_body<Tz: TimeZone>(submission: &FormSubmission, at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let mut body = lead_lines(submission, at);
    body.push('\n');
    body.push_str(FOLLOW_UP_NOTE);
    body
}

pub fn relay_message_now(submission: &FormSubmission) -> String {
    relay_message(submission, &Local::now())
}

pub fn mailto_body_now(submission: &FormSubmission) -> String {
    mailto_body(submission, &Local::now())
}

fn lead_lines<Tz: TimeZone>(submission: &FormSubmission, at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let mut lines = String::from("Nouvelle demande de test d'eau gratuit:\n\n");
    lines.push_str(&format!("Nom: {}\n", submission.name));
    lines.push_str(&format!("Téléphone: {}\n", submission.phone));
    lines.push_str(&format!("Email: {}\n", submission.email));
    if let Some(address) = submission.address() {
        lines.push_str(&format!("Adresse: {}\n", address));
    }
    if let Some(notes) = submission.notes() {
        lines.push_str(&format!("Notes: {}\n", notes));
    }
    if let Some(tracking_id) = &submission.tracking_id {
        lines.push_str(&format!("Numéro de suivi: {}\n", tracking_id));
    }
    lines.push_str(&format!("Date de demande: {}\n", format_date_short(at)));
    lines
}
