//! HTML and plain-text notification bodies
//!
//! Visitor-supplied fields are HTML-escaped in the HTML body.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use vivea_api::FormSubmission;
use vivea_core::{format_date_short, format_long_datetime};

pub fn subject(tracking_id: &str) -> String {
    format!("Nouvelle demande de test d'eau - {}", tracking_id)
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn info_item(label: &str, value: &str, style: &str) -> String {
    format!(
        "<div class=\"info-item\"{}>\n  <div class=\"label\">{}</div>\n  <div class=\"value\">{}</div>\n</div>\n",
        style,
        label,
        escape_html(value)
    )
}

const STYLE: &str = "body { font-family: 'Segoe UI', Arial, sans-serif; line-height: 1.6; color: #333; }
.container { max-width: 600px; margin: 0 auto; padding: 20px; }
.header { background: #00bcd4; color: white; padding: 30px; text-align: center; border-radius: 8px 8px 0 0; }
.content { background: #f8f9fa; padding: 30px; border-radius: 0 0 8px 8px; }
.info-grid { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; margin: 20px 0; }
.info-item { background: white; padding: 15px; border-radius: 6px; border-left: 4px solid #00bcd4; }
.label { font-weight: 600; color: #00bcd4; margin-bottom: 5px; }
.tracking { background: #e3f2fd; padding: 15px; border-radius: 6px; text-align: center; margin: 20px 0; }
.cta { text-align: center; margin: 30px 0; }
.btn { background: #00bcd4; color: white; padding: 12px 24px; border-radius: 6px; text-decoration: none; display: inline-block; }
.footer { text-align: center; color: #6c757d; font-size: 0.9rem; margin-top: 30px; }";

pub fn render_html<Tz: TimeZone>(
    submission: &FormSubmission,
    tracking_id: &str,
    received_at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: Display,
{
    let mut grid = String::new();
    grid.push_str(&info_item("👤 Nom complet", &submission.name, ""));
    grid.push_str(&info_item("📧 Email", &submission.email, ""));
    grid.push_str(&info_item("📞 Téléphone", &submission.phone, ""));
    grid.push_str(&info_item(
        "📅 Date de demande",
        &format_date_short(received_at),
        "",
    ));

    let mut extra = String::new();
    if let Some(address) = submission.address() {
        extra.push_str(&info_item(
            "🏠 Adresse",
            address,
            " style=\"grid-column: 1 / -1;\"",
        ));
    }
    if let Some(notes) = submission.notes() {
        extra.push_str(&info_item("📝 Notes", notes, " style=\"margin-top: 20px;\""));
    }

    let phone = escape_html(&submission.phone);
    let email = escape_html(&submission.email);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>Nouvelle demande de test d'eau - Vivéa</title>
<style>
{style}
</style>
</head>
<body>
<div class="container">
<div class="header">
<h1>🧪 Nouvelle Demande de Test d'Eau</h1>
<p>Une nouvelle famille souhaite découvrir la qualité de son eau</p>
</div>
<div class="content">
<div class="tracking">
<strong>Numéro de suivi : {tracking_id}</strong><br>
<small>Reçu le {received}</small>
</div>
<div class="info-grid">
{grid}</div>
{extra}<div class="cta">
<p><strong>⚡ Action requise :</strong> Contacter ce prospect dans les 24h</p>
<a href="tel:{phone}" class="btn">📞 Appeler maintenant</a>
<a href="mailto:{email}" class="btn" style="margin-left: 10px;">📧 Envoyer un email</a>
</div>
<div class="footer">
<p>🌊 Vivéa - Solutions de Filtration d'Eau</p>
<p>Demande reçue via le site web • Système automatisé</p>
</div>
</div>
</div>
</body>
</html>"#,
        style = STYLE,
        tracking_id = escape_html(tracking_id),
        received = format_long_datetime(received_at),
        grid = grid,
        extra = extra,
        phone = phone,
        email = email,
    )
}

pub fn render_text<Tz: TimeZone>(
    submission: &FormSubmission,
    tracking_id: &str,
    received_at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: Display,
{
    let mut text = String::from("NOUVELLE DEMANDE DE TEST D'EAU - VIVÉA\n");
    text.push_str("=====================================\n\n");
    text.push_str(&format!("Numéro de suivi : {}\n", tracking_id));
    text.push_str(&format!(
        "Date de réception : {}\n\n",
        format_date_short(received_at)
    ));
    text.push_str("INFORMATIONS CLIENT :\n--------------------\n");
    text.push_str(&format!("Nom : {}\n", submission.name));
    text.push_str(&format!("Email : {}\n", submission.email));
    text.push_str(&format!("Téléphone : {}\n", submission.phone));
    if let Some(address) = submission.address() {
        text.push_str(&format!("Adresse : {}\n", address));
    }
    if let Some(notes) = submission.notes() {
        text.push_str(&format!("Notes : {}\n", notes));
    }
    text.push_str("\nACTION REQUISE :\n---------------\n");
    text.push_str("⚡ Contacter ce prospect dans les 24h\n");
    text.push_str(&format!("📞 Téléphone : {}\n", submission.phone));
    text.push_str(&format!("📧 Email : {}\n", submission.email));
    text.push_str("\n---\n🌊 Vivéa - Solutions de Filtration d'Eau\nDemande reçue via le site web");
    text
}
