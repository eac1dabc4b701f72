use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::columns::{lenient_datetime, null_as_default};

pub const DEFAULT_PREFERRED_SLOT: &str = "flexible";
pub const DEFAULT_PRODUCT_OF_INTEREST: &str = "non_specifie";
pub const ACQUISITION_SOURCE_WEBSITE: &str = "site_web";

/// Lifecycle of a water-test request
///
/// Codes this crate does not know are kept verbatim in `Other` so rows edited
/// by hand in the admin UI still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum LeadStatus {
    #[default]
    New,
    Confirmed,
    Scheduled,
    Completed,
    Cancelled,
    Other(String),
}

impl LeadStatus {
    /// Code stored in the `statut` column
    pub fn code(&self) -> &str {
        match self {
            LeadStatus::New => "nouveau",
            LeadStatus::Confirmed => "confirme",
            LeadStatus::Scheduled => "planifie",
            LeadStatus::Completed => "realise",
            LeadStatus::Cancelled => "annule",
            LeadStatus::Other(code) => code,
        }
    }

    /// Known codes only
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "nouveau" => Some(LeadStatus::New),
            "confirme" => Some(LeadStatus::Confirmed),
            "planifie" => Some(LeadStatus::Scheduled),
            "realise" => Some(LeadStatus::Completed),
            "annule" => Some(LeadStatus::Cancelled),
            _ => None,
        }
    }

    pub fn parse(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| LeadStatus::Other(code.to_string()))
    }

    /// French label; unknown codes are shown as-is
    pub fn label(&self) -> &str {
        match self {
            LeadStatus::New => "Nouvelle demande",
            LeadStatus::Confirmed => "Confirmé",
            LeadStatus::Scheduled => "Planifié",
            LeadStatus::Completed => "Réalisé",
            LeadStatus::Cancelled => "Annulé",
            LeadStatus::Other(code) => code,
        }
    }
}

impl Serialize for LeadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for LeadStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(code) if !code.is_empty() => LeadStatus::parse(&code),
            _ => LeadStatus::New,
        })
    }
}

/// A row of the `test_requests` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "nom", default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "telephone", default, deserialize_with = "null_as_default")]
    pub phone: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,

    #[serde(rename = "adresse", default, deserialize_with = "null_as_default")]
    pub address: String,

    #[serde(rename = "ville", default, deserialize_with = "null_as_default")]
    pub city: String,

    #[serde(rename = "code_postal", default, deserialize_with = "null_as_default")]
    pub postal_code: String,

    #[serde(rename = "statut", default)]
    pub status: LeadStatus,

    #[serde(rename = "date_souhaitee", default, deserialize_with = "lenient_datetime")]
    pub preferred_date: Option<DateTime<Utc>>,

    #[serde(
        rename = "creneau_prefere",
        default = "default_slot",
        deserialize_with = "slot_or_default"
    )]
    pub preferred_slot: String,

    #[serde(
        rename = "produit_interesse",
        default = "default_product",
        deserialize_with = "product_or_default"
    )]
    pub product_of_interest: String,

    #[serde(
        rename = "source_acquisition",
        default = "default_source",
        deserialize_with = "source_or_default"
    )]
    pub acquisition_source: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,

    /// Creation time in milliseconds, set by the table API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

fn default_slot() -> String {
    DEFAULT_PREFERRED_SLOT.to_string()
}

fn default_product() -> String {
    DEFAULT_PRODUCT_OF_INTEREST.to_string()
}

fn default_source() -> String {
    ACQUISITION_SOURCE_WEBSITE.to_string()
}

fn slot_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_slot))
}

fn product_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_product))
}

fn source_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_source))
}

impl LeadRequest {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            status: LeadStatus::New,
            preferred_date: None,
            preferred_slot: default_slot(),
            product_of_interest: default_product(),
            acquisition_source: default_source(),
            notes: String::new(),
            created_at: None,
        }
    }
}
