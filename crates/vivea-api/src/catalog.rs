//! Read-mostly reference rows: products, testimonials, statistics
//!
//! Only the columns the site relies on are typed; everything else the table
//! API returns is kept in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::columns::null_as_default;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,

    #[serde(rename = "nom", default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "prix", default)]
    pub price: Option<f64>,

    #[serde(rename = "populaire", default, deserialize_with = "null_as_default")]
    pub popular: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,

    #[serde(rename = "nom_client", default, deserialize_with = "null_as_default")]
    pub client_name: String,

    #[serde(rename = "texte", default, deserialize_with = "null_as_default")]
    pub text: String,

    /// Satisfaction score, 1 to 5
    #[serde(rename = "note_satisfaction", default)]
    pub satisfaction: Option<f64>,

    #[serde(rename = "publie", default, deserialize_with = "null_as_default")]
    pub published: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,

    #[serde(rename = "date_temoignage", default)]
    pub date: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    pub id: String,

    #[serde(rename = "libelle", default, deserialize_with = "null_as_default")]
    pub label: String,

    #[serde(rename = "valeur", default, deserialize_with = "null_as_default")]
    pub value: f64,

    #[serde(rename = "affiche_accueil", default, deserialize_with = "null_as_default")]
    pub shown_on_home: bool,

    #[serde(rename = "ordre_affichage", default, deserialize_with = "null_as_default")]
    pub display_order: i64,

    #[serde(rename = "date_mise_a_jour", default)]
    pub updated_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
