use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::chercheur::ChercheurRef;

/// Publication row with its ordered author list expanded inline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Publication {
    pub id: Uuid,
    pub titre: String,
    pub annee: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub journal: Option<String>,
    pub conference: Option<String>,
    pub doi: Option<String>,
    pub quartile: Option<String>,
    pub nombre_citations: Option<i32>,
    pub resume: Option<String>,
    pub est_publie: bool,
    pub created_at: DateTime<Utc>,

    #[sqlx(default)]
    pub auteurs: Option<Json<Vec<AuteurEntry>>>,
}

/// One author of a publication: ordinal position, correspondence flag and a
/// reference to the researcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuteurEntry {
    pub ordre: Option<i32>,
    pub est_correspondant: Option<bool>,
    pub chercheur: Option<ChercheurRef>,
}

pub const PUBLICATION_SELECT: &str = r#"SELECT p.*,
    (SELECT COALESCE(json_agg(jsonb_build_object(
            'ordre', ap.ordre,
            'est_correspondant', ap.est_correspondant,
            'chercheur', (SELECT jsonb_build_object('id', c.id, 'nom', c.nom, 'prenom', c.prenom, 'photo_url', c.photo_url)
                          FROM chercheurs c WHERE c.id = ap.chercheur_id)
        ) ORDER BY ap.ordre), '[]'::json)
     FROM auteurs_publications ap
     WHERE ap.publication_id = p.id) AS auteurs
FROM publications p"#;

pub const PUBLICATION_FROM: &str = "publications p";

pub const PUBLICATION_SORTABLE: &[(&str, &str)] = &[
    ("annee", "p.annee"),
    ("titre", "p.titre"),
    ("nombre_citations", "p.nombre_citations"),
    ("quartile", "p.quartile"),
    ("created_at", "p.created_at"),
];

#[derive(Debug, Deserialize)]
pub struct NewPublication {
    pub titre: String,
    pub annee: i32,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub journal: Option<String>,
    pub conference: Option<String>,
    pub doi: Option<String>,
    pub quartile: Option<String>,
    pub nombre_citations: Option<i32>,
    pub resume: Option<String>,
    pub est_publie: Option<bool>,
    #[serde(default)]
    pub auteurs: Vec<NewAuteur>,
}

#[derive(Debug, Deserialize)]
pub struct NewAuteur {
    pub chercheur_id: Uuid,
    pub ordre: Option<i32>,
    pub est_correspondant: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePublication {
    pub titre: Option<String>,
    pub annee: Option<i32>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub journal: Option<String>,
    pub conference: Option<String>,
    pub doi: Option<String>,
    pub quartile: Option<String>,
    pub nombre_citations: Option<i32>,
    pub resume: Option<String>,
    pub est_publie: Option<bool>,
    /// When present, replaces the whole author list.
    pub auteurs: Option<Vec<NewAuteur>>,
}
