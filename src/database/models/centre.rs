use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::chercheur::ProvinceRef;

/// Research center row with province and director expanded inline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Centre {
    pub id: Uuid,
    pub nom: String,
    pub acronyme: Option<String>,
    pub adresse: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub site_web: Option<String>,
    pub province_id: Option<Uuid>,
    pub directeur_id: Option<Uuid>,
    pub nombre_chercheurs: Option<i32>,
    pub budget_annuel: Option<BigDecimal>,
    pub est_actif: bool,
    pub created_at: DateTime<Utc>,

    #[sqlx(default)]
    pub province: Option<Json<ProvinceRef>>,
    #[sqlx(default)]
    pub directeur: Option<Json<DirecteurRef>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirecteurRef {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
}

pub const CENTRE_SELECT: &str = r#"SELECT ce.*,
    (SELECT row_to_json(pr) FROM (SELECT id, nom FROM provinces WHERE id = ce.province_id) pr) AS province,
    (SELECT jsonb_build_object('id', c.id, 'nom', c.nom, 'prenom', c.prenom)
     FROM chercheurs c WHERE c.id = ce.directeur_id) AS directeur
FROM centres_recherche ce"#;

pub const CENTRE_FROM: &str = "centres_recherche ce";

pub const CENTRE_SORTABLE: &[(&str, &str)] = &[
    ("nom", "ce.nom"),
    ("acronyme", "ce.acronyme"),
    ("nombre_chercheurs", "ce.nombre_chercheurs"),
    ("created_at", "ce.created_at"),
];

#[derive(Debug, Deserialize)]
pub struct NewCentre {
    pub nom: String,
    pub acronyme: Option<String>,
    pub adresse: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub site_web: Option<String>,
    pub province_id: Option<Uuid>,
    pub directeur_id: Option<Uuid>,
    pub nombre_chercheurs: Option<i32>,
    pub budget_annuel: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCentre {
    pub nom: Option<String>,
    pub acronyme: Option<String>,
    pub adresse: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub site_web: Option<String>,
    pub province_id: Option<Uuid>,
    pub directeur_id: Option<Uuid>,
    pub nombre_chercheurs: Option<i32>,
    pub budget_annuel: Option<f64>,
}
