use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

/// Researcher row with read-time relation expansion. The `centre`, `province`
/// and `publications` columns are produced by SQL-side `row_to_json` /
/// `json_agg` subqueries; statements that do not expand them (INSERT/UPDATE
/// RETURNING) fall back to the sqlx defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Chercheur {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    pub grade: Option<String>,
    pub specialite: Option<String>,
    pub photo_url: Option<String>,
    pub h_index: Option<i32>,
    pub i10_index: Option<i32>,
    pub total_citations: Option<i32>,
    pub nombre_publications: Option<i32>,
    pub centre_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub est_actif: bool,
    pub created_at: DateTime<Utc>,
    pub derniere_mise_a_jour: Option<DateTime<Utc>>,

    #[sqlx(default)]
    pub centre: Option<Json<CentreRef>>,
    #[sqlx(default)]
    pub province: Option<Json<ProvinceRef>>,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publications: Option<Json<Vec<AuthoredPublication>>>,
}

impl Chercheur {
    /// PII is visible to the profile owner and to elevated roles only.
    pub fn redact_for(mut self, viewer: Option<&AuthUser>, is_admin: bool) -> Self {
        let is_owner = match (viewer, self.user_id) {
            (Some(user), Some(owner)) => user.user_id == owner,
            _ => false,
        };
        if !(is_owner || is_admin) {
            self.email = None;
            self.telephone = None;
            self.user_id = None;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentreRef {
    pub id: Uuid,
    pub nom: String,
    pub acronyme: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceRef {
    pub id: Uuid,
    pub nom: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChercheurRef {
    pub id: Uuid,
    pub nom: String,
    pub prenom: String,
    pub photo_url: Option<String>,
}

/// One entry of a researcher's publication list (detail view).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoredPublication {
    pub ordre: Option<i32>,
    pub est_correspondant: Option<bool>,
    pub publication: serde_json::Value,
}

/// List/detail select base with centre and province expanded inline.
pub const CHERCHEUR_SELECT: &str = r#"SELECT c.*,
    (SELECT row_to_json(ce) FROM (SELECT id, nom, acronyme FROM centres_recherche WHERE id = c.centre_id) ce) AS centre,
    (SELECT row_to_json(pr) FROM (SELECT id, nom FROM provinces WHERE id = c.province_id) pr) AS province
FROM chercheurs c"#;

/// Detail select: list expansion plus the ordered publication list.
pub const CHERCHEUR_DETAIL_SELECT: &str = r#"SELECT c.*,
    (SELECT row_to_json(ce) FROM (SELECT id, nom, acronyme FROM centres_recherche WHERE id = c.centre_id) ce) AS centre,
    (SELECT row_to_json(pr) FROM (SELECT id, nom FROM provinces WHERE id = c.province_id) pr) AS province,
    (SELECT COALESCE(json_agg(jsonb_build_object(
            'ordre', ap.ordre,
            'est_correspondant', ap.est_correspondant,
            'publication', to_jsonb(p)
        ) ORDER BY p.annee DESC), '[]'::json)
     FROM auteurs_publications ap
     JOIN publications p ON p.id = ap.publication_id
     WHERE ap.chercheur_id = c.id) AS publications
FROM chercheurs c"#;

pub const CHERCHEUR_FROM: &str = "chercheurs c";

/// Caller-facing sort keys and the columns they map to.
pub const CHERCHEUR_SORTABLE: &[(&str, &str)] = &[
    ("nom", "c.nom"),
    ("prenom", "c.prenom"),
    ("grade", "c.grade"),
    ("h_index", "c.h_index"),
    ("nombre_publications", "c.nombre_publications"),
    ("created_at", "c.created_at"),
];

#[derive(Debug, Deserialize)]
pub struct NewChercheur {
    pub nom: String,
    pub prenom: String,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub grade: Option<String>,
    pub specialite: Option<String>,
    pub photo_url: Option<String>,
    pub h_index: Option<i32>,
    pub i10_index: Option<i32>,
    pub total_citations: Option<i32>,
    pub nombre_publications: Option<i32>,
    pub centre_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateChercheur {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub grade: Option<String>,
    pub specialite: Option<String>,
    pub photo_url: Option<String>,
    pub h_index: Option<i32>,
    pub i10_index: Option<i32>,
    pub total_citations: Option<i32>,
    pub nombre_publications: Option<i32>,
    pub centre_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(owner: Option<Uuid>) -> Chercheur {
        Chercheur {
            id: Uuid::new_v4(),
            nom: "Kabongo".into(),
            prenom: "Alice".into(),
            email: Some("alice@example.cd".into()),
            telephone: Some("+243 000 000".into()),
            grade: Some("professeur_ordinaire".into()),
            specialite: None,
            photo_url: None,
            h_index: Some(12),
            i10_index: None,
            total_citations: None,
            nombre_publications: Some(40),
            centre_id: None,
            province_id: None,
            user_id: owner,
            est_actif: true,
            created_at: Utc::now(),
            derniere_mise_a_jour: None,
            centre: None,
            province: None,
            publications: None,
        }
    }

    #[test]
    fn anonymous_viewer_loses_pii() {
        let row = sample(Some(Uuid::new_v4())).redact_for(None, false);
        assert!(row.email.is_none());
        assert!(row.telephone.is_none());
        assert!(row.user_id.is_none());
        // public bibliometrics survive
        assert_eq!(row.h_index, Some(12));
    }

    #[test]
    fn owner_keeps_pii() {
        let owner = Uuid::new_v4();
        let viewer = AuthUser {
            user_id: owner,
            email: None,
        };
        let row = sample(Some(owner)).redact_for(Some(&viewer), false);
        assert!(row.email.is_some());
    }

    #[test]
    fn admin_keeps_pii_for_any_row() {
        let viewer = AuthUser {
            user_id: Uuid::new_v4(),
            email: None,
        };
        let row = sample(Some(Uuid::new_v4())).redact_for(Some(&viewer), true);
        assert!(row.email.is_some());
    }

    #[test]
    fn redacted_fields_are_absent_from_json() {
        let row = sample(Some(Uuid::new_v4())).redact_for(None, false);
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("user_id").is_none());
        assert!(json.get("nom").is_some());
    }
}
