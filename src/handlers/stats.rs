//! Dashboard aggregation endpoint. A fixed set of independent count and top-N
//! queries is fanned out concurrently, then grouped counts are folded into
//! key/count lists server side. No caching: every call recomputes from the
//! live store.

use axum::{Extension, Json};
use chrono::{Datelike, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::types::Json as SqlJson;
use sqlx::FromRow;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::auth::roles;
use crate::database;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::AuthContext;

#[derive(Debug, Serialize, FromRow)]
struct TopChercheur {
    id: Uuid,
    nom: String,
    prenom: String,
    specialite: Option<String>,
    nombre_publications: Option<i32>,
    h_index: Option<i32>,
    photo_url: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
struct RecentPublication {
    id: Uuid,
    titre: String,
    annee: i32,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    type_: Option<String>,
    journal: Option<String>,
    auteurs: SqlJson<Value>,
}

/// GET /stats-dashboard - overview counts, top lists and grouped series
/// (admin/moderator).
pub async fn dashboard(
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let this_year = Utc::now().year();

    let (
        total_chercheurs,
        chercheurs_actifs,
        total_publications,
        publications_this_year,
        total_centres,
        centres_actifs,
        total_provinces,
        top_chercheurs,
        recent_publications,
        annees,
        types,
    ) = tokio::try_join!(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chercheurs").fetch_one(&pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM chercheurs WHERE est_actif = true")
            .fetch_one(&pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM publications").fetch_one(&pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM publications WHERE annee = $1")
            .bind(this_year)
            .fetch_one(&pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM centres_recherche").fetch_one(&pool),
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM centres_recherche WHERE est_actif = true"
        )
        .fetch_one(&pool),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM provinces").fetch_one(&pool),
        sqlx::query_as::<_, TopChercheur>(
            "SELECT id, nom, prenom, specialite, nombre_publications, h_index, photo_url \
             FROM chercheurs WHERE est_actif = true \
             ORDER BY nombre_publications DESC NULLS LAST LIMIT 10"
        )
        .fetch_all(&pool),
        sqlx::query_as::<_, RecentPublication>(
            "SELECT p.id, p.titre, p.annee, p.type, p.journal, \
                    (SELECT COALESCE(json_agg(jsonb_build_object('nom', c.nom, 'prenom', c.prenom) \
                                               ORDER BY ap.ordre), '[]'::json) \
                     FROM auteurs_publications ap \
                     JOIN chercheurs c ON c.id = ap.chercheur_id \
                     WHERE ap.publication_id = p.id) AS auteurs \
             FROM publications p ORDER BY p.created_at DESC LIMIT 20"
        )
        .fetch_all(&pool),
        sqlx::query_scalar::<_, i32>("SELECT annee FROM publications WHERE annee >= $1")
            .bind(this_year - 5)
            .fetch_all(&pool),
        sqlx::query_scalar::<_, String>("SELECT type FROM publications WHERE type IS NOT NULL")
            .fetch_all(&pool),
    )
    .map_err(DatabaseError::from)?;

    let stats = json!({
        "overview": {
            "total_chercheurs": total_chercheurs,
            "chercheurs_actifs": chercheurs_actifs,
            "total_publications": total_publications,
            "publications_this_year": publications_this_year,
            "total_centres": total_centres,
            "centres_actifs": centres_actifs,
            "total_provinces": total_provinces,
        },
        "top_chercheurs": top_chercheurs,
        "recent_publications": recent_publications,
        "publications_by_year": count_by_year(&annees),
        "publications_by_type": count_by_type(&types),
        "generated_at": Utc::now(),
    });

    info!(admin = %user.user_id, "generated dashboard stats");
    Ok(Json(json!({ "data": stats })))
}

/// Folds a flat list of publication years into ascending (annee, count) pairs.
fn count_by_year(annees: &[i32]) -> Vec<Value> {
    let mut counts: BTreeMap<i32, i64> = BTreeMap::new();
    for annee in annees {
        *counts.entry(*annee).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(annee, count)| json!({ "annee": annee, "count": count }))
        .collect()
}

/// Folds a flat list of publication types into (type, count) pairs.
fn count_by_type(types: &[String]) -> Vec<Value> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for t in types {
        *counts.entry(t.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(t, count)| json!({ "type": t, "count": count }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_counts_are_folded_and_sorted() {
        let folded = count_by_year(&[2023, 2021, 2023, 2022, 2023]);
        assert_eq!(
            folded,
            vec![
                json!({ "annee": 2021, "count": 1 }),
                json!({ "annee": 2022, "count": 1 }),
                json!({ "annee": 2023, "count": 3 }),
            ]
        );
    }

    #[test]
    fn type_counts_are_folded() {
        let types = vec!["article".to_string(), "conference".to_string(), "article".to_string()];
        let folded = count_by_type(&types);
        assert_eq!(
            folded,
            vec![
                json!({ "type": "article", "count": 2 }),
                json!({ "type": "conference", "count": 1 }),
            ]
        );
    }

    #[test]
    fn empty_series_fold_to_empty_lists() {
        assert!(count_by_year(&[]).is_empty());
        assert!(count_by_type(&[]).is_empty());
    }
}
