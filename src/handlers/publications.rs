//! Publications catalog endpoints.
//!
//! A publication's author list lives in the `auteurs_publications` join table
//! (ordinal position plus correspondence flag). Writes that touch both the
//! publication and its author list run in a single transaction so a failure
//! cannot leave an authorless publication behind.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::{ApiJson, ApiPath, ApiQuery};
use crate::auth::roles;
use crate::database;
use crate::database::models::publication::{
    NewAuteur, NewPublication, Publication, UpdatePublication, PUBLICATION_FROM,
    PUBLICATION_SELECT, PUBLICATION_SORTABLE,
};
use crate::database::write::UpdateBuilder;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::filter::{ListResponse, PageParams, QueryBuilder, SortDirection, SqlParam, SqlResult};
use crate::middleware::AuthContext;

use super::IdParam;

#[derive(Debug, Deserialize)]
pub struct PublicationListQuery {
    pub annee: Option<i32>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub quartile: Option<String>,
    /// Restricts the listing to publications authored by this researcher.
    pub chercheur_id: Option<Uuid>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /publications-api - filtered, paginated publication listing.
pub async fn list(
    ApiQuery(query): ApiQuery<PublicationListQuery>,
) -> Result<Json<ListResponse<Publication>>, ApiError> {
    let page = PageParams::new(query.limit, query.offset);

    let mut qb = QueryBuilder::new();
    qb.equals("p.est_publie", true)?;
    qb.equals_opt("p.annee", query.annee)?;
    qb.equals_text_opt("p.type", query.type_.as_deref())?;
    qb.equals_text_opt("p.quartile", query.quartile.as_deref())?;
    if let Some(chercheur_id) = query.chercheur_id {
        qb.raw(
            "p.id IN (SELECT publication_id FROM auteurs_publications WHERE chercheur_id = $?)",
            vec![chercheur_id.into()],
        );
    }
    qb.sort(
        query.sort_by.as_deref(),
        query.sort_dir.as_deref(),
        PUBLICATION_SORTABLE,
        ("p.annee", SortDirection::Desc),
    )?;
    qb.paginate(&page);

    let pool = database::pool().await?;
    let count = database::fetch_count(&pool, &qb.to_count_sql(PUBLICATION_FROM)).await?;
    let data: Vec<Publication> =
        database::fetch_all_as(&pool, &qb.to_select_sql(PUBLICATION_SELECT)).await?;

    info!(count = data.len(), total = count, "listed publications");
    Ok(Json(ListResponse::new(data, count, &page)))
}

/// GET /publications-api/:id - single publication with full author expansion.
pub async fn get_one(ApiPath(id): ApiPath<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = database::pool().await?;

    let sql = SqlResult {
        query: format!("{} WHERE p.id = $1", PUBLICATION_SELECT),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    let row: Publication = database::fetch_optional_as(&pool, &sql)
        .await?
        .ok_or_else(|| ApiError::not_found("Publication not found"))?;

    Ok(Json(json!({ "data": row })))
}

/// Inserts the replacement author rows for a publication. Ordinal defaults to
/// the position in the submitted list (1-based).
async fn insert_auteurs(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    publication_id: Uuid,
    auteurs: &[NewAuteur],
) -> Result<(), ApiError> {
    for (index, auteur) in auteurs.iter().enumerate() {
        let sql = SqlResult {
            query: "INSERT INTO auteurs_publications \
                    (publication_id, chercheur_id, ordre, est_correspondant) \
                    VALUES ($1, $2, $3, $4)"
                .to_string(),
            params: vec![
                publication_id.into(),
                auteur.chercheur_id.into(),
                auteur.ordre.unwrap_or(index as i32 + 1).into(),
                auteur.est_correspondant.unwrap_or(false).into(),
            ],
        };
        database::execute(&mut **tx, &sql).await?;
    }
    Ok(())
}

/// POST /publications-api - create a publication and its author rows in one
/// transaction (admin/moderator).
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    ApiJson(body): ApiJson<NewPublication>,
) -> Result<impl IntoResponse, ApiError> {
    let user = ctx.require()?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let insert = SqlResult {
        query: "INSERT INTO publications \
                (titre, annee, type, journal, conference, doi, quartile, \
                 nombre_citations, resume, est_publie) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                RETURNING *"
            .to_string(),
        params: vec![
            body.titre.into(),
            body.annee.into(),
            body.type_.into(),
            body.journal.into(),
            body.conference.into(),
            body.doi.into(),
            body.quartile.into(),
            body.nombre_citations.into(),
            body.resume.into(),
            body.est_publie.unwrap_or(true).into(),
        ],
    };

    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;
    let row: Publication = database::fetch_one_as(&mut *tx, &insert).await?;
    insert_auteurs(&mut tx, row.id, &body.auteurs).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    info!(id = %row.id, auteurs = body.auteurs.len(), "created publication");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": row, "message": "Publication créée avec succès" })),
    ))
}

/// PUT /publications-api?id= - partial update (admin/moderator). A supplied
/// `auteurs` list replaces the existing author rows wholesale.
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<IdParam>,
    ApiJson(body): ApiJson<UpdatePublication>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let id = params.require("Publication")?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let mut ub = UpdateBuilder::new("publications")?;
    ub.set_opt("titre", body.titre)?;
    ub.set_opt("annee", body.annee)?;
    ub.set_opt("type", body.type_)?;
    ub.set_opt("journal", body.journal)?;
    ub.set_opt("conference", body.conference)?;
    ub.set_opt("doi", body.doi)?;
    ub.set_opt("quartile", body.quartile)?;
    ub.set_opt("nombre_citations", body.nombre_citations)?;
    ub.set_opt("resume", body.resume)?;
    ub.set_opt("est_publie", body.est_publie)?;

    if !ub.has_changes() && body.auteurs.is_none() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;

    let row: Publication = if ub.has_changes() {
        database::fetch_one_as(&mut *tx, &ub.by_id(id, "*")).await?
    } else {
        let sql = SqlResult {
            query: "SELECT * FROM publications WHERE id = $1".to_string(),
            params: vec![SqlParam::Uuid(Some(id))],
        };
        database::fetch_optional_as(&mut *tx, &sql)
            .await?
            .ok_or_else(|| ApiError::not_found("Publication not found"))?
    };

    if let Some(auteurs) = &body.auteurs {
        let clear = SqlResult {
            query: "DELETE FROM auteurs_publications WHERE publication_id = $1".to_string(),
            params: vec![SqlParam::Uuid(Some(id))],
        };
        database::execute(&mut *tx, &clear).await?;
        insert_auteurs(&mut tx, id, auteurs).await?;
    }

    tx.commit().await.map_err(DatabaseError::from)?;

    info!(id = %id, "updated publication");
    Ok(Json(
        json!({ "data": row, "message": "Publication mise à jour avec succès" }),
    ))
}

/// DELETE /publications-api?id= - hard delete (admin), author rows removed in
/// the same transaction.
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<IdParam>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let id = params.require("Publication")?;
    let pool: PgPool = database::pool().await?;
    roles::require_admin(&pool, user).await?;

    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;
    let clear = SqlResult {
        query: "DELETE FROM auteurs_publications WHERE publication_id = $1".to_string(),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    database::execute(&mut *tx, &clear).await?;
    let delete = SqlResult {
        query: "DELETE FROM publications WHERE id = $1".to_string(),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    database::execute(&mut *tx, &delete).await?;
    tx.commit().await.map_err(DatabaseError::from)?;

    info!(id = %id, "deleted publication");
    Ok(Json(json!({ "message": "Publication supprimée avec succès" })))
}
