//! Researcher directory endpoints.
//!
//! Listing and detail reads are public, but PII fields are redacted unless the
//! viewer owns the profile or holds an elevated role. Deletion is a soft
//! delete: the row stays for referential history with `est_actif = false`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::api::{ApiJson, ApiPath, ApiQuery};
use crate::auth::roles;
use crate::database;
use crate::database::models::chercheur::{
    Chercheur, NewChercheur, UpdateChercheur, CHERCHEUR_DETAIL_SELECT, CHERCHEUR_FROM,
    CHERCHEUR_SELECT, CHERCHEUR_SORTABLE,
};
use crate::database::write::UpdateBuilder;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::filter::{ListResponse, PageParams, QueryBuilder, SortDirection, SqlParam, SqlResult};
use crate::middleware::AuthContext;

use super::IdParam;

#[derive(Debug, Deserialize)]
pub struct ChercheurListQuery {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub grade: Option<String>,
    pub specialite: Option<String>,
    pub centre_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// True when the caller holds an elevated role; anonymous viewers never do.
async fn viewer_is_elevated(pool: &PgPool, ctx: &AuthContext) -> Result<bool, ApiError> {
    match ctx.user() {
        Some(user) => Ok(roles::is_admin_or_moderator(pool, user.user_id).await?),
        None => Ok(false),
    }
}

/// GET /chercheurs-api - filtered, paginated researcher listing.
pub async fn list(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ChercheurListQuery>,
) -> Result<Json<ListResponse<Chercheur>>, ApiError> {
    let page = PageParams::new(query.limit, query.offset);

    let mut qb = QueryBuilder::new();
    qb.equals("c.est_actif", true)?;
    qb.contains_opt("c.nom", query.nom.as_deref())?;
    qb.contains_opt("c.prenom", query.prenom.as_deref())?;
    qb.contains_opt("c.specialite", query.specialite.as_deref())?;
    qb.equals_text_opt("c.grade", query.grade.as_deref())?;
    qb.equals_opt("c.centre_id", query.centre_id)?;
    qb.equals_opt("c.province_id", query.province_id)?;
    qb.sort(
        query.sort_by.as_deref(),
        query.sort_dir.as_deref(),
        CHERCHEUR_SORTABLE,
        ("c.created_at", SortDirection::Desc),
    )?;
    qb.paginate(&page);

    let pool = database::pool().await?;
    let count = database::fetch_count(&pool, &qb.to_count_sql(CHERCHEUR_FROM)).await?;
    let rows: Vec<Chercheur> =
        database::fetch_all_as(&pool, &qb.to_select_sql(CHERCHEUR_SELECT)).await?;

    let elevated = viewer_is_elevated(&pool, &ctx).await?;
    let data: Vec<Chercheur> = rows
        .into_iter()
        .map(|row| row.redact_for(ctx.user(), elevated))
        .collect();

    info!(count = data.len(), total = count, "listed chercheurs");
    Ok(Json(ListResponse::new(data, count, &page)))
}

/// GET /chercheurs-api/:id - single researcher with publication history.
pub async fn get_one(
    Extension(ctx): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = database::pool().await?;

    let sql = SqlResult {
        query: format!("{} WHERE c.id = $1", CHERCHEUR_DETAIL_SELECT),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    let row: Chercheur = database::fetch_optional_as(&pool, &sql)
        .await?
        .ok_or_else(|| ApiError::not_found("Chercheur not found"))?;

    let elevated = viewer_is_elevated(&pool, &ctx).await?;
    let data = row.redact_for(ctx.user(), elevated);

    Ok(Json(json!({ "data": data })))
}

/// POST /chercheurs-api - create a researcher (admin/moderator).
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    ApiJson(body): ApiJson<NewChercheur>,
) -> Result<impl IntoResponse, ApiError> {
    let user = ctx.require()?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let sql = SqlResult {
        query: "INSERT INTO chercheurs \
                (nom, prenom, email, telephone, grade, specialite, photo_url, \
                 h_index, i10_index, total_citations, nombre_publications, \
                 centre_id, province_id, user_id, derniere_mise_a_jour) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, now()) \
                RETURNING *"
            .to_string(),
        params: vec![
            body.nom.into(),
            body.prenom.into(),
            body.email.into(),
            body.telephone.into(),
            body.grade.into(),
            body.specialite.into(),
            body.photo_url.into(),
            body.h_index.into(),
            body.i10_index.into(),
            body.total_citations.into(),
            body.nombre_publications.into(),
            body.centre_id.into(),
            body.province_id.into(),
            body.user_id.into(),
        ],
    };
    let row: Chercheur = database::fetch_one_as(&pool, &sql).await?;

    info!(id = %row.id, "created chercheur");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": row, "message": "Chercheur créé avec succès" })),
    ))
}

/// PUT /chercheurs-api?id= - partial update (owner or admin/moderator).
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<IdParam>,
    ApiJson(body): ApiJson<UpdateChercheur>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let id = params.require("Chercheur")?;
    let pool = database::pool().await?;

    let owner: Option<Uuid> = sqlx::query("SELECT user_id FROM chercheurs WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| ApiError::not_found("Chercheur not found"))?
        .try_get("user_id")
        .map_err(DatabaseError::from)?;

    roles::require_owner_or_admin(&pool, user, owner).await?;

    let mut ub = UpdateBuilder::new("chercheurs")?;
    ub.set_opt("nom", body.nom)?;
    ub.set_opt("prenom", body.prenom)?;
    ub.set_opt("email", body.email)?;
    ub.set_opt("telephone", body.telephone)?;
    ub.set_opt("grade", body.grade)?;
    ub.set_opt("specialite", body.specialite)?;
    ub.set_opt("photo_url", body.photo_url)?;
    ub.set_opt("h_index", body.h_index)?;
    ub.set_opt("i10_index", body.i10_index)?;
    ub.set_opt("total_citations", body.total_citations)?;
    ub.set_opt("nombre_publications", body.nombre_publications)?;
    ub.set_opt("centre_id", body.centre_id)?;
    ub.set_opt("province_id", body.province_id)?;
    ub.set_raw("derniere_mise_a_jour", "now()")?;

    if !ub.has_changes() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let row: Chercheur = database::fetch_one_as(&pool, &ub.by_id(id, "*")).await?;

    info!(id = %id, "updated chercheur");
    Ok(Json(
        json!({ "data": row, "message": "Chercheur mis à jour avec succès" }),
    ))
}

/// DELETE /chercheurs-api?id= - soft delete (admin). Idempotent: deleting an
/// already inactive researcher still succeeds.
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<IdParam>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let id = params.require("Chercheur")?;
    let pool = database::pool().await?;
    roles::require_admin(&pool, user).await?;

    let sql = SqlResult {
        query: "UPDATE chercheurs SET est_actif = false WHERE id = $1".to_string(),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    database::execute(&pool, &sql).await?;

    info!(id = %id, "deleted chercheur");
    Ok(Json(json!({ "message": "Chercheur supprimé avec succès" })))
}
