//! Research center endpoints. Reads are public; centers are soft-deleted like
//! researchers so historical affiliations keep resolving.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::{ApiJson, ApiPath, ApiQuery};
use crate::auth::roles;
use crate::database;
use crate::database::models::centre::{
    Centre, NewCentre, UpdateCentre, CENTRE_FROM, CENTRE_SELECT, CENTRE_SORTABLE,
};
use crate::database::write::UpdateBuilder;
use crate::error::ApiError;
use crate::filter::{ListResponse, PageParams, QueryBuilder, SortDirection, SqlParam, SqlResult};
use crate::middleware::AuthContext;

use super::IdParam;

#[derive(Debug, Deserialize)]
pub struct CentreListQuery {
    pub nom: Option<String>,
    pub province_id: Option<Uuid>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /centres-api - filtered, paginated center listing.
pub async fn list(
    ApiQuery(query): ApiQuery<CentreListQuery>,
) -> Result<Json<ListResponse<Centre>>, ApiError> {
    let page = PageParams::new(query.limit, query.offset);

    let mut qb = QueryBuilder::new();
    qb.equals("ce.est_actif", true)?;
    qb.contains_opt("ce.nom", query.nom.as_deref())?;
    qb.equals_opt("ce.province_id", query.province_id)?;
    qb.sort(
        query.sort_by.as_deref(),
        query.sort_dir.as_deref(),
        CENTRE_SORTABLE,
        ("ce.nom", SortDirection::Asc),
    )?;
    qb.paginate(&page);

    let pool = database::pool().await?;
    let count = database::fetch_count(&pool, &qb.to_count_sql(CENTRE_FROM)).await?;
    let data: Vec<Centre> =
        database::fetch_all_as(&pool, &qb.to_select_sql(CENTRE_SELECT)).await?;

    info!(count = data.len(), total = count, "listed centres");
    Ok(Json(ListResponse::new(data, count, &page)))
}

/// GET /centres-api/:id - single center with province and director expanded.
pub async fn get_one(ApiPath(id): ApiPath<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = database::pool().await?;

    let sql = SqlResult {
        query: format!("{} WHERE ce.id = $1", CENTRE_SELECT),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    let row: Centre = database::fetch_optional_as(&pool, &sql)
        .await?
        .ok_or_else(|| ApiError::not_found("Centre not found"))?;

    Ok(Json(json!({ "data": row })))
}

/// POST /centres-api - create a center (admin/moderator).
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    ApiJson(body): ApiJson<NewCentre>,
) -> Result<impl IntoResponse, ApiError> {
    let user = ctx.require()?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let sql = SqlResult {
        query: "INSERT INTO centres_recherche \
                (nom, acronyme, adresse, email, telephone, site_web, \
                 province_id, directeur_id, nombre_chercheurs, budget_annuel) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                RETURNING *"
            .to_string(),
        params: vec![
            body.nom.into(),
            body.acronyme.into(),
            body.adresse.into(),
            body.email.into(),
            body.telephone.into(),
            body.site_web.into(),
            body.province_id.into(),
            body.directeur_id.into(),
            body.nombre_chercheurs.into(),
            body.budget_annuel.into(),
        ],
    };
    let row: Centre = database::fetch_one_as(&pool, &sql).await?;

    info!(id = %row.id, "created centre");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": row, "message": "Centre créé avec succès" })),
    ))
}

/// PUT /centres-api?id= - partial update (admin/moderator).
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<IdParam>,
    ApiJson(body): ApiJson<UpdateCentre>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let id = params.require("Centre")?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let mut ub = UpdateBuilder::new("centres_recherche")?;
    ub.set_opt("nom", body.nom)?;
    ub.set_opt("acronyme", body.acronyme)?;
    ub.set_opt("adresse", body.adresse)?;
    ub.set_opt("email", body.email)?;
    ub.set_opt("telephone", body.telephone)?;
    ub.set_opt("site_web", body.site_web)?;
    ub.set_opt("province_id", body.province_id)?;
    ub.set_opt("directeur_id", body.directeur_id)?;
    ub.set_opt("nombre_chercheurs", body.nombre_chercheurs)?;
    ub.set_opt("budget_annuel", body.budget_annuel)?;

    if !ub.has_changes() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let row: Centre = database::fetch_one_as(&pool, &ub.by_id(id, "*")).await?;

    info!(id = %id, "updated centre");
    Ok(Json(
        json!({ "data": row, "message": "Centre mis à jour avec succès" }),
    ))
}

/// DELETE /centres-api?id= - soft delete (admin), idempotent.
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<IdParam>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let id = params.require("Centre")?;
    let pool = database::pool().await?;
    roles::require_admin(&pool, user).await?;

    let sql = SqlResult {
        query: "UPDATE centres_recherche SET est_actif = false WHERE id = $1".to_string(),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    database::execute(&pool, &sql).await?;

    info!(id = %id, "deleted centre");
    Ok(Json(json!({ "message": "Centre supprimé avec succès" })))
}
