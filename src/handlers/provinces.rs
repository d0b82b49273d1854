//! Province reference-data endpoints. Public reads, elevated writes, hard
//! delete: provinces carry no historical references worth preserving.

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
use crate::database::models::province::{
    NewProvince, Province, UpdateProvince, PROVINCE_FROM, PROVINCE_SELECT, PROVINCE_SORTABLE,
};
use crate::database::write::UpdateBuilder;
use crate::error::ApiError;
use crate::filter::{ListResponse, PageParams, QueryBuilder, SortDirection, SqlParam, SqlResult};
use crate::middleware::AuthContext;

use super::IdParam;

#[derive(Debug, Deserialize)]
pub struct ProvinceListQuery {
    pub nom: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /provinces-api - paginated province listing.
pub async fn list(
    ApiQuery(query): ApiQuery<ProvinceListQuery>,
) -> Result<Json<ListResponse<Province>>, ApiError> {
    let page = PageParams::new(query.limit, query.offset);

    let mut qb = QueryBuilder::new();
    qb.contains_opt("pr.nom", query.nom.as_deref())?;
    qb.sort(
        query.sort_by.as_deref(),
        query.sort_dir.as_deref(),
        PROVINCE_SORTABLE,
        ("pr.nom", SortDirection::Asc),
    )?;
    qb.paginate(&page);

    let pool = database::pool().await?;
    let count = database::fetch_count(&pool, &qb.to_count_sql(PROVINCE_FROM)).await?;
    let data: Vec<Province> =
        database::fetch_all_as(&pool, &qb.to_select_sql(PROVINCE_SELECT)).await?;

    info!(count = data.len(), total = count, "listed provinces");
    Ok(Json(ListResponse::new(data, count, &page)))
}

/// GET /provinces-api/:id - single province.
pub async fn get_one(ApiPath(id): ApiPath<Uuid>) -> Result<Json<serde_json::Value>, ApiError> {
    let pool = database::pool().await?;

    let sql = SqlResult {
        query: format!("{} WHERE pr.id = $1", PROVINCE_SELECT),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    let row: Province = database::fetch_optional_as(&pool, &sql)
        .await?
        .ok_or_else(|| ApiError::not_found("Province not found"))?;

    Ok(Json(json!({ "data": row })))
}

/// POST /provinces-api - create a province (admin/moderator).
pub async fn create(
    Extension(ctx): Extension<AuthContext>,
    ApiJson(body): ApiJson<NewProvince>,
) -> Result<impl IntoResponse, ApiError> {
    let user = ctx.require()?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let sql = SqlResult {
        query: "INSERT INTO provinces (nom, code, capitale, population) \
                VALUES ($1, $2, $3, $4) RETURNING *"
            .to_string(),
        params: vec![
            body.nom.into(),
            body.code.into(),
            body.capitale.into(),
            body.population.into(),
        ],
    };
    let row: Province = database::fetch_one_as(&pool, &sql).await?;

    info!(id = %row.id, "created province");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "data": row, "message": "Province créée avec succès" })),
    ))
}

/// PUT /provinces-api?id= - partial update (admin/moderator).
pub async fn update(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<IdParam>,
    ApiJson(body): ApiJson<UpdateProvince>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let id = params.require("Province")?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let mut ub = UpdateBuilder::new("provinces")?;
    ub.set_opt("nom", body.nom)?;
    ub.set_opt("code", body.code)?;
    ub.set_opt("capitale", body.capitale)?;
    ub.set_opt("population", body.population)?;

    if !ub.has_changes() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let row: Province = database::fetch_one_as(&pool, &ub.by_id(id, "*")).await?;

    info!(id = %id, "updated province");
    Ok(Json(
        json!({ "data": row, "message": "Province mise à jour avec succès" }),
    ))
}

/// DELETE /provinces-api?id= - hard delete (admin).
pub async fn remove(
    Extension(ctx): Extension<AuthContext>,
    ApiQuery(params): ApiQuery<IdParam>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = ctx.require()?;
    let id = params.require("Province")?;
    let pool = database::pool().await?;
    roles::require_admin(&pool, user).await?;

    let sql = SqlResult {
        query: "DELETE FROM provinces WHERE id = $1".to_string(),
        params: vec![SqlParam::Uuid(Some(id))],
    };
    database::execute(&pool, &sql).await?;

    info!(id = %id, "deleted province");
    Ok(Json(json!({ "message": "Province supprimée avec succès" })))
}
