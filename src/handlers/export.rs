//! Tabular export endpoint. Reuses each resource's list filters without
//! pagination, flattens the joined rows and serializes to the requested
//! format. Excel is deliberately not rendered server side: the response
//! carries flattened rows plus the filename and the caller performs the
//! spreadsheet conversion.

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::api::ApiJson;
use crate::auth::roles;
use crate::database;
use crate::database::models::centre::{Centre, CENTRE_SELECT};
use crate::database::models::chercheur::{Chercheur, CHERCHEUR_SELECT};
use crate::database::models::province::{Province, PROVINCE_SELECT};
use crate::database::models::publication::{Publication, PUBLICATION_SELECT};
use crate::error::ApiError;
use crate::export::{csv, flatten};
use crate::filter::{QueryBuilder, SortDirection};
use crate::middleware::AuthContext;

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(rename = "type")]
    pub type_: String,
    pub format: Option<String>,
    #[serde(default)]
    pub filters: ExportFilters,
}

/// Union of the per-resource list filters; each export applies the subset
/// relevant to its resource and ignores the rest.
#[derive(Debug, Default, Deserialize)]
pub struct ExportFilters {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub grade: Option<String>,
    pub specialite: Option<String>,
    pub centre_id: Option<Uuid>,
    pub province_id: Option<Uuid>,
    pub annee: Option<i32>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub quartile: Option<String>,
    pub chercheur_id: Option<Uuid>,
}

/// POST /export-data - export a filtered collection (admin/moderator).
pub async fn export(
    Extension(ctx): Extension<AuthContext>,
    ApiJson(body): ApiJson<ExportRequest>,
) -> Result<Response, ApiError> {
    let user = ctx.require()?;
    let pool = database::pool().await?;
    roles::require_admin_or_moderator(&pool, user).await?;

    let rows = fetch_rows(&pool, &body.type_, &body.filters).await?;
    if rows.is_empty() {
        return Err(ApiError::not_found("No data found"));
    }

    let format = body.format.as_deref().unwrap_or("csv");
    let filename = format!("{}_export_{}", body.type_, Utc::now().format("%Y-%m-%d"));

    info!(
        resource = %body.type_,
        format = %format,
        rows = rows.len(),
        "exported data"
    );

    match format {
        "json" => {
            let pretty = serde_json::to_string_pretty(&rows)
                .map_err(|e| ApiError::internal_server_error(e.to_string()))?;
            Ok((
                [
                    (CONTENT_TYPE, "application/json".to_string()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}.json\"", filename),
                    ),
                ],
                pretty,
            )
                .into_response())
        }
        "csv" => {
            let flat: Vec<_> = rows.iter().map(flatten::flatten_row).collect();
            let csv = csv::to_csv(&flat);
            Ok((
                [
                    (CONTENT_TYPE, "text/csv".to_string()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}.csv\"", filename),
                    ),
                ],
                csv,
            )
                .into_response())
        }
        "excel" => {
            let flat: Vec<Value> = rows
                .iter()
                .map(|row| Value::Object(flatten::flatten_row_object(row)))
                .collect();
            Ok((
                StatusCode::OK,
                Json(json!({
                    "data": flat,
                    "filename": filename,
                    "message": "Use a client-side spreadsheet library to convert this data to Excel",
                })),
            )
                .into_response())
        }
        _ => Err(ApiError::bad_request(
            "Invalid format specified. Use: json, csv, or excel",
        )),
    }
}

/// Runs the resource's list query (same defaults and filters, no pagination)
/// and returns the rows as plain JSON values for flattening.
async fn fetch_rows(
    pool: &PgPool,
    resource: &str,
    filters: &ExportFilters,
) -> Result<Vec<Value>, ApiError> {
    match resource {
        "chercheurs" => {
            let mut qb = QueryBuilder::new();
            qb.equals("c.est_actif", true)?;
            qb.contains_opt("c.nom", filters.nom.as_deref())?;
            qb.contains_opt("c.prenom", filters.prenom.as_deref())?;
            qb.contains_opt("c.specialite", filters.specialite.as_deref())?;
            qb.equals_text_opt("c.grade", filters.grade.as_deref())?;
            qb.equals_opt("c.centre_id", filters.centre_id)?;
            qb.equals_opt("c.province_id", filters.province_id)?;
            qb.sort(None, None, &[], ("c.nom", SortDirection::Asc))?;
            let rows: Vec<Chercheur> =
                database::fetch_all_as(pool, &qb.to_select_sql(CHERCHEUR_SELECT)).await?;
            to_values(rows)
        }
        "publications" => {
            let mut qb = QueryBuilder::new();
            qb.equals("p.est_publie", true)?;
            qb.equals_opt("p.annee", filters.annee)?;
            qb.equals_text_opt("p.type", filters.type_.as_deref())?;
            qb.equals_text_opt("p.quartile", filters.quartile.as_deref())?;
            if let Some(chercheur_id) = filters.chercheur_id {
                qb.raw(
                    "p.id IN (SELECT publication_id FROM auteurs_publications WHERE chercheur_id = $?)",
                    vec![chercheur_id.into()],
                );
            }
            qb.sort(None, None, &[], ("p.annee", SortDirection::Desc))?;
            let rows: Vec<Publication> =
                database::fetch_all_as(pool, &qb.to_select_sql(PUBLICATION_SELECT)).await?;
            to_values(rows)
        }
        "centres" => {
            let mut qb = QueryBuilder::new();
            qb.equals("ce.est_actif", true)?;
            qb.contains_opt("ce.nom", filters.nom.as_deref())?;
            qb.equals_opt("ce.province_id", filters.province_id)?;
            qb.sort(None, None, &[], ("ce.nom", SortDirection::Asc))?;
            let rows: Vec<Centre> =
                database::fetch_all_as(pool, &qb.to_select_sql(CENTRE_SELECT)).await?;
            to_values(rows)
        }
        "provinces" => {
            let mut qb = QueryBuilder::new();
            qb.contains_opt("pr.nom", filters.nom.as_deref())?;
            qb.sort(None, None, &[], ("pr.nom", SortDirection::Asc))?;
            let rows: Vec<Province> =
                database::fetch_all_as(pool, &qb.to_select_sql(PROVINCE_SELECT)).await?;
            to_values(rows)
        }
        _ => Err(ApiError::bad_request("Invalid type specified")),
    }
}

fn to_values<T: serde::Serialize>(rows: Vec<T>) -> Result<Vec<Value>, ApiError> {
    rows.into_iter()
        .map(|row| {
            serde_json::to_value(row).map_err(|e| ApiError::internal_server_error(e.to_string()))
        })
        .collect()
}
