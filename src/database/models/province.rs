use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Simple reference entity, no relation expansion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Province {
    pub id: Uuid,
    pub nom: String,
    pub code: Option<String>,
    pub capitale: Option<String>,
    pub population: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub const PROVINCE_SELECT: &str = "SELECT pr.* FROM provinces pr";

pub const PROVINCE_FROM: &str = "provinces pr";

pub const PROVINCE_SORTABLE: &[(&str, &str)] = &[
    ("nom", "pr.nom"),
    ("code", "pr.code"),
    ("population", "pr.population"),
];

#[derive(Debug, Deserialize)]
pub struct NewProvince {
    pub nom: String,
    pub code: Option<String>,
    pub capitale: Option<String>,
    pub population: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProvince {
    pub nom: Option<String>,
    pub code: Option<String>,
    pub capitale: Option<String>,
    pub population: Option<i64>,
}
