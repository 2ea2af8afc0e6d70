use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::{LocationType, UnknownVariant};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: Uuid,
    pub country: String,
    pub city: String,
    pub district: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: LocationType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or updating a location
#[derive(Debug, Clone, Deserialize)]
pub struct LocationDraft {
    pub country: String,
    pub city: String,
    pub district: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: LocationType,
}

#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub id: Uuid,
    pub country: String,
    pub city: String,
    pub district: Option<String>,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LocationRow> for Location {
    type Error = UnknownVariant;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            country: row.country,
            city: row.city,
            district: row.district,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            location_type: row.location_type.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
