use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::database::models::{Location, LocationDraft};
use crate::database::repository::LocationRepository;
use crate::database::DatabaseError;
use crate::types::LocationType;

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location not found: {0}")]
    LocationNotFound(Uuid),
    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

pub struct LocationService {
    locations: Arc<dyn LocationRepository>,
}

impl LocationService {
    pub fn new(locations: Arc<dyn LocationRepository>) -> Self {
        Self { locations }
    }

    pub async fn create(&self, draft: LocationDraft) -> Result<Location, LocationError> {
        info!(
            "Location creation requested: country={}, city={}, district={:?}",
            draft.country, draft.city, draft.district
        );
        let draft = validate(draft)?;
        let location = self.locations.create(draft).await?;
        info!("Location created: location_id={}", location.id);
        Ok(location)
    }

    pub async fn get(&self, id: Uuid) -> Result<Location, LocationError> {
        info!("Location lookup: location_id={}", id);
        self.locations.find_by_id(id).await?.ok_or_else(|| {
            error!("Location lookup failed: location_id={}", id);
            LocationError::LocationNotFound(id)
        })
    }

    /// All locations, or only those of one type
    pub async fn list(&self, location_type: Option<LocationType>) -> Result<Vec<Location>, LocationError> {
        let locations = match location_type {
            Some(location_type) => self.locations.find_by_type(location_type).await?,
            None => self.locations.find_all().await?,
        };
        info!("Locations listed: type={:?}, count={}", location_type, locations.len());
        Ok(locations)
    }

    /// Country is kept from creation; every other field is replaced
    pub async fn update(&self, id: Uuid, draft: LocationDraft) -> Result<Location, LocationError> {
        info!("Location update requested: location_id={}", id);
        let draft = validate(draft)?;
        let location = self.locations.update(id, draft).await?.ok_or_else(|| {
            error!("Location update failed: location_id={} does not exist", id);
            LocationError::LocationNotFound(id)
        })?;
        info!("Location updated: location_id={}", id);
        Ok(location)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), LocationError> {
        info!("Location delete requested: location_id={}", id);
        if !self.locations.delete(id).await? {
            error!("Location delete failed: location_id={} does not exist", id);
            return Err(LocationError::LocationNotFound(id));
        }
        info!("Location deleted: location_id={}", id);
        Ok(())
    }
}

fn validate(mut draft: LocationDraft) -> Result<LocationDraft, LocationError> {
    fn required(field: &'static str, value: &mut String) -> Result<(), LocationError> {
        *value = value.trim().to_string();
        if value.is_empty() {
            return Err(LocationError::Validation { field, message: "must not be blank".to_string() });
        }
        Ok(())
    }

    required("country", &mut draft.country)?;
    required("city", &mut draft.city)?;
    required("address", &mut draft.address)?;
    draft.district = draft.district.map(|d| d.trim().to_string()).filter(|d| !d.is_empty());

    if !(-90.0..=90.0).contains(&draft.latitude) {
        return Err(LocationError::Validation {
            field: "latitude",
            message: "must be between -90 and 90".to_string(),
        });
    }
    if !(-180.0..=180.0).contains(&draft.longitude) {
        return Err(LocationError::Validation {
            field: "longitude",
            message: "must be between -180 and 180".to_string(),
        });
    }

    Ok(draft)
}
