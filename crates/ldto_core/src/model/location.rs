//! Venue hosting a conference.

use crate::model::attributes::{AttributeResult, AttributeStore};
use crate::model::record::Record;

record_columns! {
    /// Columns of the `location` table.
    pub enum LocationColumn in "location" {
        Id => "location_ID",
        Uid => "location_uid",
        Name => "location_name",
        Address => "location_address",
        Lat => "location_lat",
        Lon => "location_lon",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    attributes: AttributeStore<LocationColumn>,
}

impl Record for Location {
    type Column = LocationColumn;

    const ID: LocationColumn = LocationColumn::Id;
    const UID: LocationColumn = LocationColumn::Uid;
    const REQUIRED: &'static [LocationColumn] = &[LocationColumn::Uid, LocationColumn::Name];

    fn normalize(attributes: &mut AttributeStore<LocationColumn>) -> AttributeResult<()> {
        attributes.mark_integers(&[LocationColumn::Id])?;
        attributes.mark_floats(&[LocationColumn::Lat, LocationColumn::Lon])?;
        attributes.mark_remaining_as_text()
    }

    fn from_attributes(attributes: AttributeStore<LocationColumn>) -> Self {
        Self { attributes }
    }

    fn attributes(&self) -> &AttributeStore<LocationColumn> {
        &self.attributes
    }
}

impl Location {
    pub fn location_name(&self) -> AttributeResult<&str> {
        self.attributes.required_text(LocationColumn::Name)
    }

    pub fn location_address(&self) -> Option<&str> {
        self.attributes.text(LocationColumn::Address)
    }

    /// Both coordinates are set.
    pub fn has_geo(&self) -> bool {
        self.geo().is_some()
    }

    /// `(lat, lon)` when both are set.
    pub fn geo(&self) -> Option<(f64, f64)> {
        let lat = self.attributes.float(LocationColumn::Lat)?;
        let lon = self.attributes.float(LocationColumn::Lon)?;
        Some((lat, lon))
    }
}
