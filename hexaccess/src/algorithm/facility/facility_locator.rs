use crate::{input::Reprojection, model::AccessError};
use geo::{BoundingRect, Intersects, Point};
use hexaccess_core::model::{Crs, District, DistrictId, Facility, FacilityId};
use rstar::{
    primitives::{GeomWithData, Rectangle},
    RTree,
};
use std::collections::HashSet;

type DistrictEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// facilities whose location lies inside the district boundary, the
/// boundary itself included. facility coordinates are reprojected to the
/// district CRS when the district is not in WGS84. an empty result is a
/// valid outcome.
pub fn filter(facilities: &[Facility], district: &District) -> Result<Vec<Facility>, AccessError> {
    let reprojection = match &district.crs {
        Crs::Wgs84 => None,
        Crs::Proj4 { definition } => Some(Reprojection::from_wgs84(definition)?),
    };
    let mut result = vec![];
    for facility in facilities.iter() {
        let location = match &reprojection {
            None => facility.location,
            Some(r) => Point::from(r.transform_coord(facility.location.into())?),
        };
        if district.boundary.intersects(&location) {
            result.push(facility.clone());
        }
    }
    result.sort_by_key(|f| f.id);
    Ok(result)
}

/// assigns every facility to at most one district of a run.
///
/// a facility on a shared border, or inside overlapping districts, belongs
/// to the district with the lowest id. facilities outside every district
/// are dropped with a warning.
pub struct FacilityLocator {
    facilities: Vec<Facility>,
    districts: Vec<District>,
    index: RTree<DistrictEnvelope>,
    /// positions in `districts` that cannot be indexed in WGS84. the
    /// district readers always emit WGS84, so only districts built by
    /// library callers land here.
    unindexed: Vec<usize>,
}

impl FacilityLocator {
    pub fn new(facilities: &[Facility], districts: &[District]) -> FacilityLocator {
        let mut envelopes = vec![];
        let mut unindexed = vec![];
        for (idx, district) in districts.iter().enumerate() {
            match (&district.crs, district.boundary.bounding_rect()) {
                (Crs::Wgs84, Some(rect)) => envelopes.push(GeomWithData::new(
                    Rectangle::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    idx,
                )),
                (Crs::Wgs84, None) => {}
                (Crs::Proj4 { .. }, _) => unindexed.push(idx),
            }
        }
        FacilityLocator {
            facilities: facilities.to_vec(),
            districts: districts.to_vec(),
            index: RTree::bulk_load(envelopes),
            unindexed,
        }
    }

    /// the facilities belonging to `district`, in id order.
    pub fn locate(&self, district: &District) -> Result<Vec<Facility>, AccessError> {
        let inside = filter(&self.facilities, district)?;
        let mut owned = vec![];
        for facility in inside.into_iter() {
            match self.owner(&facility) {
                Some(owner) if owner == &district.id => owned.push(facility),
                Some(owner) => log::debug!(
                    "facility {} on the border of district {} belongs to district {owner}",
                    facility.id,
                    district.id
                ),
                None => owned.push(facility),
            }
        }
        Ok(owned)
    }

    /// facilities that lie outside every district. logs one warning per facility.
    pub fn unlocated(&self) -> Vec<FacilityId> {
        let mut dropped = vec![];
        for facility in self.facilities.iter() {
            if self.owner(facility).is_none() {
                log::warn!(
                    "facility {} '{}' at ({}, {}) lies outside every district and is dropped",
                    facility.id,
                    facility.name,
                    facility.lat(),
                    facility.lon()
                );
                dropped.push(facility.id);
            }
        }
        dropped
    }

    /// the lowest district id whose boundary holds the facility. a district
    /// whose CRS cannot be reached from WGS84 is never an owner.
    fn owner(&self, facility: &Facility) -> Option<&DistrictId> {
        let location = [facility.lon(), facility.lat()];
        let candidates = self
            .index
            .locate_all_at_point(&location)
            .map(|e| e.data)
            .chain(self.unindexed.iter().copied())
            .collect::<HashSet<_>>();
        let mut owner: Option<&DistrictId> = None;
        for idx in candidates {
            let district = &self.districts[idx];
            if owner.is_some_and(|o| o <= &district.id) {
                continue;
            }
            match filter(std::slice::from_ref(facility), district) {
                Ok(inside) if !inside.is_empty() => owner = Some(&district.id),
                Ok(_) => {}
                Err(e) => log::warn!(
                    "district {} skipped while locating facility {}: {e}",
                    district.id,
                    facility.id
                ),
            }
        }
        owner
    }
}
