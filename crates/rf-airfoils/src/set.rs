//! Collection of airfoil polars keyed by `AirfoilId`.

use crate::error::{PolarError, PolarResult};
use crate::polar::AirfoilPolar;
use rf_core::AirfoilId;

/// Registry of airfoil polars.
///
/// Ids are handed out in insertion order, so a geometry built against a set stays valid
/// as long as polars are inserted in the same order.
#[derive(Default)]
pub struct PolarSet {
    polars: Vec<Box<dyn AirfoilPolar>>,
}

impl PolarSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a polar and return its id.
    pub fn insert(&mut self, polar: Box<dyn AirfoilPolar>) -> AirfoilId {
        let id = AirfoilId::from_index(self.polars.len() as u32);
        self.polars.push(polar);
        id
    }

    /// Look up a polar by id.
    pub fn get(&self, id: AirfoilId) -> PolarResult<&dyn AirfoilPolar> {
        self.polars
            .get(id.index() as usize)
            .map(|p| &**p)
            .ok_or(PolarError::UnknownAirfoil {
                id,
                len: self.polars.len(),
            })
    }

    /// Find the id of the first polar with the given name.
    pub fn id_by_name(&self, name: &str) -> Option<AirfoilId> {
        self.polars
            .iter()
            .position(|p| p.name() == name)
            .map(|i| AirfoilId::from_index(i as u32))
    }

    pub fn contains(&self, id: AirfoilId) -> bool {
        (id.index() as usize) < self.polars.len()
    }

    pub fn len(&self) -> usize {
        self.polars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polars.is_empty()
    }

    /// Iterate `(id, polar)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (AirfoilId, &dyn AirfoilPolar)> {
        self.polars
            .iter()
            .enumerate()
            .map(|(i, p)| (AirfoilId::from_index(i as u32), &**p))
    }
}

impl std::fmt::Debug for PolarSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.polars.iter().map(|p| p.name()))
            .finish()
    }
}
