//! Filter/search projection over the catalog list.
//!
//! Pure: visibility is recomputed from (catalog, filters) on every keystroke
//! and every catalog replacement, and nothing here mutates either. The UI
//! dims non-matching rows rather than removing them so the list keeps its
//! shape (and scroll position) while the user types.

use crate::model::types::{Catalog, Entity};

/// Substring filters over the entity list. All empty means unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    /// Case-insensitive substring on entity name.
    pub name_query: String,
    /// Substring on the latest frame's date.
    pub date_query: String,
    /// Substring on the latest frame's time.
    pub time_query: String,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.name_query.trim().is_empty()
            && self.date_query.trim().is_empty()
            && self.time_query.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.name_query.clear();
        self.date_query.clear();
        self.time_query.clear();
    }

    /// Conjunction across the non-empty filters.
    pub fn matches(&self, entity: &Entity) -> bool {
        let name_q = self.name_query.trim().to_lowercase();
        let date_q = self.date_query.trim();
        let time_q = self.time_query.trim();
        let latest = entity.latest();

        let match_name = name_q.is_empty() || entity.name.to_lowercase().contains(&name_q);
        let match_date = date_q.is_empty() || latest.date.contains(date_q);
        let match_time = time_q.is_empty() || latest.time.contains(time_q);
        match_name && match_date && match_time
    }
}

/// One catalog row with its computed visibility.
#[derive(Debug, Clone, Copy)]
pub struct Projected<'a> {
    pub entity: &'a Entity,
    pub visible: bool,
}

/// Derive the visible subset of the catalog. With no filters everything is
/// visible; otherwise a row is visible iff it matches all non-empty filters.
pub fn project<'a>(catalog: &'a Catalog, filters: &Filters) -> Vec<Projected<'a>> {
    let unfiltered = filters.is_empty();
    catalog
        .entities
        .iter()
        .map(|entity| Projected {
            entity,
            visible: unfiltered || filters.matches(entity),
        })
        .collect()
}
