//! Client-side catalog filtering.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::facets::{self, Facets};
use super::CatalogItem;

/// Filter constraints. Zero / `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Minimum battery capacity in mAh.
    pub battery_min: u32,
    /// Exact release year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Minimum RAM in GB (any memory configuration may satisfy it).
    pub ram_min: u32,
    /// Case-insensitive prefix of the stock OS descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Minimum wired charging wattage.
    pub charging_speed_min: u32,
    /// Minimum screen diagonal in inches.
    pub screen_size_min: f32,
    /// Minimum main camera megapixels.
    pub camera_mp_min: u32,
}

/// Whether `item` passes the search query and every filter constraint.
pub fn matches(item: &CatalogItem, query: &str, params: &FilterParams) -> bool {
    name_matches(&item.name, query)
        && item.battery >= params.battery_min
        && params
            .year
            .is_none_or(|year| facets::release_year(item) == Some(year))
        && facets::ram_sizes(item).any(|ram| ram >= params.ram_min)
        && params
            .os
            .as_deref()
            .is_none_or(|os| starts_with_ignore_case(&item.stock_os, os))
        && facets::charging_watts(item).unwrap_or(0) >= params.charging_speed_min
        && facets::screen_inches(item).unwrap_or(0.0) >= params.screen_size_min
        && facets::main_camera_mp(item).unwrap_or(0) >= params.camera_mp_min
}

/// Items matching `query` and `params`, in catalog order.
pub fn filter_catalog(
    items: &[CatalogItem],
    query: &str,
    params: &FilterParams,
) -> Vec<CatalogItem> {
    items
        .iter()
        .filter(|item| matches(item, query, params))
        .cloned()
        .collect()
}

fn name_matches(name: &str, query: &str) -> bool {
    query.is_empty() || name.to_lowercase().contains(&query.to_lowercase())
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    let value = value.to_lowercase();
    value.starts_with(&prefix.to_lowercase())
}

/// Memoizing front end over [`filter_catalog`] and [`Facets::derive`].
///
/// Results are keyed by catalog snapshot identity (`Arc` pointer), query and
/// params; facets only by catalog snapshot.
#[derive(Debug, Default)]
pub struct FilterEngine {
    last_filter: Mutex<Option<FilterMemo>>,
    last_facets: Mutex<Option<(Arc<Vec<CatalogItem>>, Arc<Facets>)>>,
}

#[derive(Debug)]
struct FilterMemo {
    catalog: Arc<Vec<CatalogItem>>,
    query: String,
    params: FilterParams,
    result: Arc<Vec<CatalogItem>>,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filtered view of `catalog`, reusing the previous result when the
    /// inputs are unchanged.
    pub fn filter(
        &self,
        catalog: &Arc<Vec<CatalogItem>>,
        query: &str,
        params: &FilterParams,
    ) -> Arc<Vec<CatalogItem>> {
        let mut memo = self
            .last_filter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(m) = memo.as_ref() {
            if Arc::ptr_eq(&m.catalog, catalog) && m.query == query && &m.params == params {
                return Arc::clone(&m.result);
            }
        }

        let result = Arc::new(filter_catalog(catalog, query, params));
        tracing::trace!(
            total = catalog.len(),
            matched = result.len(),
            "Recomputed filtered catalog"
        );
        *memo = Some(FilterMemo {
            catalog: Arc::clone(catalog),
            query: query.to_string(),
            params: params.clone(),
            result: Arc::clone(&result),
        });
        result
    }

    /// Facets for `catalog`, derived once per snapshot.
    pub fn facets(&self, catalog: &Arc<Vec<CatalogItem>>) -> Arc<Facets> {
        let mut memo = self
            .last_facets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some((snapshot, facets)) = memo.as_ref() {
            if Arc::ptr_eq(snapshot, catalog) {
                return Arc::clone(facets);
            }
        }

        let facets = Arc::new(Facets::derive(catalog));
        *memo = Some((Arc::clone(catalog), Arc::clone(&facets)));
        facets
    }
}
