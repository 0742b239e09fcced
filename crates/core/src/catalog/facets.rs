//! Facet extraction from loosely typed catalog descriptors.
//!
//! Every extractor returns `None` when the descriptor does not follow the
//! expected pattern. Callers either drop the value (facet derivation) or
//! treat it as 0 (minimum comparisons).

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::CatalogItem;

static YEAR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("year pattern is valid"));
static WATTS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)W").expect("watts pattern is valid"));
static INCHES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\d.]+)\s*inches").expect("inches pattern is valid"));
static MEGAPIXELS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*MP").expect("megapixels pattern is valid"));

/// Release year: the last standalone four-digit number of the date descriptor.
pub fn release_year(item: &CatalogItem) -> Option<u32> {
    YEAR_REGEX
        .captures_iter(&item.date)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// RAM in GB for each memory configuration that parses ("8/128" -> 8).
pub fn ram_sizes(item: &CatalogItem) -> impl Iterator<Item = u32> + '_ {
    item.memory.iter().filter_map(|config| {
        config
            .split('/')
            .next()
            .and_then(|ram| ram.trim().parse().ok())
    })
}

/// OS name: first comma-separated token of the stock OS descriptor.
pub fn os_name(item: &CatalogItem) -> Option<&str> {
    item.stock_os
        .split(',')
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Wired charging wattage from the first charge descriptor.
pub fn charging_watts(item: &CatalogItem) -> Option<u32> {
    capture_first(&WATTS_REGEX, item.charge.first()?)
}

/// Screen diagonal in inches from the second display descriptor.
pub fn screen_inches(item: &CatalogItem) -> Option<f32> {
    capture_first(&INCHES_REGEX, item.display.get(1)?)
}

/// Main camera resolution from the first main camera descriptor.
pub fn main_camera_mp(item: &CatalogItem) -> Option<u32> {
    capture_first(&MEGAPIXELS_REGEX, item.main_camera.first()?)
}

fn capture_first<T: std::str::FromStr>(regex: &Regex, haystack: &str) -> Option<T> {
    regex
        .captures(haystack)?
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
}

/// Candidate values for each filter, derived from the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    /// Release years, newest first.
    pub years: Vec<u32>,
    /// RAM sizes in GB, ascending.
    pub ram_sizes: Vec<u32>,
    /// OS names, ascending.
    pub os_names: Vec<String>,
    /// Charging wattages, ascending.
    pub charging_speeds: Vec<u32>,
    /// Screen sizes in inches, ascending.
    pub screen_sizes: Vec<f32>,
    /// Main camera megapixels, ascending.
    pub camera_mps: Vec<u32>,
}

impl Facets {
    /// Derive facets from a catalog. Each facet is computed independently.
    pub fn derive(items: &[CatalogItem]) -> Self {
        let mut years: Vec<u32> = items.iter().filter_map(release_year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();

        let mut screen_sizes: Vec<f32> = items.iter().filter_map(screen_inches).collect();
        screen_sizes.sort_by(|a, b| a.total_cmp(b));
        screen_sizes.dedup();

        Self {
            years,
            ram_sizes: sorted_unique(items.iter().flat_map(ram_sizes)),
            os_names: sorted_unique(items.iter().filter_map(os_name).map(String::from)),
            charging_speeds: sorted_unique(items.iter().filter_map(charging_watts)),
            screen_sizes,
            camera_mps: sorted_unique(items.iter().filter_map(main_camera_mp)),
        }
    }
}

fn sorted_unique<T: Ord>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut values: Vec<T> = values.collect();
    values.sort_unstable();
    values.dedup();
    values
}
