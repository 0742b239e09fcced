//! Types for the phone catalog.

use serde::{Deserialize, Serialize};

/// A phone in the catalog.
///
/// Descriptor fields are loosely typed strings as they come from the
/// catalog collection; numeric facets are parsed out of them on demand
/// (see [`super::facets`]).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    /// Unique item id.
    pub id: String,
    /// Display name (e.g. "Pixel 8 Pro").
    pub name: String,
    /// Image URLs.
    #[serde(alias = "image")]
    pub images: Vec<String>,
    /// Release date descriptor (e.g. "Released, 2023/05").
    pub date: String,
    /// Memory configurations as "RAM/storage" (e.g. "8/128").
    pub memory: Vec<String>,
    /// Processor name.
    pub soc: String,
    /// Battery capacity in mAh.
    pub battery: u32,
    /// Charging descriptors; the first one carries the wired wattage.
    pub charge: Vec<String>,
    /// Display descriptors; the second one carries the diagonal.
    pub display: Vec<String>,
    /// Front camera descriptor.
    #[serde(alias = "frontCamera")]
    pub front_camera: String,
    /// Main camera descriptors; the first one carries the megapixels.
    #[serde(alias = "mainCamera")]
    pub main_camera: Vec<String>,
    /// Stock OS descriptor (e.g. "Android 14, One UI 6").
    #[serde(alias = "stockOS")]
    pub stock_os: String,
}
