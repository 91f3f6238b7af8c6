//! Dimension extraction shared by the metric modules.
//!
//! Years and crop keys are derived from the filtered rows of each call;
//! only the cropping-intensity categories are a fixed enumeration.

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Crop categories used by the cropping-intensity tables.
pub static CROP_CATEGORIES: Lazy<BTreeMap<u8, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        (1, "Double Crop Kharif/Rabi"),
        (2, "Double Crop Rabi/Zaid"),
        (3, "Triple Crop"),
        (4, "Perennial Crops"),
        (5, "Kharif Crop"),
        (6, "Rabi Crop"),
        (7, "Double Crop Kharif/Zaid"),
        (8, "Zaid Crop"),
    ])
});

pub const CATEGORY_COUNT: usize = 8;

pub fn is_crop_category(id: u8) -> bool {
    CROP_CATEGORIES.contains_key(&id)
}

/// Ascending distinct years.
pub fn distinct_years<I>(years: I) -> Vec<i32>
where
    I: IntoIterator<Item = i32>,
{
    years
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct crop keys in the order they first appear.
pub fn crops_first_seen<'a, I>(crops: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for c in crops {
        if seen.insert(c) {
            out.push(c.to_string());
        }
    }
    out
}

/// Distinct crop keys in ascending order.
pub fn crops_sorted<'a, I>(crops: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    crops
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// First crop id present, in row order.
pub fn first_crop_id<I>(ids: I) -> Option<u8>
where
    I: IntoIterator<Item = Option<u8>>,
{
    ids.into_iter().flatten().next()
}
