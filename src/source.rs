//! External POI and logo source pipeline.
//!
//! The network lives behind the [`PoiSource`] and [`LogoResolver`] traits;
//! this module owns the policy around them: bounded retries with linear
//! backoff, duplicate limiting, popularity scoring, and brand-diverse
//! selection. A category whose retries are exhausted degrades to an empty
//! collection instead of failing the whole analysis.

use std::collections::HashMap;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::{GeoPoint, Poi, PoiMapError, Result};

/// Brands that score an exact-match bonus. Recognizable logos carry a map
/// better than obscure ones.
const FAMOUS_BRANDS: &[&str] = &[
    "mcdonald's",
    "starbucks",
    "subway",
    "burger king",
    "walmart",
    "kfc",
    "7-eleven",
    "dunkin'",
    "target",
    "taco bell",
    "wendy's",
    "pizza hut",
    "domino's",
    "chick-fil-a",
    "chipotle",
    "costco",
    "walgreens",
    "cvs",
    "home depot",
    "shell",
];

/// A raw point record from the upstream provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiRecord {
    pub id: u64,
    pub name: String,
    pub geo: GeoPoint,
    /// Provider lists a website for this place
    #[serde(default)]
    pub has_website: bool,
    /// Provider tagged this place with a brand
    #[serde(default)]
    pub has_brand_tag: bool,
}

/// Provider of raw point records for a category around a center.
pub trait PoiSource {
    fn fetch(&mut self, center: &GeoPoint, radius_meters: f64, category: &str)
        -> Result<Vec<PoiRecord>>;
}

/// Resolves a record to a logo image URL, when one exists.
pub trait LogoResolver {
    fn resolve(&mut self, record: &PoiRecord) -> Option<String>;
}

/// Tuning for the fetch pipeline.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Target number of POIs per category. Default: 10
    pub desired_per_category: usize,

    /// Search radius around the site, in meters. Default: 1500.0
    pub radius_meters: f64,

    /// Attempts per provider request. Default: 3
    pub retry_attempts: u32,

    /// Base delay between attempts; the n-th retry waits n times this.
    /// Default: 500 ms
    pub retry_base_delay: Duration,

    /// Courtesy pause between category fetches. Default: 300 ms
    pub category_delay: Duration,

    /// Hard cap of POIs sharing one normalized name. Default: 3
    pub max_per_brand: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            desired_per_category: 10,
            radius_meters: 1500.0,
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
            category_delay: Duration::from_millis(300),
            max_per_brand: 3,
        }
    }
}

/// Run an operation with bounded retries and linearly growing backoff.
///
/// The delay hook receives the pause before each retry, so hosts can
/// sleep, tick a virtual clock, or ignore it.
pub fn fetch_with_retry<T, F>(
    request: &str,
    attempts: u32,
    base_delay: Duration,
    delay: &mut dyn FnMut(Duration),
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut last_message = String::new();

    for attempt in 0..attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("Request '{request}' attempt {} failed: {e}", attempt + 1);
                last_message = e.to_string();
                if attempt + 1 < attempts {
                    delay(base_delay * (attempt + 1));
                }
            }
        }
    }

    Err(PoiMapError::SourceExhausted {
        request: request.to_string(),
        attempts,
        message: last_message,
    })
}

/// Lowercased alphanumeric form of a name, for duplicate detection.
/// Case, spacing, and punctuation collapse ("Joe's Diner" becomes
/// "joesdiner"); digits stay significant, so "Starbucks #1204" keeps
/// its store number.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Drop records beyond the per-brand cap, keeping provider order.
pub fn limit_duplicates(records: Vec<PoiRecord>, max_per_brand: usize) -> Vec<PoiRecord> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    records
        .into_iter()
        .filter(|record| {
            let count = counts.entry(normalize_name(&record.name)).or_insert(0);
            *count += 1;
            *count <= max_per_brand
        })
        .collect()
}

/// Score how recognizable a record is on the map.
///
/// `sibling_count` is how many other records share its normalized name.
pub fn popularity_score(record: &PoiRecord, sibling_count: usize) -> i32 {
    let mut score = 0;

    let lower = record.name.to_lowercase();
    if FAMOUS_BRANDS.contains(&lower.as_str()) {
        score += 100;
    }
    if record.has_website {
        score += 30;
    }
    if record.has_brand_tag {
        score += 40;
    }

    // Chains repeat; repetition is itself a popularity signal
    score += ((sibling_count as i32) * 10).min(50);

    let len = record.name.chars().count();
    if len < 15 {
        score += 20;
    } else if len < 25 {
        score += 10;
    }
    if !record.name.chars().any(|c| c.is_ascii_digit()) {
        score += 10;
    }

    score
}

/// Pick a brand-diverse subset of `desired` records.
///
/// Records are ranked by popularity. The priority list takes the first
/// instance of each brand, up to `desired + 5` entries; second and third
/// instances are only drawn on when the priority list alone cannot fill
/// the quota. No brand ever exceeds the per-brand cap.
pub fn select_brand_diverse(
    records: &[PoiRecord],
    desired: usize,
    max_per_brand: usize,
) -> Vec<PoiRecord> {
    let mut sibling_counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *sibling_counts.entry(normalize_name(&record.name)).or_insert(0) += 1;
    }

    let mut ranked: Vec<(i32, usize)> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let siblings = sibling_counts[&normalize_name(&record.name)] - 1;
            (popularity_score(record, siblings), i)
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut priority: Vec<usize> = Vec::new();
    let mut duplicates: Vec<usize> = Vec::new();

    for (_, idx) in &ranked {
        let brand = normalize_name(&records[*idx].name);
        let count = seen.entry(brand).or_insert(0);
        *count += 1;
        if *count == 1 && priority.len() < desired + 5 {
            priority.push(*idx);
        } else if *count <= max_per_brand {
            duplicates.push(*idx);
        }
    }

    let mut taken: HashMap<String, usize> = HashMap::new();
    let mut selected: Vec<usize> = Vec::new();

    for idx in priority.into_iter().chain(duplicates) {
        if selected.len() >= desired {
            break;
        }
        let brand = normalize_name(&records[idx].name);
        let count = taken.entry(brand).or_insert(0);
        if *count >= max_per_brand {
            continue;
        }
        *count += 1;
        selected.push(idx);
    }

    selected.sort_unstable();
    selected.into_iter().map(|i| records[i].clone()).collect()
}

/// Sequential fetch plan over a list of categories.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub categories: Vec<String>,
    pub config: SourceConfig,
}

impl FetchPlan {
    pub fn new(categories: Vec<String>, config: SourceConfig) -> Self {
        Self { categories, config }
    }

    /// Fetch every category in order, building finished [`Poi`] lists
    /// sorted by distance from the site. A category that exhausts its
    /// retries comes back empty.
    pub fn execute(
        &self,
        source: &mut dyn PoiSource,
        logos: &mut dyn LogoResolver,
        site: &GeoPoint,
        delay: &mut dyn FnMut(Duration),
    ) -> Vec<(String, Vec<Poi>)> {
        let mut result = Vec::new();

        for (i, category) in self.categories.iter().enumerate() {
            if i > 0 {
                delay(self.config.category_delay);
            }

            let records = match fetch_with_retry(
                category,
                self.config.retry_attempts,
                self.config.retry_base_delay,
                delay,
                || source.fetch(site, self.config.radius_meters, category),
            ) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Category '{category}' degraded to empty: {e}");
                    result.push((category.clone(), Vec::new()));
                    continue;
                }
            };

            let limited = limit_duplicates(records, self.config.max_per_brand);
            let selected = select_brand_diverse(
                &limited,
                self.config.desired_per_category,
                self.config.max_per_brand,
            );

            let mut pois: Vec<Poi> = selected
                .into_iter()
                .map(|record| {
                    let mut poi = Poi::new(record.id, &record.name, record.geo, category);
                    poi.distance_meters = haversine_distance(site, &record.geo);
                    poi.logo_url = logos.resolve(&record);
                    poi
                })
                .collect();
            pois.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));

            result.push((category.clone(), pois));
        }

        result
    }
}
