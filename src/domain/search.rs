// src/domain/search.rs

use crate::domain::property::{ListingType, Property, PropertyStatus, PropertyType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Search, sort and paging parameters. Every field is optional; unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub status: Option<PropertyStatus>,
    /// Free text over title, description and location.
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_area: Option<u32>,
    pub max_area: Option<u32>,
    pub property_type: Option<PropertyType>,
    pub listing_type: Option<ListingType>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub amenities: Vec<String>,
    pub owner_id: Option<i64>,
    /// Bypass the listing cache.
    pub refresh: bool,
}

/// One page of filtered listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPage {
    pub content: Vec<Property>,
    pub total_elements: usize,
    pub total_pages: usize,
    pub size: usize,
    pub number: usize,
}

impl PropertyPage {
    pub fn empty(params: &SearchParams) -> Self {
        PropertyPage {
            content: Vec::new(),
            total_elements: 0,
            total_pages: 0,
            size: params.page_size(),
            number: params.page_index(),
        }
    }
}

impl SearchParams {
    pub fn page_size(&self) -> usize {
        self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn page_index(&self) -> usize {
        self.page.unwrap_or(0)
    }

    /// Build from decoded query pairs. Empty values count as unset; `sort` is accepted as
    /// an alias of `sortBy`, `amenities` is comma separated.
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self, String> {
        let get = |key: &str| query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        fn parse<T: std::str::FromStr>(key: &str, raw: Option<&str>) -> Result<Option<T>, String> {
            raw.map(|v| v.parse::<T>().map_err(|_| format!("invalid value for `{key}`: {v}")))
                .transpose()
        }

        let sort_order = match get("sortOrder") {
            None => None,
            Some(v) if v.eq_ignore_ascii_case("asc") => Some(SortOrder::Asc),
            Some(v) if v.eq_ignore_ascii_case("desc") => Some(SortOrder::Desc),
            Some(v) => return Err(format!("invalid value for `sortOrder`: {v}")),
        };

        Ok(SearchParams {
            page: parse("page", get("page"))?,
            limit: parse("limit", get("limit"))?,
            sort_by: get("sortBy").or_else(|| get("sort")).map(str::to_string),
            sort_order,
            status: parse("status", get("status"))?,
            search: get("search").map(str::to_string),
            min_price: parse("minPrice", get("minPrice"))?,
            max_price: parse("maxPrice", get("maxPrice"))?,
            min_area: parse("minArea", get("minArea"))?,
            max_area: parse("maxArea", get("maxArea"))?,
            property_type: parse("propertyType", get("propertyType"))?,
            listing_type: parse("listingType", get("listingType"))?,
            location: get("location").map(str::to_string),
            city: get("city").map(str::to_string),
            state: get("state").map(str::to_string),
            bedrooms: parse("bedrooms", get("bedrooms"))?,
            bathrooms: parse("bathrooms", get("bathrooms"))?,
            amenities: get("amenities")
                .map(|v| {
                    v.split(',')
                        .map(|a| a.trim().to_string())
                        .filter(|a| !a.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            owner_id: parse("ownerId", get("ownerId"))?,
            refresh: get("refresh").is_some_and(|v| !matches!(v, "false" | "0")),
        })
    }

    /// Query parameters the backend's filtering endpoints understand. The backend may
    /// ignore any of them; results are always re-filtered locally. Paging is local too, so
    /// `page` and `limit` are never sent.
    pub fn to_server_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| query.push((key.to_string(), value));

        if let Some(status) = self.status {
            push("status", status.as_str().to_string());
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            push("searchTerm", term.to_string());
        }
        if let Some(listing_type) = self.listing_type {
            push("listingType", listing_type.as_str().to_string());
        }
        if let Some(property_type) = self.property_type {
            push("propertyType", property_type.as_str().to_string());
        }
        if let Some(min) = self.min_price.filter(|p| *p > 0.0) {
            push("minPrice", min.to_string());
        }
        if let Some(max) = self.max_price.filter(|p| *p > 0.0) {
            push("maxPrice", max.to_string());
        }
        if let Some(bedrooms) = self.bedrooms.filter(|b| *b > 0) {
            push("bedrooms", bedrooms.to_string());
        }
        if let Some(bathrooms) = self.bathrooms.filter(|b| *b > 0) {
            push("bathrooms", bathrooms.to_string());
        }
        if let Some(min) = self.min_area.filter(|a| *a > 0) {
            push("minArea", min.to_string());
        }
        if let Some(max) = self.max_area.filter(|a| *a > 0) {
            push("maxArea", max.to_string());
        }

        query
    }

    /// True when a property satisfies every set predicate.
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(min) = self.min_price {
            if property.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if property.price > max {
                return false;
            }
        }
        if let Some(property_type) = self.property_type {
            if property.property_type != property_type {
                return false;
            }
        }
        if let Some(listing_type) = self.listing_type {
            if property.listing_type != listing_type {
                return false;
            }
        }
        if let Some(status) = self.status {
            if property.status != status {
                return false;
            }
        }
        if let Some(bedrooms) = self.bedrooms {
            if property.bedrooms < bedrooms {
                return false;
            }
        }
        if let Some(bathrooms) = self.bathrooms {
            if property.bathrooms < bathrooms {
                return false;
            }
        }
        if let Some(min) = self.min_area {
            if property.area < min {
                return false;
            }
        }
        if let Some(max) = self.max_area {
            if property.area > max {
                return false;
            }
        }
        if let Some(owner_id) = self.owner_id {
            if property.owner_id != Some(owner_id) {
                return false;
            }
        }
        if let Some(term) = non_blank(&self.search) {
            let haystack = [property.title.as_str(), property.description.as_str()];
            let hit = haystack
                .iter()
                .chain(property.location_fields().iter())
                .any(|field| contains_ci(field, term));
            if !hit {
                return false;
            }
        }
        if let Some(term) = non_blank(&self.location) {
            if !property
                .location_fields()
                .iter()
                .any(|field| contains_ci(field, term))
            {
                return false;
            }
        }
        if let Some(city) = non_blank(&self.city) {
            if !contains_ci(&property.city, city) {
                return false;
            }
        }
        if let Some(state) = non_blank(&self.state) {
            if !contains_ci(&property.state, state) {
                return false;
            }
        }
        self.amenities.iter().all(|wanted| {
            property
                .amenities
                .iter()
                .any(|have| contains_ci(have, wanted))
        })
    }
}

/// Conjunction of every predicate in `params`, then the requested sort.
///
/// Pure and idempotent: filtering the output again with the same params returns it unchanged.
pub fn filter_properties(properties: &[Property], params: &SearchParams) -> Vec<Property> {
    let mut filtered: Vec<Property> = properties
        .iter()
        .filter(|p| params.matches(p))
        .cloned()
        .collect();

    if let Some(sort_by) = params.sort_by.as_deref() {
        sort_properties(&mut filtered, sort_by, params.sort_order.unwrap_or_default());
    }

    filtered
}

/// Slice one page out of an already filtered set.
pub fn paginate(filtered: Vec<Property>, params: &SearchParams) -> PropertyPage {
    let size = params.page_size();
    let number = params.page_index();
    let total_elements = filtered.len();
    let total_pages = total_elements.div_ceil(size);

    let content = filtered
        .into_iter()
        .skip(number.saturating_mul(size))
        .take(size)
        .collect();

    PropertyPage {
        content,
        total_elements,
        total_pages,
        size,
        number,
    }
}

/// Stable sort; missing timestamps always go last.
fn sort_properties(properties: &mut [Property], sort_by: &str, order: SortOrder) {
    const KNOWN: [&str; 8] = [
        "price",
        "bedrooms",
        "bathrooms",
        "area",
        "squareFeet",
        "title",
        "createdAt",
        "updatedAt",
    ];
    if !KNOWN.contains(&sort_by) {
        tracing::debug!(sort_by, "Ignoring unknown sort field");
        return;
    }

    properties.sort_by(|a, b| {
        let (ordering, missing) = compare_field(a, b, sort_by);
        if missing {
            return ordering;
        }
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Returns the ordering and whether it was decided by a missing value, which ignores direction.
fn compare_field(a: &Property, b: &Property, sort_by: &str) -> (Ordering, bool) {
    let by_present = |x: Option<DateTime<Utc>>, y: Option<DateTime<Utc>>| match (x, y) {
        (Some(x), Some(y)) => (x.cmp(&y), false),
        (None, Some(_)) => (Ordering::Greater, true),
        (Some(_), None) => (Ordering::Less, true),
        (None, None) => (Ordering::Equal, true),
    };

    match sort_by {
        "price" => (
            a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
            false,
        ),
        "bedrooms" => (a.bedrooms.cmp(&b.bedrooms), false),
        "bathrooms" => (a.bathrooms.cmp(&b.bathrooms), false),
        "area" | "squareFeet" => (a.area.cmp(&b.area), false),
        "title" => (
            a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            false,
        ),
        "createdAt" => by_present(a.created_at, b.created_at),
        "updatedAt" => by_present(a.updated_at, b.updated_at),
        _ => (Ordering::Equal, false),
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
