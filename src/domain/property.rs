// src/domain/property.rs

use crate::api::models::{ListingPayload, RawListing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Shown when a listing arrives without any image.
pub const PLACEHOLDER_IMAGE: &str = "assets/images/prpty.jpg";

const DEFAULT_OWNER_NAME: &str = "Property Owner";

// Canonical uppercase token enums. Parsing trims and ignores case; serialization always
// writes the canonical token.
macro_rules! token_enum {
    ($name:ident, default = $default:ident, { $($variant:ident => $token:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }

            pub fn parse_token(raw: &str) -> Option<Self> {
                match raw.trim().to_uppercase().as_str() {
                    $($token => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Coerce a raw backend value, logging and defaulting anything unrecognized.
            fn coerce(field: &'static str, raw: Option<&Value>) -> Self {
                match raw {
                    None => $name::$default,
                    Some(Value::String(s)) => Self::parse_token(s).unwrap_or_else(|| {
                        tracing::warn!(field, value = %s, "Unknown value, using default");
                        $name::$default
                    }),
                    Some(other) => {
                        tracing::warn!(field, value = %other, "Value is not a string, using default");
                        $name::$default
                    }
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_token(s)
                    .ok_or_else(|| format!("unknown {} `{}`", stringify!($name), s.trim()))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

token_enum!(PropertyType, default = House, {
    House => "HOUSE",
    Apartment => "APARTMENT",
    Condo => "CONDO",
    Townhouse => "TOWNHOUSE",
    Land => "LAND",
    Commercial => "COMMERCIAL",
    Other => "OTHER",
});

token_enum!(ListingType, default = Sale, {
    Sale => "SALE",
    Rent => "RENT",
});

token_enum!(PropertyStatus, default = Active, {
    Active => "ACTIVE",
    Pending => "PENDING",
    Sold => "SOLD",
    Deleted => "DELETED",
});

/// A listing in the one shape every consumer of this service sees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Property {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    /// Square feet.
    pub area: u32,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub status: PropertyStatus,
    pub images: Vec<String>,
    pub featured_image: String,
    pub amenities: Vec<String>,
    pub furnished: bool,
    pub parking: bool,
    pub owner_id: Option<i64>,
    pub owner_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Map one backend record, of whatever shape, to a canonical `Property`.
///
/// Never fails: missing or mistyped fields fall back to defaults, unknown enum tokens are
/// logged and defaulted.
pub fn map_backend_to_frontend(raw: &Value) -> Property {
    Property::from_raw(RawListing::from_value(raw))
}

impl Property {
    pub fn from_raw(raw: RawListing) -> Self {
        let listing_type = match raw.listing_type.as_ref() {
            Some(value) => ListingType::coerce("listingType", Some(value)),
            None if raw.flagged_as_rental() => ListingType::Rent,
            None => ListingType::Sale,
        };
        let property_type = PropertyType::coerce("propertyType", raw.property_type.as_ref());
        let status = PropertyStatus::coerce("status", raw.status.as_ref());

        let owner = Owner::resolve(&raw);

        let mut images: Vec<String> = non_empty_list(raw.image_urls)
            .or_else(|| non_empty_list(raw.images))
            .unwrap_or_default();
        if let Some(extra) = non_blank(raw.property_image_url) {
            if !images.contains(&extra) {
                images.push(extra);
            }
        }
        if images.is_empty() {
            images.push(PLACEHOLDER_IMAGE.to_string());
        }
        let featured_image = non_blank(raw.featured_image).unwrap_or_else(|| images[0].clone());

        let title = non_blank(raw.name)
            .or_else(|| non_blank(raw.title))
            .or_else(|| non_blank(raw.property_name))
            .unwrap_or_else(|| match raw.id {
                Some(id) => format!("Property #{id}"),
                None => "Property #New".to_string(),
            });

        Property {
            id: raw.id,
            title,
            description: raw.description.unwrap_or_default(),
            price: raw.price.unwrap_or(0.0),
            address: non_blank(raw.address)
                .or_else(|| non_blank(raw.location))
                .unwrap_or_default(),
            city: raw.city.unwrap_or_default(),
            state: raw.state.unwrap_or_default(),
            zip_code: raw.zip_code.unwrap_or_default(),
            bedrooms: to_count(raw.bedrooms),
            bathrooms: to_count(raw.bathrooms),
            area: to_count(raw.square_feet.filter(|v| *v > 0.0).or(raw.area)),
            property_type,
            listing_type,
            status,
            images,
            featured_image,
            amenities: raw.amenities.map(|a| a.into_list()).unwrap_or_default(),
            furnished: raw.furnished.unwrap_or(false),
            parking: raw.parking.unwrap_or(false),
            owner_id: owner.id,
            owner_name: owner.name,
            contact_email: owner.email,
            contact_phone: owner.phone,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }

    /// Free-text haystack for address-style searches.
    pub fn location_fields(&self) -> [&str; 3] {
        [&self.address, &self.city, &self.state]
    }
}

impl From<&Property> for ListingPayload {
    fn from(property: &Property) -> Self {
        ListingPayload {
            name: property.title.clone(),
            description: property.description.clone(),
            address: property.address.clone(),
            city: property.city.clone(),
            state: property.state.clone(),
            zip_code: property.zip_code.clone(),
            price: property.price,
            bathrooms: property.bathrooms,
            bedrooms: property.bedrooms,
            square_feet: property.area,
            furnished: property.furnished,
            parking: property.parking,
            // The placeholder is ours, never send it back as a real image.
            image_urls: property
                .images
                .iter()
                .filter(|url| url.as_str() != PLACEHOLDER_IMAGE)
                .cloned()
                .collect(),
            status: property.status.as_str().to_string(),
            amenities: property.amenities.join(","),
            listing_type: property.listing_type.as_str().to_string(),
            property_type: property.property_type.as_str().to_string(),
        }
    }
}

/// Owner identity, flat transient fields first, then the nested `user`, then `userId`.
struct Owner {
    id: Option<i64>,
    name: String,
    email: String,
    phone: String,
}

impl Owner {
    fn resolve(raw: &RawListing) -> Self {
        let mut owner = Owner {
            id: raw.owner_id,
            name: non_blank(raw.owner_name.clone()).unwrap_or_else(|| DEFAULT_OWNER_NAME.into()),
            email: raw.contact_email.clone().unwrap_or_default(),
            phone: raw.contact_phone.clone().unwrap_or_default(),
        };

        if let Some(user) = raw.user.as_ref() {
            if owner.id.is_none() {
                owner.id = user.id;
            }

            if owner.name == DEFAULT_OWNER_NAME {
                let full = format!(
                    "{} {}",
                    user.first_name.as_deref().unwrap_or(""),
                    user.last_name.as_deref().unwrap_or("")
                );
                let full = full.trim();
                if !full.is_empty() {
                    owner.name = full.to_string();
                } else if let Some(username) = non_blank(user.username.clone()) {
                    owner.name = username;
                }
            }

            if owner.email.is_empty() {
                owner.email = user.email.clone().unwrap_or_default();
            }
            if owner.phone.is_empty() {
                owner.phone = user.phone.clone().unwrap_or_default();
            }
        }

        if owner.id.is_none() {
            owner.id = raw.user_id;
        }

        owner
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn non_empty_list(list: Option<Vec<String>>) -> Option<Vec<String>> {
    list.map(|items| {
        items
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
    })
    .filter(|items| !items.is_empty())
}

fn to_count(value: Option<f64>) -> u32 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v.round().min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}
