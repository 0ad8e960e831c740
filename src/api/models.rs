use crate::api::ApiError;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// Backend listing record, as the listings API actually sends it:
//
// listing
//  ├── id            number | numeric string
//  ├── name | title | propertyName
//  ├── imageUrls | images | propertyImageUrl
//  ├── amenities     "Pool, Gym" | ["Pool", "Gym"]
//  ├── squareFeet | area
//  ├── listingType / propertyType / status   any casing
//  ├── ownerId, ownerName, contactEmail, contactPhone   (flat, transient)
//  ├── user { id, firstName, lastName, username, email, phone }
//  └── userId        legacy, number | numeric string
//
// Every field is optional and a field of the wrong JSON type reads as missing.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawListing {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub property_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub address: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub city: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub zip_code: Option<String>,

    #[serde(deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub bedrooms: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub bathrooms: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub square_feet: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub area: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub furnished: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub parking: Option<bool>,

    #[serde(deserialize_with = "lenient_strings")]
    pub image_urls: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_strings")]
    pub images: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub property_image_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub featured_image: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub amenities: Option<RawAmenities>,

    // Enum tokens stay raw so the normalizer can tell "absent" from "unrecognized".
    pub listing_type: Option<Value>,
    pub property_type: Option<Value>,
    pub status: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub for_rent: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub is_rental: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub rental_property: Option<bool>,

    #[serde(deserialize_with = "lenient_i64")]
    pub owner_id: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub owner_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub contact_email: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub contact_phone: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub user: Option<RawUser>,
    #[serde(deserialize_with = "lenient_i64")]
    pub user_id: Option<i64>,

    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RawListing {
    /// Reads any JSON value; non-objects become an empty record.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or_default(),
            _ => RawListing::default(),
        }
    }

    /// Some listing-type hint was present in a rental flag.
    pub fn flagged_as_rental(&self) -> bool {
        [self.for_rent, self.is_rental, self.rental_property]
            .iter()
            .any(|flag| *flag == Some(true))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawUser {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub username: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawAmenities {
    Joined(String),
    List(Vec<String>),
}

impl RawAmenities {
    pub fn into_list(self) -> Vec<String> {
        let items: Vec<String> = match self {
            RawAmenities::Joined(joined) => joined.split(',').map(str::to_string).collect(),
            RawAmenities::List(list) => list,
        };

        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Listing body the mutation endpoints expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPayload {
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub price: f64,
    pub bathrooms: u32,
    pub bedrooms: u32,
    pub square_feet: u32,
    pub furnished: bool,
    pub parking: bool,
    pub image_urls: Vec<String>,
    pub status: String,
    /// Comma-joined, the way the backend stores it.
    pub amenities: String,
    pub listing_type: String,
    pub property_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response envelope: `{ success, data?, listings?, message?, accessToken? }`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiEnvelope {
    pub success: Option<bool>,
    pub data: Option<Value>,
    pub listings: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub access_token: Option<String>,
}

/// Pull listing records out of whichever payload location the backend used.
///
/// A well-formed envelope that reports failure, or carries no payload, yields an empty
/// set. Anything that is neither an object nor an array is a shape error.
pub fn extract_records(body: &Value) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(items) => Ok(items.clone()),
        Value::Object(_) => {
            let envelope: ApiEnvelope = serde_json::from_value(body.clone())
                .map_err(|e| ApiError::UnexpectedShape(e.to_string()))?;

            if envelope.success == Some(false) {
                tracing::warn!(
                    message = envelope.message.as_deref().unwrap_or(""),
                    "Backend reported an unsuccessful listing response"
                );
                return Ok(Vec::new());
            }

            match (envelope.listings, envelope.data) {
                (Some(Value::Array(items)), _) => Ok(items),
                (_, Some(Value::Array(items))) => Ok(items),
                (_, Some(record @ Value::Object(_))) => Ok(vec![record]),
                _ => {
                    tracing::warn!("No listings or data array found in backend response");
                    Ok(Vec::new())
                }
            }
        }
        other => Err(ApiError::UnexpectedShape(format!(
            "expected object or array, got {}",
            json_kind(other)
        ))),
    }
}

/// First record of a single-listing response, if any.
pub fn extract_single(body: &Value) -> Result<Option<Value>, ApiError> {
    Ok(extract_records(body)?.into_iter().next())
}

/// Access token from the places the auth endpoint has been seen to put it.
pub fn extract_access_token(body: &Value) -> Option<String> {
    let envelope: ApiEnvelope = serde_json::from_value(body.clone()).ok()?;
    if let Some(token) = envelope.access_token.filter(|t| !t.is_empty()) {
        return Some(token);
    }

    let data = envelope.data?;
    if let Some(token) = data.get("accessToken").and_then(Value::as_str) {
        return Some(token.to_string());
    }

    let cookie = data.get("cookie")?;
    if cookie.get("name").and_then(Value::as_str) == Some("access_token") {
        return cookie
            .get("value")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
    }

    None
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// RFC 3339 strings, or epoch seconds as the backend's `Instant` sometimes serializes.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_f64().and_then(|secs| {
            let whole = secs.trunc() as i64;
            let nanos = ((secs - secs.trunc()) * 1e9) as u32;
            Utc.timestamp_opt(whole, nanos).single()
        }),
        _ => None,
    })
}
