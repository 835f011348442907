//! Common API types and utilities

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::shared::error::ServiceError;

pub(crate) mod string_or_number {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNum {
        Num(i64),
        Str(String),
    }

    pub fn deserialize_u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<StringOrNum>::deserialize(deserializer)? {
            Some(StringOrNum::Num(n)) => u32::try_from(n).map(Some).map_err(de::Error::custom),
            Some(StringOrNum::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(StringOrNum::Str(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }

    pub fn deserialize_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNum::deserialize(deserializer)? {
            StringOrNum::Num(n) => Ok(n),
            StringOrNum::Str(s) => s.trim().parse().map_err(de::Error::custom),
        }
    }
}

/// JSON body extractor whose rejections use the service error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ServiceError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the service error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServiceError))]
pub struct ApiQuery<T>(pub T);

/// Parse a path identifier, reporting malformed values the way the datastore does.
pub fn parse_uuid(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::invalid_uuid())
}

/// Pagination parameters (`page` is 1-based)
#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number, starting at 1
    #[serde(default, deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub page: Option<u32>,
    /// Items per page
    #[serde(default, alias = "size", deserialize_with = "string_or_number::deserialize_u32_opt")]
    pub limit: Option<u32>,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total_items: u64,
    pub item_count: u32,
    pub items_per_page: u32,
    pub total_pages: u32,
    pub current_page: u32,
}

impl PaginationMeta {
    pub fn new(total_items: u64, item_count: u32, items_per_page: u32, current_page: u32) -> Self {
        let total_pages = if items_per_page == 0 {
            0
        } else {
            total_items.div_ceil(items_per_page as u64) as u32
        };
        Self {
            total_items,
            item_count,
            items_per_page,
            total_pages,
            current_page,
        }
    }
}

/// A page of items with its metadata
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
