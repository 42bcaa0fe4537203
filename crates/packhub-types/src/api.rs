use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Pack;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

/// Publishable subset of a pack. Everything else (id, author, downloads,
/// published, timestamps) is assigned server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishPackRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub rules: Vec<crate::models::Rule>,
    #[serde(default)]
    pub memos: Vec<crate::models::Memo>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Listing query parameters. All filters are optional and AND-combined.
/// Pagination values that fail to parse are treated as absent rather than
/// rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub page: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit: Option<u32>,
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// One page of listing results. `total` counts all matching rows before
/// pagination; `items` is never null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackList {
    pub items: Vec<Pack>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

/// Flat error envelope used by every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_tolerate_malformed_pagination() {
        let p: ListParams =
            serde_json::from_str(r#"{"search":"x","page":"abc","limit":"-5"}"#).unwrap();
        assert_eq!(p.search.as_deref(), Some("x"));
        assert_eq!(p.page, None);
        assert_eq!(p.limit, None);

        let p: ListParams = serde_json::from_str(r#"{"page":"2","limit":"50"}"#).unwrap();
        assert_eq!(p.page, Some(2));
        assert_eq!(p.limit, Some(50));
    }
}
