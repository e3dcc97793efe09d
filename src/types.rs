/// Shared types used across the codebase

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque product identifier assigned by the remote store.
///
/// The table may key rows by uuid or by integer; both arrive here as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => ProductId(s),
            RawId::Number(n) => ProductId(n.to_string()),
        })
    }
}

/// A catalog listing as stored in the `products` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub materials: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload. `id` and `created_at` are left to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub materials: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub image_url: Option<String>,
}

/// Partial update payload.
///
/// Outer `None` leaves a column untouched; `Some(None)` clears a nullable one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<Option<String>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }

    /// Apply the patch to an in-memory copy of a row
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(materials) = &self.materials {
            product.materials = materials.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(width) = self.width {
            product.width = width;
        }
        if let Some(height) = self.height {
            product.height = height;
        }
        if let Some(depth) = self.depth {
            product.depth = depth;
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = image_url.clone();
        }
    }
}

/// Image file received from the admin form
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Access token of an authenticated platform session
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_id_accepts_text_and_integer() {
        let text: ProductId = serde_json::from_value(json!("8c1e")).unwrap();
        let number: ProductId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(text.as_str(), "8c1e");
        assert_eq!(number.as_str(), "42");
    }

    #[test]
    fn product_decodes_postgrest_row() {
        let row = json!({
            "id": "3f0e7a9c-2d7b-4c55-9a53-1f1f3b0c9a11",
            "title": "Silla Mid-Century",
            "description": null,
            "materials": "Teca",
            "price": 250.5,
            "width": 45,
            "height": null,
            "depth": 50.5,
            "image_url": null,
            "created_at": "2025-03-01T10:15:30.123456+00:00"
        });

        let product: Product = serde_json::from_value(row).unwrap();
        assert_eq!(product.price, Decimal::new(2505, 1));
        assert_eq!(product.width, Some(45.0));
        assert_eq!(product.height, None);
        assert!(product.image_url.is_none());
    }

    #[test]
    fn patch_serializes_only_touched_columns() {
        let patch = ProductPatch {
            price: Some(Decimal::new(10, 0)),
            description: Some(None),
            ..Default::default()
        };

        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, json!({ "description": null, "price": 10.0 }));
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("secret.jwt.value");
        assert_eq!(format!("{:?}", token), "AccessToken(..)");
    }
}
