//! Site-wide constants, page metadata and schema.org structured data for the
//! storefront pages.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::{json, Value};

use crate::types::Product;

pub const SITE_NAME: &str = "Sogrub";
pub const SITE_FULL_NAME: &str = "Sogrub - Restauración y Venta de Muebles";
pub const SITE_DESCRIPTION: &str = "Restauración artesanal de muebles únicos con diseño moderno y materiales sostenibles. Damos una segunda vida a piezas con historia.";
const OG_IMAGE_PATH: &str = "/images/og-image.png";
const LOCALE: &str = "es_ES";
const TWITTER_HANDLE: &str = "@sogrub";
const CURRENCY: &str = "EUR";

#[derive(Debug, Clone, Serialize)]
pub struct SiteInfo {
    pub name: &'static str,
    pub full_name: &'static str,
    pub description: &'static str,
    pub url: String,
    pub locale: &'static str,
    pub twitter_handle: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenGraph {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub site_name: &'static str,
    pub images: Vec<String>,
    pub locale: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub open_graph: OpenGraph,
}

impl SiteInfo {
    pub fn new(url: &str) -> Self {
        Self {
            name: SITE_NAME,
            full_name: SITE_FULL_NAME,
            description: SITE_DESCRIPTION,
            url: url.trim_end_matches('/').to_string(),
            locale: LOCALE,
            twitter_handle: TWITTER_HANDLE,
        }
    }

    fn og_image(&self) -> String {
        format!("{}{}", self.url, OG_IMAGE_PATH)
    }

    fn product_url(&self, product: &Product) -> String {
        format!("{}/products/{}", self.url, product.id)
    }

    /// Metadata for a product detail page
    pub fn product_metadata(&self, product: &Product) -> PageMetadata {
        let description = product
            .description
            .clone()
            .unwrap_or_else(|| format!("{} - Mueble restaurado disponible en {}", product.title, SITE_NAME));

        PageMetadata {
            title: format!("{} - {}", product.title, SITE_NAME),
            description,
            open_graph: OpenGraph {
                title: product.title.clone(),
                description: product.description.clone(),
                url: self.product_url(product),
                site_name: SITE_NAME,
                images: product.image_url.iter().cloned().collect(),
                locale: LOCALE,
                kind: "article",
            },
        }
    }

    pub fn organization_schema(&self) -> Value {
        json!({
            "@context": "https://schema.org",
            "@type": "Organization",
            "name": SITE_NAME,
            "description": SITE_DESCRIPTION,
            "url": self.url,
            "logo": format!("{}/icon.png", self.url),
            "sameAs": [],
            "contactPoint": {
                "@type": "ContactPoint",
                "contactType": "Customer Service",
                "availableLanguage": ["Spanish"],
            },
        })
    }

    pub fn local_business_schema(&self) -> Value {
        json!({
            "@context": "https://schema.org",
            "@type": "LocalBusiness",
            "@id": self.url,
            "name": SITE_NAME,
            "description": SITE_DESCRIPTION,
            "url": self.url,
            "image": self.og_image(),
            "priceRange": "$$",
            "address": {
                "@type": "PostalAddress",
                "addressCountry": "ES",
            },
        })
    }

    pub fn website_schema(&self) -> Value {
        json!({
            "@context": "https://schema.org",
            "@type": "WebSite",
            "name": SITE_FULL_NAME,
            "url": self.url,
            "description": SITE_DESCRIPTION,
            "inLanguage": "es-ES",
            "potentialAction": {
                "@type": "SearchAction",
                "target": {
                    "@type": "EntryPoint",
                    "urlTemplate": format!("{}/products?search={{search_term_string}}", self.url),
                },
                "query-input": "required name=search_term_string",
            },
        })
    }

    pub fn product_schema(&self, product: &Product) -> Value {
        json!({
            "@context": "https://schema.org",
            "@type": "Product",
            "name": product.title,
            "description": product.description.clone().unwrap_or_default(),
            "image": product.image_url.clone().unwrap_or_else(|| self.og_image()),
            "offers": {
                "@type": "Offer",
                "price": product.price.round_dp(2).to_f64(),
                "priceCurrency": CURRENCY,
                "availability": "https://schema.org/InStock",
                "url": self.product_url(product),
            },
        })
    }
}

/// Price as the storefront shows it (`es-ES` EUR): `250,00 €`, `12.500,00 €`.
///
/// Grouping only starts at five integer digits, matching `Intl` for `es-ES`.
pub fn format_price_eur(price: Decimal) -> String {
    let rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let grouped = if int_part.len() >= 5 {
        let digits: Vec<char> = int_part.chars().collect();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.iter().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push('.');
            }
            out.push(*c);
        }
        out
    } else {
        int_part.to_string()
    };

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{}{},{}\u{a0}€", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductId;
    use chrono::Utc;

    fn product(description: Option<&str>, image_url: Option<&str>) -> Product {
        Product {
            id: ProductId::new("42"),
            title: "Mesa de Centro Vintage".to_string(),
            description: description.map(str::to_string),
            materials: Some("Roble Macizo".to_string()),
            price: Decimal::new(450, 0),
            width: None,
            height: None,
            depth: None,
            image_url: image_url.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn formats_prices_like_es_es() {
        assert_eq!(format_price_eur(Decimal::new(250, 0)), "250,00\u{a0}€");
        assert_eq!(format_price_eur(Decimal::new(1250, 0)), "1250,00\u{a0}€");
        assert_eq!(format_price_eur(Decimal::new(12500, 0)), "12.500,00\u{a0}€");
        assert_eq!(format_price_eur(Decimal::new(123456789, 2)), "1.234.567,89\u{a0}€");
        assert_eq!(format_price_eur(Decimal::new(9995, 3)), "10,00\u{a0}€");
    }

    #[test]
    fn metadata_falls_back_to_generated_description() {
        let site = SiteInfo::new("https://sogrub.test/");
        let meta = site.product_metadata(&product(None, None));

        assert_eq!(meta.title, "Mesa de Centro Vintage - Sogrub");
        assert_eq!(meta.description, "Mesa de Centro Vintage - Mueble restaurado disponible en Sogrub");
        assert!(meta.open_graph.images.is_empty());
        assert_eq!(meta.open_graph.url, "https://sogrub.test/products/42");
    }

    #[test]
    fn product_schema_uses_image_or_site_default() {
        let site = SiteInfo::new("https://sogrub.test");

        let with_image = site.product_schema(&product(Some("Roble"), Some("https://cdn.test/a.png")));
        assert_eq!(with_image["image"], "https://cdn.test/a.png");
        assert_eq!(with_image["offers"]["priceCurrency"], "EUR");
        assert_eq!(with_image["offers"]["price"], 450.0);

        let without = site.product_schema(&product(None, None));
        assert_eq!(without["image"], "https://sogrub.test/images/og-image.png");
    }

    #[test]
    fn product_schema_price_is_a_number() {
        let site = SiteInfo::new("https://sogrub.test");
        let mut item = product(None, None);
        item.price = Decimal::new(12995, 2);

        let schema = site.product_schema(&item);
        assert!(schema["offers"]["price"].is_number());
        assert_eq!(schema["offers"]["price"].as_f64(), Some(129.95));
    }

    #[test]
    fn website_schema_has_search_template() {
        let site = SiteInfo::new("https://sogrub.test");
        let schema = site.website_schema();
        assert_eq!(
            schema["potentialAction"]["target"]["urlTemplate"],
            "https://sogrub.test/products?search={search_term_string}"
        );
    }
}
