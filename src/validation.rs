// Form validation for admin product writes and login credentials.
//
// Everything here runs before any remote call is made.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::types::{NewProduct, ProductPatch};

pub type FieldErrors = HashMap<String, String>;

const TITLE_MIN_CHARS: usize = 2;

/// Raw text fields of the admin product form, as submitted.
///
/// `None` means the field was not part of the submission at all.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub materials: Option<String>,
    pub price: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub depth: Option<String>,
}

impl ProductForm {
    /// Set a field by its form name. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "materials" => &mut self.materials,
            "price" => &mut self.price,
            "width" => &mut self.width,
            "height" => &mut self.height,
            "depth" => &mut self.depth,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// Validate a complete form for product creation
pub fn validate_new_product(form: &ProductForm) -> Result<NewProduct, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = match form.title.as_deref() {
        Some(raw) => check_title(raw, &mut errors),
        None => {
            errors.insert("title".to_string(), "Title is required.".to_string());
            None
        }
    };

    let price = match form.price.as_deref() {
        Some(raw) => check_price(raw, &mut errors),
        None => {
            errors.insert("price".to_string(), "Price is required.".to_string());
            None
        }
    };

    let width = form.width.as_deref().and_then(|raw| check_dimension("width", raw, &mut errors));
    let height = form.height.as_deref().and_then(|raw| check_dimension("height", raw, &mut errors));
    let depth = form.depth.as_deref().and_then(|raw| check_dimension("depth", raw, &mut errors));

    match (title, price) {
        (Some(title), Some(price)) if errors.is_empty() => Ok(NewProduct {
            title,
            description: form.description.as_deref().and_then(optional_text),
            materials: form.materials.as_deref().and_then(optional_text),
            price,
            width: width.flatten(),
            height: height.flatten(),
            depth: depth.flatten(),
            image_url: None,
        }),
        _ => Err(errors),
    }
}

/// Validate the subset of fields present in an update form
pub fn validate_product_patch(form: &ProductForm) -> Result<ProductPatch, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut patch = ProductPatch::default();

    if let Some(raw) = form.title.as_deref() {
        patch.title = check_title(raw, &mut errors);
    }
    if let Some(raw) = form.price.as_deref() {
        patch.price = check_price(raw, &mut errors);
    }
    patch.description = form.description.as_deref().map(optional_text);
    patch.materials = form.materials.as_deref().map(optional_text);
    patch.width = form.width.as_deref().and_then(|raw| check_dimension("width", raw, &mut errors));
    patch.height = form.height.as_deref().and_then(|raw| check_dimension("height", raw, &mut errors));
    patch.depth = form.depth.as_deref().and_then(|raw| check_dimension("depth", raw, &mut errors));

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(errors)
    }
}

fn check_title(raw: &str, errors: &mut FieldErrors) -> Option<String> {
    let title = raw.trim();
    if title.chars().count() < TITLE_MIN_CHARS {
        errors.insert(
            "title".to_string(),
            format!("Title must be at least {} characters.", TITLE_MIN_CHARS),
        );
        return None;
    }
    Some(title.to_string())
}

fn check_price(raw: &str, errors: &mut FieldErrors) -> Option<Decimal> {
    let parsed = Decimal::from_str(raw.trim()).or_else(|_| Decimal::from_scientific(raw.trim()));
    match parsed {
        Ok(price) if price.is_sign_negative() && !price.is_zero() => {
            errors.insert(
                "price".to_string(),
                "Price must be greater than or equal to 0.".to_string(),
            );
            None
        }
        Ok(price) => Some(price.normalize()),
        Err(_) => {
            errors.insert("price".to_string(), "Price must be a number.".to_string());
            None
        }
    }
}

/// Returns `Some(None)` for blank or zero input (stored as null).
fn check_dimension(field: &str, raw: &str, errors: &mut FieldErrors) -> Option<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    match raw.parse::<f64>() {
        Ok(value) if !value.is_finite() => {
            errors.insert(field.to_string(), format!("The {} must be a number.", field));
            None
        }
        Ok(value) if value < 0.0 => {
            errors.insert(
                field.to_string(),
                format!("The {} must be greater than or equal to 0.", field),
            );
            None
        }
        Ok(value) if value == 0.0 => Some(None),
        Ok(value) => Some(Some(value)),
        Err(_) => {
            errors.insert(field.to_string(), format!("The {} must be a number.", field));
            None
        }
    }
}

fn optional_text(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Check credential shape: a well-formed email and a non-empty password
pub fn credentials_are_well_formed(email: &str, password: &str) -> bool {
    is_valid_email(email) && !password.is_empty()
}

fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    }) && labels.last().is_some_and(|tld| tld.chars().count() >= 2)
}
