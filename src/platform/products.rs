// PostgREST access to the `products` table

use async_trait::async_trait;
use reqwest::Method;

use super::{PlatformError, ProductStore, SupabaseClient};
use crate::types::{AccessToken, NewProduct, Product, ProductId, ProductPatch};

const TABLE: &str = "products";
const SERVICE: &str = "table api";

#[async_trait]
impl ProductStore for SupabaseClient {
    async fn list(&self) -> Result<Vec<Product>, PlatformError> {
        let response = self
            .request(Method::GET, &self.rest_url(TABLE), None)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        Ok(Self::check(SERVICE, response).await?.json().await?)
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>, PlatformError> {
        let response = self
            .request(Method::GET, &self.rest_url(TABLE), None)
            .query(&[("select", "*".to_string()), ("id", eq(id)), ("limit", "1".to_string())])
            .send()
            .await?;

        let rows: Vec<Product> = Self::check(SERVICE, response).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn insert(&self, token: &AccessToken, product: &NewProduct) -> Result<Product, PlatformError> {
        let response = self
            .request(Method::POST, &self.rest_url(TABLE), Some(token))
            .header("Prefer", "return=representation")
            .json(&[product])
            .send()
            .await?;

        let rows: Vec<Product> = Self::check(SERVICE, response).await?.json().await?;
        rows.into_iter().next().ok_or_else(|| PlatformError::Api {
            service: SERVICE,
            status: 200,
            message: "insert returned no row".to_string(),
        })
    }

    async fn update(
        &self,
        token: &AccessToken,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, PlatformError> {
        let response = self
            .request(Method::PATCH, &self.rest_url(TABLE), Some(token))
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await?;

        let rows: Vec<Product> = Self::check(SERVICE, response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| PlatformError::NotFound(format!("product {}", id)))
    }

    async fn delete(&self, token: &AccessToken, id: &ProductId) -> Result<(), PlatformError> {
        let response = self
            .request(Method::DELETE, &self.rest_url(TABLE), Some(token))
            .query(&[("id", eq(id))])
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::check(SERVICE, response).await?.json().await?;
        if rows.is_empty() {
            return Err(PlatformError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        let response = self
            .request(Method::GET, &self.rest_url(TABLE), None)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;

        Self::check(SERVICE, response).await?;
        Ok(())
    }
}

/// PostgREST equality filter value
fn eq(id: &ProductId) -> String {
    format!("eq.{}", id)
}
