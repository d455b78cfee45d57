// src/cms.rs
//! Strapi CMS client and shape adapters.
//!
//! Strapi v4 wraps every entry as `{ id, attributes: {...} }`; v5 flattens
//! it. Each upstream type goes through exactly one adapter function that
//! collapses both shapes into a canonical record, so nothing downstream of
//! this module ever sees the raw payload.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

const PAGE_SIZE: usize = 100;

/// Canonical crypto-project record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub symbol: String,
    pub category: String,
    pub chain: String,
    pub logo: Option<String>,
    pub slug: String,
}

/// Canonical storefront-product record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub slug: String,
}

pub struct CmsClient {
    base_url: String,
    client: reqwest::Client,
}

impl CmsClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        let entries = self.fetch_collection("crypto-projects").await?;
        Ok(entries.iter().filter_map(project_from_entry).collect())
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        let entries = self.fetch_collection("products").await?;
        Ok(entries.iter().filter_map(product_from_entry).collect())
    }

    /// Case-insensitive contains across title/description/symbol/category/
    /// chain, applied after the adapter boundary.
    pub async fn search_projects(&self, query: &str) -> Result<Vec<Project>> {
        let projects = self.projects().await?;
        Ok(projects
            .into_iter()
            .filter(|p| {
                contains_ci(&p.title, query)
                    || contains_ci(&p.description, query)
                    || contains_ci(&p.symbol, query)
                    || contains_ci(&p.category, query)
                    || contains_ci(&p.chain, query)
            })
            .collect())
    }

    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let products = self.products().await?;
        Ok(products
            .into_iter()
            .filter(|p| contains_ci(&p.name, query) || contains_ci(&p.description, query))
            .collect())
    }

    async fn fetch_collection(&self, collection: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}/api/{}?populate=*&pagination[pageSize]={}",
            self.base_url, collection, PAGE_SIZE
        );
        let body: Value = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting cms collection '{collection}'"))?
            .error_for_status()
            .with_context(|| format!("cms collection '{collection}'"))?
            .json()
            .await
            .with_context(|| format!("decoding cms collection '{collection}'"))?;
        Ok(body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

/// Adapter boundary for projects; accepts nested and flat entries.
fn project_from_entry(entry: &Value) -> Option<Project> {
    let id = entry_id(entry)?;
    let attrs = attributes(entry);
    let title = str_field(attrs, "title")?;
    Some(Project {
        description: rich_or_plain_text(attrs.get("description")),
        symbol: str_field(attrs, "symbol").unwrap_or_default(),
        category: str_field(attrs, "category").unwrap_or_default(),
        chain: str_field(attrs, "chain").unwrap_or_default(),
        logo: str_field(attrs, "logo"),
        slug: str_field(attrs, "slug").unwrap_or_else(|| id.clone()),
        id,
        title,
    })
}

/// Adapter boundary for products.
fn product_from_entry(entry: &Value) -> Option<Product> {
    let id = entry_id(entry)?;
    let attrs = attributes(entry);
    let name = str_field(attrs, "name")?;
    Some(Product {
        description: rich_or_plain_text(attrs.get("description")),
        price: attrs.get("price").and_then(Value::as_f64),
        image: str_field(attrs, "image"),
        slug: str_field(attrs, "slug").unwrap_or_else(|| id.clone()),
        id,
        name,
    })
}

fn attributes(entry: &Value) -> &Value {
    match entry.get("attributes") {
        Some(attrs) if attrs.is_object() => attrs,
        _ => entry,
    }
}

fn entry_id(entry: &Value) -> Option<String> {
    match entry.get("id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => entry
            .get("documentId")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn str_field(attrs: &Value, key: &str) -> Option<String> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Descriptions are either plain strings or Strapi rich-text blocks
/// (`[{ type, children: [{ text }] }]`). Flatten the latter.
fn rich_or_plain_text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(blocks)) => {
            let mut out = String::new();
            for block in blocks {
                let Some(children) = block.get("children").and_then(Value::as_array) else {
                    continue;
                };
                for child in children {
                    if let Some(text) = child.get("text").and_then(Value::as_str) {
                        if !out.is_empty() && !text.is_empty() {
                            out.push(' ');
                        }
                        out.push_str(text.trim());
                    }
                }
            }
            out
        }
        _ => String::new(),
    }
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
