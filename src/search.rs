// src/search.rs
//! Search fan-out: four independent lookups (CMS projects, CMS products,
//! aggregated news, podcast feed) issued concurrently. Each branch catches
//! its own failure and degrades to an empty list, so one dead source never
//! fails the overall search.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tracing::warn;

use crate::cms::{contains_ci, CmsClient, Product, Project};
use crate::feeds::types::{Article, Episode};
use crate::feeds::{NewsAggregator, PodcastService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Project,
    Product,
    News,
    Podcast,
}

/// Type-tagged projection used only by the search envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchResults {
    pub projects: Vec<SearchResultItem>,
    pub products: Vec<SearchResultItem>,
    pub news: Vec<SearchResultItem>,
    pub podcasts: Vec<SearchResultItem>,
    pub all: Vec<SearchResultItem>,
}

pub struct SearchService {
    cms: Arc<CmsClient>,
    news: Arc<NewsAggregator>,
    podcasts: Arc<PodcastService>,
}

impl SearchService {
    pub fn new(
        cms: Arc<CmsClient>,
        news: Arc<NewsAggregator>,
        podcasts: Arc<PodcastService>,
    ) -> Self {
        Self {
            cms,
            news,
            podcasts,
        }
    }

    pub async fn search(&self, query: &str) -> SearchResults {
        let q = query.trim();
        let (projects, products, news, podcasts) = tokio::join!(
            self.project_branch(q),
            self.product_branch(q),
            self.news_branch(q),
            self.podcast_branch(q),
        );

        // Fixed bucket order, no cross-type ranking.
        let mut all =
            Vec::with_capacity(projects.len() + products.len() + news.len() + podcasts.len());
        all.extend(projects.iter().cloned());
        all.extend(products.iter().cloned());
        all.extend(news.iter().cloned());
        all.extend(podcasts.iter().cloned());

        SearchResults {
            projects,
            products,
            news,
            podcasts,
            all,
        }
    }

    async fn project_branch(&self, q: &str) -> Vec<SearchResultItem> {
        match self.cms.search_projects(q).await {
            Ok(projects) => projects.into_iter().map(project_result).collect(),
            Err(e) => {
                warn!(error = ?e, "project search branch failed");
                counter!("search_branch_errors_total", "branch" => "projects").increment(1);
                Vec::new()
            }
        }
    }

    async fn product_branch(&self, q: &str) -> Vec<SearchResultItem> {
        match self.cms.search_products(q).await {
            Ok(products) => products.into_iter().map(product_result).collect(),
            Err(e) => {
                warn!(error = ?e, "product search branch failed");
                counter!("search_branch_errors_total", "branch" => "products").increment(1);
                Vec::new()
            }
        }
    }

    async fn news_branch(&self, q: &str) -> Vec<SearchResultItem> {
        match self.news.aggregate().await {
            Ok(articles) => articles
                .into_iter()
                .filter(|a| article_matches(a, q))
                .map(article_result)
                .collect(),
            Err(e) => {
                warn!(error = ?e, "news search branch failed");
                counter!("search_branch_errors_total", "branch" => "news").increment(1);
                Vec::new()
            }
        }
    }

    async fn podcast_branch(&self, q: &str) -> Vec<SearchResultItem> {
        match self.podcasts.episodes().await {
            Ok(episodes) => episodes
                .into_iter()
                .filter(|e| contains_ci(&e.title, q) || contains_ci(&e.snippet, q))
                .map(episode_result)
                .collect(),
            Err(e) => {
                warn!(error = ?e, "podcast search branch failed");
                counter!("search_branch_errors_total", "branch" => "podcasts").increment(1);
                Vec::new()
            }
        }
    }
}

fn article_matches(a: &Article, q: &str) -> bool {
    contains_ci(&a.title, q)
        || contains_ci(&a.summary, q)
        || a.categories.iter().any(|c| contains_ci(c, q))
}

fn project_result(p: Project) -> SearchResultItem {
    SearchResultItem {
        id: p.id,
        title: p.title,
        description: p.description,
        url: format!("/projects/{}", p.slug),
        kind: ResultKind::Project,
        image: p.logo.unwrap_or_default(),
        category: Some(p.category).filter(|c| !c.is_empty()),
        date: None,
        price: None,
    }
}

fn product_result(p: Product) -> SearchResultItem {
    SearchResultItem {
        id: p.id,
        title: p.name,
        description: p.description,
        url: format!("/store/{}", p.slug),
        kind: ResultKind::Product,
        image: p.image.unwrap_or_default(),
        category: None,
        date: None,
        price: p.price,
    }
}

fn article_result(a: Article) -> SearchResultItem {
    SearchResultItem {
        id: a.id,
        title: a.title,
        description: a.summary,
        url: a.link,
        kind: ResultKind::News,
        image: a.image,
        category: a.categories.first().cloned(),
        date: Some(a.publish_date),
        price: None,
    }
}

fn episode_result(e: Episode) -> SearchResultItem {
    SearchResultItem {
        id: e.id.clone(),
        title: e.title,
        description: e.snippet,
        url: format!("/podcasts/{}", e.id),
        kind: ResultKind::Podcast,
        image: e.thumbnail,
        category: e.categories.first().cloned(),
        date: Some(e.publish_date),
        price: None,
    }
}
