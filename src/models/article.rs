use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Category linked to an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArticleCategory {
    pub id: i64,
    pub name: String,
}

/// An article with its linked categories. `image` holds an object key in
/// the image bucket, never the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub header: String,
    pub sub_header: String,
    pub description: String,
    pub image: Option<String>,
    pub categories: Vec<ArticleCategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of the article/category join.
#[derive(Debug, Clone, FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub header: String,
    pub sub_header: String,
    pub description: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
}

impl ArticleRow {
    fn into_article(self) -> (Article, Option<ArticleCategory>) {
        let category = match (self.category_id, self.category_name) {
            (Some(id), Some(name)) => Some(ArticleCategory { id, name }),
            _ => None,
        };
        let article = Article {
            id: self.id,
            header: self.header,
            sub_header: self.sub_header,
            description: self.description,
            image: self.image,
            categories: Vec::new(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (article, category)
    }
}

/// Folds join rows into one article per id, keeping first-seen order and
/// accumulating every linked category.
pub fn fold_article_rows(rows: Vec<ArticleRow>) -> Vec<Article> {
    let mut articles: Vec<Article> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let (article, category) = row.into_article();
        let position = *index.entry(article.id).or_insert_with(|| {
            articles.push(article);
            articles.len() - 1
        });

        if let Some(category) = category {
            let categories = &mut articles[position].categories;
            if !categories.iter().any(|c| c.id == category.id) {
                categories.push(category);
            }
        }
    }

    articles
}

/// Fields of a new article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub header: String,
    pub sub_header: String,
    pub description: String,
}

/// Partial article update; only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleUpdate {
    pub header: Option<String>,
    pub image: Option<String>,
    pub sub_header: Option<String>,
    pub description: Option<String>,
}

impl ArticleUpdate {
    pub fn is_empty(&self) -> bool {
        self.header.is_none()
            && self.image.is_none()
            && self.sub_header.is_none()
            && self.description.is_none()
    }

    pub fn image(key: impl Into<String>) -> Self {
        Self {
            image: Some(key.into()),
            ..Default::default()
        }
    }
}

/// Search parameters for the article listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleSearch {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
    pub category_ids: Vec<i64>,
}
