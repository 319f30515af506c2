//! Blog post model.

use serde::{Deserialize, Serialize};

use super::activity::required;
use crate::errors::AppError;
use crate::repository::{Draft, Patch, Record};
use crate::security::{sanitize_optional, sanitize_text};

/// Fixed set of blog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogCategory {
    Egitim,
    Gelisim,
    Etkinlik,
    Saglik,
    Diger,
}

impl BlogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlogCategory::Egitim => "egitim",
            BlogCategory::Gelisim => "gelisim",
            BlogCategory::Etkinlik => "etkinlik",
            BlogCategory::Saglik => "saglik",
            BlogCategory::Diger => "diger",
        }
    }

    /// Human readable name shown in listings.
    pub fn display_name(&self) -> &'static str {
        match self {
            BlogCategory::Egitim => "Eğitim",
            BlogCategory::Gelisim => "Gelişim",
            BlogCategory::Etkinlik => "Etkinlik",
            BlogCategory::Saglik => "Sağlık",
            BlogCategory::Diger => "Diğer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "egitim" => Some(BlogCategory::Egitim),
            "gelisim" => Some(BlogCategory::Gelisim),
            "etkinlik" => Some(BlogCategory::Etkinlik),
            "saglik" => Some(BlogCategory::Saglik),
            "diger" => Some(BlogCategory::Diger),
            _ => None,
        }
    }
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub category: Option<BlogCategory>,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for BlogPost {
    const STORE_KEY: &'static str = "blogPosts";
    const LABEL: &'static str = "Blog post";

    fn id(&self) -> i64 {
        self.id
    }

    fn touch(&mut self, now: String) {
        self.updated_at = Some(now);
    }
}

/// Split a comma separated tag input, trimming entries and dropping empty ones.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(sanitize_text)
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Blank selects no category; anything else must name a known one.
fn parse_category(input: Option<&str>) -> Result<Option<BlogCategory>, AppError> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => BlogCategory::parse(value)
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("Unknown blog category '{}'", value))),
    }
}

/// Request body for creating a new blog post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogPostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Comma separated tags as typed into the form
    #[serde(default)]
    pub tags: Option<String>,
}

impl Draft for CreateBlogPostRequest {
    type Record = BlogPost;

    fn build(self, id: i64, now: String) -> Result<BlogPost, AppError> {
        let title = required(&self.title, "Blog title is required")?;
        let author = required(&self.author, "Author name is required")?;
        let content = required(&self.content, "Blog content is required")?;
        let category = parse_category(self.category.as_deref())?;

        Ok(BlogPost {
            id,
            title,
            author,
            category,
            content,
            image: sanitize_optional(self.image.as_deref()),
            tags: self.tags.as_deref().map(parse_tags).unwrap_or_default(),
            created_at: now,
            updated_at: None,
        })
    }
}

/// Request body for updating an existing blog post. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl Patch for UpdateBlogPostRequest {
    type Record = BlogPost;

    fn apply(self, post: &mut BlogPost) -> Result<(), AppError> {
        if let Some(title) = self.title {
            post.title = required(&title, "Blog title is required")?;
        }
        if let Some(author) = self.author {
            post.author = required(&author, "Author name is required")?;
        }
        if let Some(content) = self.content {
            post.content = required(&content, "Blog content is required")?;
        }
        if let Some(category) = self.category {
            post.category = parse_category(Some(&category))?;
        }
        if let Some(image) = self.image {
            post.image = sanitize_optional(Some(&image));
        }
        if let Some(tags) = self.tags {
            post.tags = parse_tags(&tags);
        }
        Ok(())
    }
}
