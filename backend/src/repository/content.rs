//! The three site collections and the operations that span them.

use chrono::Utc;

use super::{Repository, Record};
use crate::db::Store;
use crate::errors::AppError;
use crate::models::{
    Activity, BlogPost, ContactMessage, DashboardStats, ExportDocument, MessageFilter,
};

/// Content service constructed once at startup and shared by all handlers.
pub struct Content {
    pub activities: Repository<Activity>,
    pub blog_posts: Repository<BlogPost>,
    pub messages: Repository<ContactMessage>,
}

impl Content {
    pub async fn open(store: Store, message_retention: usize) -> Self {
        Self {
            activities: Repository::open(store.clone(), None).await,
            blog_posts: Repository::open(store.clone(), None).await,
            messages: Repository::open(store, Some(message_retention)).await,
        }
    }

    pub async fn stats(&self) -> DashboardStats {
        DashboardStats {
            activities: self.activities.len().await,
            blog_posts: self.blog_posts.len().await,
            messages: self.messages.len().await,
            unread_messages: self.messages.list_where(|m| !m.read).await.len(),
        }
    }

    /// Snapshot of every collection plus the export time.
    pub async fn export(&self) -> ExportDocument {
        ExportDocument {
            activities: self.activities.list().await,
            blog_posts: self.blog_posts.list().await,
            contact_messages: self.messages.list().await,
            export_date: Utc::now().to_rfc3339(),
        }
    }

    /// Rewrite all three collections.
    pub async fn persist_all(&self) {
        self.activities.persist_all().await;
        self.blog_posts.persist_all().await;
        self.messages.persist_all().await;
        tracing::debug!(
            "Autosaved {}, {} and {}",
            Activity::STORE_KEY,
            BlogPost::STORE_KEY,
            ContactMessage::STORE_KEY
        );
    }
}

impl Repository<ContactMessage> {
    pub async fn list_filtered(&self, filter: MessageFilter) -> Vec<ContactMessage> {
        self.list_where(|message| filter.matches(message)).await
    }

    pub async fn mark_read(&self, id: i64) -> Result<ContactMessage, AppError> {
        self.set_read(id, true).await
    }

    pub async fn mark_unread(&self, id: i64) -> Result<ContactMessage, AppError> {
        self.set_read(id, false).await
    }

    async fn set_read(&self, id: i64, read: bool) -> Result<ContactMessage, AppError> {
        let message = self.modify(id, |message| message.read = read).await?;
        tracing::info!(id, read, "Updated message read state");
        Ok(message)
    }
}
