use std::sync::Arc;

use models::{MarkRead, Notification};

use super::unwrap_data;
use crate::errors::ClientError;
use crate::http::{ApiRequest, Dispatcher};

#[derive(Clone)]
pub struct NotificationsApi {
    dispatcher: Arc<Dispatcher>,
}

impl NotificationsApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self { Self { dispatcher } }

    pub async fn list(&self) -> Result<Vec<Notification>, ClientError> {
        let resp = self.dispatcher.send(ApiRequest::get("/api/notifications").authenticated()).await?;
        unwrap_data(resp)
    }

    pub async fn unread_count(&self) -> Result<usize, ClientError> {
        Ok(self.list().await?.iter().filter(|n| !n.read).count())
    }

    /// Mark the given notifications read; an empty slice marks all of them.
    pub async fn mark_read(&self, ids: &[String]) -> Result<(), ClientError> {
        if ids.iter().any(|id| id.trim().is_empty()) {
            return Err(ClientError::Validation("notification id is required".into()));
        }
        let body = MarkRead { notification_ids: ids.to_vec() };
        let req = ApiRequest::post("/api/notifications/mark-read").authenticated().json(&body)?;
        self.dispatcher.send(req).await?;
        Ok(())
    }
}
