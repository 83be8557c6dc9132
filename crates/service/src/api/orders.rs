use std::sync::Arc;

use models::{NewOrder, Order, OrderDashboard, OrderScope, OrderStatus, OrderUpdate, Role};
use serde_json::json;
use tracing::instrument;

use super::unwrap_data;
use crate::errors::ClientError;
use crate::http::request::segment;
use crate::http::{ApiRequest, Dispatcher};

/// Order endpoints. An order's own `status` (`PENDING`, ...) is never an
/// envelope marker, so single-order bodies decode bare or enveloped.
#[derive(Clone)]
pub struct OrdersApi {
    dispatcher: Arc<Dispatcher>,
}

impl OrdersApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self { Self { dispatcher } }

    fn user_path(role: Role, user_id: &str, suffix: &str) -> Result<String, ClientError> {
        let user_id = segment("userId", user_id)?;
        Ok(format!("/api/orders/{}/{}{}", role.path_segment(), user_id, suffix))
    }

    fn order_path(order_id: &str, suffix: &str) -> Result<String, ClientError> {
        let order_id = segment("orderId", order_id)?;
        Ok(format!("/api/orders/{order_id}{suffix}"))
    }

    /// `GET /api/orders/{role}/{userId}[/current|/history]`
    #[instrument(skip(self))]
    pub async fn list(&self, role: Role, user_id: &str, scope: OrderScope) -> Result<Vec<Order>, ClientError> {
        let path = Self::user_path(role, user_id, scope.suffix())?;
        let resp = self.dispatcher.send(ApiRequest::get(path).authenticated()).await?;
        unwrap_data(resp)
    }

    pub async fn current(&self, role: Role, user_id: &str) -> Result<Vec<Order>, ClientError> {
        self.list(role, user_id, OrderScope::Current).await
    }

    pub async fn history(&self, role: Role, user_id: &str) -> Result<Vec<Order>, ClientError> {
        self.list(role, user_id, OrderScope::History).await
    }

    /// `GET /api/orders/{role}/{userId}/dashboard`
    pub async fn dashboard(&self, role: Role, user_id: &str) -> Result<OrderDashboard, ClientError> {
        let path = Self::user_path(role, user_id, "/dashboard")?;
        let resp = self.dispatcher.send(ApiRequest::get(path).authenticated()).await?;
        unwrap_data(resp)
    }

    /// `GET /api/orders/{id}`
    pub async fn get(&self, order_id: &str) -> Result<Order, ClientError> {
        let path = Self::order_path(order_id, "")?;
        let resp = self.dispatcher.send(ApiRequest::get(path).authenticated()).await?;
        unwrap_data(resp)
    }

    /// `POST /api/orders`
    #[instrument(skip(self, order))]
    pub async fn create(&self, order: &NewOrder) -> Result<Order, ClientError> {
        order.validate()?;
        let req = ApiRequest::post("/api/orders").authenticated().json(order)?;
        unwrap_data(self.dispatcher.send(req).await?)
    }

    /// `PUT /api/orders/{id}`
    pub async fn update(&self, order_id: &str, update: &OrderUpdate) -> Result<Order, ClientError> {
        if update.is_empty() {
            return Err(ClientError::Validation("order update has no fields".into()));
        }
        let req = ApiRequest::put(Self::order_path(order_id, "")?).authenticated().json(update)?;
        unwrap_data(self.dispatcher.send(req).await?)
    }

    /// `PATCH /api/orders/{id}/status`
    #[instrument(skip(self))]
    pub async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<Order, ClientError> {
        let req = ApiRequest::patch(Self::order_path(order_id, "/status")?)
            .authenticated()
            
            .body(json!({ "status": status }));
        unwrap_data(self.dispatcher.send(req).await?)
    }

    /// `PATCH /api/orders/{id}/accept` (driver takes the order)
    #[instrument(skip(self))]
    pub async fn accept(&self, order_id: &str) -> Result<Order, ClientError> {
        let req = ApiRequest::patch(Self::order_path(order_id, "/accept")?).authenticated();
        unwrap_data(self.dispatcher.send(req).await?)
    }

    /// `PATCH /api/orders/{id}/cancel`
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: &str, reason: Option<&str>) -> Result<Order, ClientError> {
        let mut req = ApiRequest::patch(Self::order_path(order_id, "/cancel")?).authenticated();
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            req = req.body(json!({ "reason": reason }));
        }
        unwrap_data(self.dispatcher.send(req).await?)
    }

    /// `DELETE /api/orders/{id}`
    pub async fn delete(&self, order_id: &str) -> Result<(), ClientError> {
        let req = ApiRequest::delete(Self::order_path(order_id, "")?).authenticated();
        self.dispatcher.send(req).await?;
        Ok(())
    }
}
