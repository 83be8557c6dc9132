use std::sync::Arc;

use models::{BankAccount, BankAccountInput, CommissionData, Payment, PaymentDecision, PaymentReview, PaymentSubmission};
use tracing::instrument;

use super::unwrap_data;
use crate::errors::ClientError;
use crate::http::request::segment;
use crate::http::{ApiRequest, Dispatcher};

/// Driver commission payments and the bank accounts they are paid into.
/// Admin-only operations are enforced by the backend.
#[derive(Clone)]
pub struct PaymentsApi {
    dispatcher: Arc<Dispatcher>,
}

impl PaymentsApi {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self { Self { dispatcher } }

    pub async fn bank_accounts(&self) -> Result<Vec<BankAccount>, ClientError> {
        let resp = self.dispatcher.send(ApiRequest::get("/api/payments/bank-accounts").authenticated()).await?;
        unwrap_data(resp)
    }

    pub async fn create_bank_account(&self, input: &BankAccountInput) -> Result<BankAccount, ClientError> {
        input.validate()?;
        let req = ApiRequest::post("/api/payments/bank-accounts").authenticated().json(input)?;
        unwrap_data(self.dispatcher.send(req).await?)
    }

    pub async fn update_bank_account(&self, account_id: &str, input: &BankAccountInput) -> Result<BankAccount, ClientError> {
        input.validate()?;
        let path = format!("/api/payments/bank-accounts/{}", segment("accountId", account_id)?);
        let req = ApiRequest::put(path).authenticated().json(input)?;
        unwrap_data(self.dispatcher.send(req).await?)
    }

    pub async fn delete_bank_account(&self, account_id: &str) -> Result<(), ClientError> {
        let path = format!("/api/payments/bank-accounts/{}", segment("accountId", account_id)?);
        self.dispatcher.send(ApiRequest::delete(path).authenticated()).await?;
        Ok(())
    }

    /// Commission owed for one order, with the accounts to pay it into.
    pub async fn commission(&self, order_id: &str) -> Result<CommissionData, ClientError> {
        let path = format!("/api/payments/commission/{}", segment("orderId", order_id)?);
        let resp = self.dispatcher.send(ApiRequest::get(path).authenticated()).await?;
        unwrap_data(resp)
    }

    #[instrument(skip(self, submission), fields(amount = submission.amount))]
    pub async fn submit(&self, order_id: &str, submission: &PaymentSubmission) -> Result<Payment, ClientError> {
        submission.validate()?;
        let path = format!("/api/payments/submit/{}", segment("orderId", order_id)?);
        let req = ApiRequest::post(path).authenticated().json(submission)?;
        unwrap_data(self.dispatcher.send(req).await?)
    }

    /// Confirm or reject a submitted payment (`PUT /api/payments/confirm/{id}`).
    #[instrument(skip(self, note))]
    pub async fn review(
        &self,
        payment_id: &str,
        decision: PaymentDecision,
        note: Option<String>,
    ) -> Result<Payment, ClientError> {
        let path = format!("/api/payments/confirm/{}", segment("paymentId", payment_id)?);
        let req = ApiRequest::put(path).authenticated().json(&PaymentReview::new(decision, note))?;
        unwrap_data(self.dispatcher.send(req).await?)
    }

    pub async fn confirm(&self, payment_id: &str) -> Result<Payment, ClientError> {
        self.review(payment_id, PaymentDecision::Confirm, None).await
    }

    pub async fn reject(&self, payment_id: &str, note: impl Into<String>) -> Result<Payment, ClientError> {
        self.review(payment_id, PaymentDecision::Reject, Some(note.into())).await
    }
}
