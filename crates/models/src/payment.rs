use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{require_non_empty, ModelError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: String,
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Admin input for creating or replacing a bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountInput {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

impl BankAccountInput {
    pub fn validate(&self) -> Result<(), ModelError> {
        require_non_empty("bankName", &self.bank_name)?;
        require_non_empty("accountName", &self.account_name)?;
        require_non_empty("accountNumber", &self.account_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Rejected,
}

/// Commission owed by a driver for one delivered order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionData {
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_price: Option<f64>,
    pub commission_rate: f64,
    pub commission_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
    pub amount: f64,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Driver's proof of a commission transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSubmission {
    pub bank_account_id: String,
    pub amount: f64,
    pub reference: String,
}

impl PaymentSubmission {
    pub fn validate(&self) -> Result<(), ModelError> {
        require_non_empty("bankAccountId", &self.bank_account_id)?;
        require_non_empty("reference", &self.reference)?;
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ModelError::Validation("amount must be positive".into()));
        }
        Ok(())
    }
}

/// Admin verdict on a submitted payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDecision {
    Confirm,
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReview {
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,
}

impl PaymentReview {
    pub fn new(decision: PaymentDecision, note: Option<String>) -> Self {
        let status = match decision {
            PaymentDecision::Confirm => PaymentStatus::Confirmed,
            PaymentDecision::Reject => PaymentStatus::Rejected,
        };
        Self { status, admin_note: note }
    }
}
