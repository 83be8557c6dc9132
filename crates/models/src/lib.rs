//! Domain records mirrored from the delivery backend.
//!
//! The backend is the system of record; these types only check shape at the
//! boundary so contract drift fails loudly at decode time.

pub mod errors;
pub mod envelope;
pub mod user;
pub mod order;
pub mod payment;
pub mod notification;

pub use envelope::{ApiResponse, ResponseStatus};
pub use errors::ModelError;
pub use notification::{MarkRead, Notification};
pub use order::{NewOrder, Order, OrderDashboard, OrderScope, OrderStats, OrderStatus, OrderUpdate};
pub use payment::{
    BankAccount, BankAccountInput, CommissionData, Payment, PaymentDecision, PaymentReview, PaymentStatus,
    PaymentSubmission,
};
pub use user::{AuthPayload, LoginInput, RegisterInput, Role, User};
