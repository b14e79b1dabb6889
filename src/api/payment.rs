use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::AppError;

/// Final state of a card confirmation, as reported by the payment processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Processing,
    RequiresAction,
    RequiresPaymentMethod,
    Canceled,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Processing => "processing",
            PaymentStatus::RequiresAction => "requires_action",
            PaymentStatus::RequiresPaymentMethod => "requires_payment_method",
            PaymentStatus::Canceled => "canceled",
        };
        f.write_str(text)
    }
}

/// Confirms a card payment with the external processor.
///
/// Implementations own the card details; this crate only hands over the
/// client secret issued by `/api/prepare-payment`. A declined card should be
/// reported as `AppError::Payment` carrying the processor's message.
#[async_trait]
pub trait PaymentConfirmer: Send + Sync {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        email: &str,
    ) -> Result<PaymentStatus, AppError>;
}
