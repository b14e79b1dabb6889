use std::sync::Arc;
use tracing::{info, instrument, warn};
use zeroize::Zeroizing;

use super::{
    endpoints::Endpoint,
    payment::{PaymentConfirmer, PaymentStatus},
    types::{
        AccessStatus, CredentialsRequest, ForgotPasswordRequest, MessageResponse,
        PaymentPreparation, PreviewRow, ResetPasswordRequest,
    },
};
use crate::{
    config::ClientConfig,
    session::{SessionManager, SessionSnapshot},
    shared::AppError,
    transport::{ApiResponse, ReqwestTransport, RequestOptions},
    validation,
};

/// High-level client for the Insight API.
///
/// Every call goes through the shared `SessionManager`, so a forced logout
/// triggered here is visible to all other holders of the manager.
#[derive(Clone)]
pub struct InsightClient {
    session: Arc<SessionManager>,
}

impl InsightClient {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Builds a client with a `reqwest` transport for the configured API
    pub fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
        let session = SessionManager::builder(config.base_url.clone(), transport).build()?;
        Ok(Self::new(Arc::new(session)))
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionSnapshot, AppError> {
        self.session.login(email, password).await
    }

    pub fn logout(&self) {
        self.session.logout()
    }

    /// Creates an account
    #[instrument(skip(self, password, confirmation))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<(), AppError> {
        validation::validate_email(email)?;
        validation::validate_password_match(password, confirmation)?;
        validation::validate_password(password)?;

        let options = RequestOptions::new(Endpoint::Register.method())
            .json(&CredentialsRequest { email, password })?;
        let response = self
            .session
            .send_unauthenticated(Endpoint::Register.path(), options)
            .await?;
        expect_success(response, "Registration failed.")?;

        info!("Account registered");
        Ok(())
    }

    /// Asks the API to email a password reset link. Returns the server's message.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<String, AppError> {
        validation::validate_email(email)?;

        let options = RequestOptions::new(Endpoint::ForgotPassword.method())
            .json(&ForgotPasswordRequest { email })?;
        let response = self
            .session
            .send_unauthenticated(Endpoint::ForgotPassword.path(), options)
            .await?;
        let response = expect_success(response, "Failed to send reset link.")?;

        Ok(message_or(&response, "Password reset link sent."))
    }

    /// Sets a new password using the token from a reset link
    #[instrument(skip(self, token, password, confirmation))]
    pub async fn reset_password(
        &self,
        token: Option<&str>,
        password: &str,
        confirmation: &str,
    ) -> Result<String, AppError> {
        let token = validation::validate_reset_token(token)?;
        validation::validate_password_match(password, confirmation)?;
        validation::validate_password(password)?;

        let options = RequestOptions::new(Endpoint::ResetPassword.method())
            .json(&ResetPasswordRequest { token, password })?;
        let response = self
            .session
            .send_unauthenticated(Endpoint::ResetPassword.path(), options)
            .await?;
        let response = expect_success(response, "Failed to reset password.")?;

        info!("Password reset");
        Ok(message_or(&response, "Password has been reset."))
    }

    /// Fetches the preview rows. Sent with credentials when logged in.
    #[instrument(skip(self))]
    pub async fn preview_data(&self) -> Result<Vec<PreviewRow>, AppError> {
        let response = self
            .session
            .request(
                Endpoint::PreviewData.path(),
                RequestOptions::new(Endpoint::PreviewData.method()),
            )
            .await?;
        let response = expect_success(response, "Failed to load preview data.")?;

        let rows: Vec<PreviewRow> = response.json()?;
        info!(rows = rows.len(), "Preview data loaded");
        Ok(rows)
    }

    /// Whether the logged-in user has purchased access.
    /// Anonymous callers have no access and no request is made.
    #[instrument(skip(self))]
    pub async fn verify_access(&self) -> Result<bool, AppError> {
        if !self.session.is_authenticated() {
            return Ok(false);
        }

        let response = self
            .session
            .request(
                Endpoint::VerifyAccess.path(),
                RequestOptions::new(Endpoint::VerifyAccess.method()),
            )
            .await?;
        let response = expect_success(response, "Failed to verify access.")?;

        let status: AccessStatus = response.json()?;
        info!(has_access = status.has_access, "Access verified");
        Ok(status.has_access)
    }

    /// Creates the account and payment intent; returns the processor client secret
    #[instrument(skip(self, password))]
    pub async fn prepare_payment(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Zeroizing<String>, AppError> {
        validation::validate_credentials_present(email, password)?;

        let options = RequestOptions::new(Endpoint::PreparePayment.method())
            .json(&CredentialsRequest { email, password })?;
        let response = self
            .session
            .send_unauthenticated(Endpoint::PreparePayment.path(), options)
            .await?;
        let response = expect_success(response, "Failed to prepare payment.")?;

        let preparation: PaymentPreparation = response.json()?;
        match preparation.client_secret {
            Some(secret) if !secret.is_empty() => Ok(Zeroizing::new(secret)),
            _ => Err(AppError::InvalidResponse(
                "Server did not return a client secret after preparation.".to_string(),
            )),
        }
    }

    /// Buys lifetime access: prepares the payment, has `confirmer` charge the
    /// card, then logs in with the same credentials.
    #[instrument(skip(self, password, confirmer))]
    pub async fn checkout(
        &self,
        email: &str,
        password: &str,
        confirmer: &dyn PaymentConfirmer,
    ) -> Result<SessionSnapshot, AppError> {
        let client_secret = self.prepare_payment(email, password).await?;

        let status = confirmer
            .confirm_card_payment(client_secret.as_str(), email)
            .await?;

        if status != PaymentStatus::Succeeded {
            warn!(status = %status, "Payment not completed");
            return Err(AppError::Payment(format!(
                "Payment status: {}. Please follow any additional instructions.",
                status
            )));
        }

        info!("Payment succeeded, logging in");
        self.session.login(email, password).await
    }
}

/// Passes successful responses through; everything else becomes `Rejected`
/// with the server's message, or `fallback` if it sent none.
fn expect_success(response: ApiResponse, fallback: &str) -> Result<ApiResponse, AppError> {
    if response.is_success() {
        return Ok(response);
    }
    let message = response
        .error_message()
        .unwrap_or_else(|| fallback.to_string());
    warn!(status = response.status.as_u16(), message = %message, "Request rejected");
    Err(AppError::rejected(response.status.as_u16(), message))
}

fn message_or(response: &ApiResponse, fallback: &str) -> String {
    response
        .json::<MessageResponse>()
        .ok()
        .map(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
