use reqwest::Method;

/// The API endpoints this client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Refresh,
    Register,
    ForgotPassword,
    ResetPassword,
    PreviewData,
    VerifyAccess,
    PreparePayment,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::Login,
        Endpoint::Refresh,
        Endpoint::Register,
        Endpoint::ForgotPassword,
        Endpoint::ResetPassword,
        Endpoint::PreviewData,
        Endpoint::VerifyAccess,
        Endpoint::PreparePayment,
    ];

    /// Path relative to the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Login => "/api/login",
            Endpoint::Refresh => "/api/refresh",
            Endpoint::Register => "/api/register",
            Endpoint::ForgotPassword => "/api/forgot-password",
            Endpoint::ResetPassword => "/api/reset-password",
            Endpoint::PreviewData => "/api/preview-data",
            Endpoint::VerifyAccess => "/api/verify-access",
            Endpoint::PreparePayment => "/api/prepare-payment",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::PreviewData => Method::GET,
            _ => Method::POST,
        }
    }
}
