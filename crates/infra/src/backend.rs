//! Trusted-backend gateway
//!
//! HTTP adapter for the two backend endpoints the connect flow uses:
//! token exchange and user lookup. Non-2xx statuses are classified so the
//! flow can show the rate-limit and server-outage messages distinctly
//! from the generic connection failure.

use monart_core::ports::{BackendGateway, GatewayError};
use monart_domain::{TokenExchangeResponse, UserLookupResponse};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::http::HttpClient;

/// Request header carrying the exchanged credential on user lookup
const ACCESS_TOKEN_HEADER: &str = "access-token";

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    code: &'a str,
    code_verifier: &'a str,
}

/// Backend gateway over HTTP
pub struct BackendClient {
    http: HttpClient,
    base_url: String,
}

impl BackendClient {
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn read_body<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| GatewayError::MalformedResponse(err.to_string()))
    }
}

#[async_trait::async_trait]
impl BackendGateway for BackendClient {
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenExchangeResponse, GatewayError> {
        let url = self.endpoint("token-exchange");
        debug!(%url, "exchanging authorization code");

        let request = self
            .http
            .request(Method::POST, &url)
            .json(&ExchangeRequest { code, code_verifier });

        let response = self
            .http
            .send(request)
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Self::read_body(response).await
    }

    async fn lookup_user(&self, access_token: &str) -> Result<UserLookupResponse, GatewayError> {
        let url = self.endpoint("user-lookup");
        debug!(%url, "looking up connected user");

        let request = self.http.request(Method::GET, &url).header(ACCESS_TOKEN_HEADER, access_token);

        let response = self
            .http
            .send(request)
            .await
            .map_err(|err| GatewayError::Transport(err.to_string()))?;

        Self::read_body(response).await
    }
}

fn classify_status(status: StatusCode) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        GatewayError::RateLimited
    } else if status.is_server_error() {
        GatewayError::Server(status.as_u16())
    } else {
        GatewayError::Rejected(status.as_u16())
    }
}
