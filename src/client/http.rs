//! HTTP core shared by every portal wrapper.
//!
//! One wrapper call is one request: no retries, no caching. Non-OK responses
//! become [`ClientError::Api`] carrying the body's `message`, or a per-call
//! fallback that names the HTTP status.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::config::ClientConfig;
use super::error::{ClientError, ClientResult};
use crate::api::DataResponse;
use crate::middleware::RequestIdExt;

/// Client for the portal REST API.
#[derive(Clone)]
pub struct PortalClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    timeout: Duration,
}

/// Only `message` matters; other fields of the error body are ignored.
#[derive(Debug, Deserialize)]
struct CuerpoError {
    message: String,
}

/// Message for a failed call: the body's `message` when present, else
/// `"{contexto}: {status text}"`.
pub(crate) fn mensaje_error(status: StatusCode, cuerpo: &[u8], contexto: &str) -> String {
    match serde_json::from_slice::<CuerpoError>(cuerpo) {
        Ok(cuerpo) if !cuerpo.message.trim().is_empty() => cuerpo.message,
        _ => format!(
            "{contexto}: {}",
            status.canonical_reason().unwrap_or_else(|| status.as_str())
        ),
    }
}

impl PortalClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        // Per-request timeouts are set in `request`; the event stream stays open
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|source| ClientError::Network {
                contexto: "No se pudo crear el cliente HTTP".to_string(),
                source,
            })?;

        // A trailing slash makes `join` append instead of replacing the last segment
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            ClientError::InvalidArgument(format!("URL base inválida '{}': {e}", config.base_url))
        })?;

        info!(base_url = %base_url, "Portal client initialized");

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
            timeout,
        })
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::new(&ClientConfig::from_env())
    }

    /// Same connection pool, different bearer token.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
            timeout: self.timeout,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidArgument(format!("Ruta inválida '{path}': {e}")))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        Ok(self.request_stream(method, path)?.timeout(self.timeout))
    }

    /// Like [`request`](Self::request) but without a total timeout, for
    /// long-lived responses.
    pub(crate) fn request_stream(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, "Portal request");

        let req = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    /// Send and return the raw response when its status is OK.
    pub(crate) async fn ejecutar(&self, req: RequestBuilder, contexto: &str) -> ClientResult<Response> {
        let response = req.send().await.map_err(|source| {
            warn!(error = %source, contexto, "Portal request failed");
            ClientError::Network {
                contexto: contexto.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let request_id = response.headers().request_id().map(str::to_string);
        let cuerpo = response.bytes().await.unwrap_or_default();
        let message = mensaje_error(status, &cuerpo, contexto);

        warn!(
            status = status.as_u16(),
            request_id = request_id.as_deref().unwrap_or("-"),
            message = %message,
            "Portal API error"
        );

        Err(ClientError::Api { status, message })
    }

    /// Send and decode a JSON body.
    pub(crate) async fn enviar<R: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        contexto: &str,
    ) -> ClientResult<R> {
        self.ejecutar(req, contexto)
            .await?
            .json::<R>()
            .await
            .map_err(|source| ClientError::Decode {
                contexto: contexto.to_string(),
                source,
            })
    }

    /// GET with query parameters, unwrapping `{ "data": … }`.
    pub(crate) async fn get_data<Q, R>(&self, path: &str, query: &Q, contexto: &str) -> ClientResult<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.request(Method::GET, path)?.query(query);
        let envelope: DataResponse<R> = self.enviar(req, contexto).await?;
        Ok(envelope.data)
    }

    /// GET without query parameters, unwrapping `{ "data": … }`.
    pub(crate) async fn get_todo<R: DeserializeOwned>(&self, path: &str, contexto: &str) -> ClientResult<R> {
        let req = self.request(Method::GET, path)?;
        let envelope: DataResponse<R> = self.enviar(req, contexto).await?;
        Ok(envelope.data)
    }

    /// Request with a JSON body, unwrapping `{ "data": … }`.
    pub(crate) async fn json_data<B, R>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        contexto: &str,
    ) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let req = self.request(method, path)?.json(body);
        let envelope: DataResponse<R> = self.enviar(req, contexto).await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_message_wins() {
        let cuerpo = serde_json::to_vec(&serde_json::json!({
            "code": "BAD_REQUEST",
            "message": "RFC inválido",
        }))
        .unwrap();
        let msg = mensaje_error(StatusCode::BAD_REQUEST, &cuerpo, "Error al registrar proveedor");
        assert_eq!(msg, "RFC inválido");
    }

    #[test]
    fn unparsable_body_falls_back_to_status_text() {
        let msg = mensaje_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            b"<html>boom</html>",
            "Error al obtener proveedores",
        );
        assert_eq!(msg, "Error al obtener proveedores: Internal Server Error");
    }

    #[test]
    fn empty_message_falls_back_too() {
        let msg = mensaje_error(StatusCode::NOT_FOUND, br#"{"message":""}"#, "Error al obtener bases");
        assert_eq!(msg, "Error al obtener bases: Not Found");
    }

    #[test]
    fn paths_join_below_base_path() {
        let client = PortalClient::new(&ClientConfig::new("http://portal.local/backend")).unwrap();
        let url = client.url("/api/proveedores").unwrap();
        assert_eq!(url.as_str(), "http://portal.local/backend/api/proveedores");
    }
}
