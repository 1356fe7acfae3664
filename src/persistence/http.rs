//! Document store over the browser `fetch` API
//!
//! Requests carry the session's bearer token and JSON bodies. Response bodies
//! are decoded by plain functions so the wire handling is testable without a
//! browser.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use super::store::{DocumentRecord, DocumentStore, StoreError, NEW_DOCUMENT_TITLE};

pub struct FetchStore {
    documents_url: String,
    token: Option<String>,
}

impl FetchStore {
    /// `documents_url` is the collection endpoint, e.g. `/api/v1/documents`
    pub fn new(documents_url: impl Into<String>, token: Option<String>) -> Self {
        Self { documents_url: documents_url.into(), token }
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.documents_url, id)
    }

    async fn request(&self, method: &str, url: &str, body: Option<String>) -> Result<(u16, String), StoreError> {
        log::debug!("{} {}", method, url);
        let window = web_sys::window().ok_or_else(|| StoreError::Network("no window available".to_string()))?;

        let mut request_init = RequestInit::new();
        request_init.method(method);
        request_init.mode(RequestMode::Cors);

        let headers = Headers::new().map_err(js_network_error)?;
        headers.set("Accept", "application/json").map_err(js_network_error)?;
        if let Some(token) = &self.token {
            headers.set("Authorization", &format!("Bearer {}", token)).map_err(js_network_error)?;
        }
        if let Some(body) = &body {
            headers.set("Content-Type", "application/json").map_err(js_network_error)?;
            request_init.body(Some(&JsValue::from_str(body)));
        }
        request_init.headers(&headers);

        let request = Request::new_with_str_and_init(url, &request_init).map_err(js_network_error)?;
        let response_js = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_network_error)?;
        let response: Response = response_js.dyn_into().map_err(js_network_error)?;

        let status = response.status();
        let text_js = JsFuture::from(response.text().map_err(js_network_error)?)
            .await
            .map_err(js_network_error)?;
        Ok((status, text_js.as_string().unwrap_or_default()))
    }
}

fn js_network_error(err: JsValue) -> StoreError {
    StoreError::Network(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

// ============================================================================
// Response decoding
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Wrapped {
        #[serde(default)]
        documents: Option<Vec<DocumentRecord>>,
    },
    Bare(Vec<DocumentRecord>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordBody {
    Wrapped { document: DocumentRecord },
    Bare(DocumentRecord),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Map a non-2xx response to a `StoreError`
pub(crate) fn error_from_response(status: u16, body: &str, what: &str) -> StoreError {
    if status == 404 {
        return StoreError::NotFound(what.to_string());
    }
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error: Some(error), details: Some(details) }) => format!("{}: {}", error, details),
        Ok(ErrorBody { error: Some(error), details: None }) => error,
        _ if body.trim().is_empty() => "request failed".to_string(),
        _ => body.trim().to_string(),
    };
    StoreError::Server { status, message }
}

/// Decode a `GET /documents` response; 404 means no documents yet
pub(crate) fn decode_list(status: u16, body: &str) -> Result<Vec<DocumentRecord>, StoreError> {
    if status == 404 {
        return Ok(Vec::new());
    }
    if !is_success(status) {
        return Err(error_from_response(status, body, "documents"));
    }
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<ListBody>(body) {
        Ok(ListBody::Wrapped { documents }) => Ok(documents.unwrap_or_default()),
        Ok(ListBody::Bare(documents)) => Ok(documents),
        Err(err) => Err(StoreError::Decode(err.to_string())),
    }
}

/// Decode a response carrying a single record
pub(crate) fn decode_record(status: u16, body: &str, what: &str) -> Result<DocumentRecord, StoreError> {
    if !is_success(status) {
        return Err(error_from_response(status, body, what));
    }
    match serde_json::from_str::<RecordBody>(body) {
        Ok(RecordBody::Wrapped { document }) | Ok(RecordBody::Bare(document)) => Ok(document),
        Err(err) => Err(StoreError::Decode(err.to_string())),
    }
}

#[async_trait(?Send)]
impl DocumentStore for FetchStore {
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, StoreError> {
        let (status, body) = self.request("GET", &self.documents_url, None).await?;
        decode_list(status, &body)
    }

    async fn get_document(&self, id: &str) -> Result<DocumentRecord, StoreError> {
        let (status, body) = self.request("GET", &self.document_url(id), None).await?;
        decode_record(status, &body, id)
    }

    async fn create_document(&self, title: &str, content: &str) -> Result<DocumentRecord, StoreError> {
        let payload = json!({ "title": title, "content": content }).to_string();
        let (status, body) = self.request("POST", &self.documents_url, Some(payload)).await?;
        decode_record(status, &body, NEW_DOCUMENT_TITLE)
    }

    async fn update_document(&self, id: &str, content: &str) -> Result<(), StoreError> {
        let payload = json!({ "content": content }).to_string();
        let (status, body) = self.request("PATCH", &self.document_url(id), Some(payload)).await?;
        if !is_success(status) {
            return Err(error_from_response(status, &body, id));
        }
        Ok(())
    }

    async fn delete_document(&self, id: &str) -> Result<(), StoreError> {
        let (status, body) = self.request("DELETE", &self.document_url(id), None).await?;
        if !is_success(status) {
            return Err(error_from_response(status, &body, id));
        }
        Ok(())
    }
}
