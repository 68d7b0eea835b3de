//! In-memory [Transport] which records requests and answers them with a
//! handler closure.

use async_trait::async_trait;
use camino::Utf8Path;
use cytomine::errors::TransportError;
use cytomine::query::QueryParameters;
use cytomine::Transport;
use serde_json::{json, Value};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Download,
    Upload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub uri: String,
    pub body: Option<Value>,
    pub query: QueryParameters,
}

type Handler = dyn Fn(&Request) -> Result<Value, TransportError> + Send + Sync;

pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<Request>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new(
        handler: impl Fn(&Request) -> Result<Value, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with `{}`.
    pub fn ok() -> Self {
        Self::new(|_| Ok(json!({})))
    }

    /// Answers page requests of `total` items with the slice at `offset`
    /// of length `max`. Elements have the ids `0..total`.
    pub fn paged(total: u64) -> Self {
        Self::new(move |request| {
            let param = |key: &str| {
                request
                    .query
                    .get(key)
                    .and_then(|v| v.to_string().parse::<u64>().ok())
                    .unwrap_or(0)
            };
            let (max, offset) = (param("max"), param("offset"));
            let end = if max == 0 { total } else { offset.saturating_add(max).min(total) };
            let collection: Vec<Value> = (offset..end).map(|id| json!({"id": id})).collect();
            Ok(json!({"size": total, "collection": collection}))
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        query: &QueryParameters,
    ) -> Result<Value, TransportError> {
        let request = Request {
            method,
            uri: uri.to_string(),
            body: body.cloned(),
            query: query.clone(),
        };
        let response = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        response
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, uri: &str, query: &QueryParameters) -> Result<Value, TransportError> {
        self.call(Method::Get, uri, None, query)
    }

    async fn post(
        &self,
        uri: &str,
        body: Option<&Value>,
        query: &QueryParameters,
    ) -> Result<Value, TransportError> {
        self.call(Method::Post, uri, body, query)
    }

    async fn put(&self, uri: &str, body: &Value) -> Result<Value, TransportError> {
        self.call(Method::Put, uri, Some(body), &QueryParameters::new())
    }

    async fn delete(&self, uri: &str) -> Result<(), TransportError> {
        self.call(Method::Delete, uri, None, &QueryParameters::new())
            .map(|_| ())
    }

    async fn download_file(
        &self,
        uri: &str,
        destination: &Utf8Path,
        _overwrite: bool,
        query: &QueryParameters,
    ) -> Result<(), TransportError> {
        let body = json!(destination.as_str());
        self.call(Method::Download, uri, Some(&body), query)
            .map(|_| ())
    }

    /// The body of the recorded request is the path of the file.
    async fn upload_file(
        &self,
        uri: &str,
        file: &Utf8Path,
        query: &QueryParameters,
    ) -> Result<Value, TransportError> {
        let body = json!(file.as_str());
        self.call(Method::Upload, uri, Some(&body), query)
    }
}

/// A `500` answer.
#[allow(dead_code)]
pub fn server_error(text: &str) -> TransportError {
    TransportError::Status {
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        reason: "Internal Server Error",
        text: text.to_string(),
    }
}
