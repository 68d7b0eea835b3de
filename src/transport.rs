//! The session through which models and collections reach the server.
//!
//! [Transport] is the HTTP-shaped capability set: every method takes a URI
//! relative to the API base URL. [TransportExt] builds the model-level
//! round-trips (`get_model`, `post_collection`...) on top of it, so any
//! [Transport] implementation, including test doubles, gets them for free.

pub mod http;

use crate::collection::Collection;
use crate::errors::{ModelError, TransportError};
use crate::model::{Attributes, Model};
use crate::query::QueryParameters;
use async_trait::async_trait;
use camino::Utf8Path;
use serde_json::Value;

/// Network calls against a Cytomine REST API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET` a JSON document.
    async fn get(&self, uri: &str, query: &QueryParameters) -> Result<Value, TransportError>;

    /// `POST` an optional JSON body, returning the JSON response.
    async fn post(
        &self,
        uri: &str,
        body: Option<&Value>,
        query: &QueryParameters,
    ) -> Result<Value, TransportError>;

    /// `PUT` a JSON body, returning the JSON response.
    async fn put(&self, uri: &str, body: &Value) -> Result<Value, TransportError>;

    async fn delete(&self, uri: &str) -> Result<(), TransportError>;

    /// Download the resource at `uri` to `destination`. Unless `overwrite`
    /// is set, an existing `destination` is an error and is left untouched.
    async fn download_file(
        &self,
        uri: &str,
        destination: &Utf8Path,
        overwrite: bool,
        query: &QueryParameters,
    ) -> Result<(), TransportError>;

    /// Upload a local file as a multipart form, returning the JSON response.
    async fn upload_file(
        &self,
        uri: &str,
        file: &Utf8Path,
        query: &QueryParameters,
    ) -> Result<Value, TransportError>;
}

/// Model and collection round-trips.
#[async_trait]
pub trait TransportExt: Transport {
    /// Populate `model` from its own URI.
    async fn get_model<M: Model>(
        &self,
        model: &mut M,
        query: &QueryParameters,
    ) -> Result<(), ModelError> {
        let body = self.get(&model.uri(), query).await?;
        model.populate(into_attributes(body)?)?;
        Ok(())
    }

    /// Create `model` on the server, then populate it from the response,
    /// which assigns its id.
    async fn post_model<M: Model>(&self, model: &mut M) -> Result<(), ModelError> {
        let body = Value::Object(model.to_json()?);
        let response = self
            .post(&model.uri(), Some(&body), &model.query_parameters())
            .await?;
        model.populate(unwrap_response(model.kind(), response)?)?;
        log::info!("{} {} created", model.kind(), display_id(model));
        Ok(())
    }

    async fn put_model<M: Model>(&self, model: &mut M) -> Result<(), ModelError> {
        let body = Value::Object(model.to_json()?);
        let response = self.put(&model.uri(), &body).await?;
        model.populate(unwrap_response(model.kind(), response)?)?;
        log::info!("{} {} updated", model.kind(), display_id(model));
        Ok(())
    }

    async fn delete_model<M: Model>(&self, model: &mut M) -> Result<(), ModelError> {
        self.delete(&model.uri()).await?;
        log::info!("{} {} deleted", model.kind(), display_id(model));
        Ok(())
    }

    /// Fetch one page of `collection`, replacing or extending its elements.
    async fn get_collection<M: Model>(
        &self,
        collection: &mut Collection<M>,
        append: bool,
    ) -> Result<(), ModelError> {
        let uri = collection.fetch_uri()?;
        let body = self.get(&uri, &collection.parameters()).await?;
        collection.populate(body, append)?;
        Ok(())
    }

    /// Create every element of `collection` in a single request.
    async fn post_collection<M: Model>(
        &self,
        collection: &Collection<M>,
    ) -> Result<Value, ModelError> {
        let body = Value::Array(collection.to_json()?);
        let response = self
            .post(
                &collection.uri_without_filters(),
                Some(&body),
                &QueryParameters::new(),
            )
            .await?;
        log::info!("{}", collection);
        Ok(response)
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

/// The server wraps the attributes of a created or updated model under its
/// lowercased kind, e.g. `{"project": {...}, "message": "..."}`.
pub(crate) fn unwrap_response(kind: &str, response: Value) -> Result<Attributes, ModelError> {
    let mut response = into_attributes(response)?;
    match response.remove(&kind.to_lowercase()) {
        Some(Value::Object(attributes)) => Ok(attributes),
        Some(other) => {
            response.insert(kind.to_lowercase(), other);
            Ok(response)
        }
        None => Ok(response),
    }
}

pub(crate) fn into_attributes(body: Value) -> Result<Attributes, ModelError> {
    match body {
        Value::Object(attributes) => Ok(attributes),
        other => Err(ModelError::UnexpectedResponse(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

fn display_id<M: Model>(model: &M) -> String {
    model
        .id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(no id)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_response() {
        let response = json!({"project": {"id": 3, "name": "p"}, "message": "Project added"});
        let attributes = unwrap_response("project", response).unwrap();
        assert_eq!(Value::Object(attributes), json!({"id": 3, "name": "p"}));
    }

    #[test]
    fn test_unwrap_plain_response() {
        let response = json!({"id": 3, "name": "p"});
        let attributes = unwrap_response("project", response.clone()).unwrap();
        assert_eq!(Value::Object(attributes), response);
    }

    #[test]
    fn test_unexpected_response() {
        assert!(matches!(
            into_attributes(json!([1, 2])),
            Err(ModelError::UnexpectedResponse(_))
        ));
    }
}
