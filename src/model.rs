//! Client-side representation of one remote record.
//!
//! ## How It Works
//!
//! Every kind of record (projects, images, properties...) is a struct which
//! derives [serde::Serialize] and [serde::Deserialize], embeds the common
//! [Fields] with `#[serde(flatten)]`, and keeps fields it does not declare in a
//! flattened [Attributes] map. [Model::populate] merges a JSON object into the
//! record, [Model::to_json] produces the JSON object sent to the server.
//! Addressing ([Model::uri]) and the CRUD round-trips (`fetch`, `save`,
//! `update`, `delete`) are provided methods which concrete kinds override
//! where the server deviates from the `<kind>/<id>.json` convention.

pub mod domain;

use crate::errors::ModelError;
use crate::query::QueryParameters;
use crate::transport::{Transport, TransportExt};
use crate::types::{DomainClassName, ModelId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::Debug;

/// A JSON object of attributes.
pub type Attributes = serde_json::Map<String, Value>;

/// Server-managed timestamp. Cytomine sends milliseconds since the epoch,
/// usually as a string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Text(String),
}

/// Attributes common to all models.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Fields {
    /// `None` until the model was created on the server.
    pub id: Option<ModelId>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
    pub deleted: Option<Timestamp>,
    pub name: Option<String>,
    /// The `uri` attribute some records carry. Unrelated to [Model::uri].
    #[serde(rename = "uri")]
    pub remote_uri: Option<String>,
    /// Server-side class of the record, e.g. `be.cytomine.domain.project.Project`.
    #[serde(rename = "class")]
    pub class_name: Option<String>,
}

/// A remote record: a mutable attribute bag which knows its own address.
#[async_trait]
pub trait Model: Serialize + Clone + Debug + Send + Sync + 'static {
    /// Name of the resource in URIs, e.g. `project` or `tag_domain_association`.
    fn kind(&self) -> &str;

    fn fields(&self) -> &Fields;

    fn fields_mut(&mut self) -> &mut Fields;

    /// Merge `attributes` into this model.
    ///
    /// Keys are normalized first: an `id_` prefix is stripped (`id_ontology`
    /// sets `ontology`), `uri_` and `class_` are read as `uri` and `class`,
    /// and keys starting with `_` are dropped. Undeclared keys are kept.
    /// On error, the model is left unchanged.
    fn populate(&mut self, attributes: Attributes) -> Result<&mut Self, ModelError>;

    /// All non-null attributes as a JSON object.
    fn to_json(&self) -> Result<Attributes, ModelError> {
        record_to_json(self)
    }

    fn id(&self) -> Option<ModelId> {
        self.fields().id
    }

    /// Whether this model was never created on the server.
    fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// `<kind>.json` for new models, `<kind>/<id>.json` otherwise.
    fn uri(&self) -> String {
        model_uri(self.kind(), self.id())
    }

    fn query_parameters(&self) -> QueryParameters {
        QueryParameters::new()
    }

    /// Class discriminator used when this model owns domain-scoped models.
    fn domain_class_name(&self) -> DomainClassName {
        match &self.fields().class_name {
            Some(class_name) => DomainClassName::new(class_name.clone()),
            None => DomainClassName::new(self.kind().to_string()),
        }
    }

    /// Fetch this model, by its own ID or by the given `id`.
    async fn fetch(
        &mut self,
        transport: &dyn Transport,
        id: Option<ModelId>,
    ) -> Result<(), ModelError> {
        let id = require_id(self, id, "fetch")?;
        self.fields_mut().id = Some(id);
        let query = self.query_parameters();
        transport.get_model(self, &query).await
    }

    /// Create this model if it is new, otherwise update it.
    async fn save(&mut self, transport: &dyn Transport) -> Result<(), ModelError> {
        if self.is_new() {
            transport.post_model(self).await
        } else {
            self.update(transport, None, Attributes::new()).await
        }
    }

    /// Populate `attributes` (if any) then send this model to the server.
    async fn update(
        &mut self,
        transport: &dyn Transport,
        id: Option<ModelId>,
        attributes: Attributes,
    ) -> Result<(), ModelError> {
        let id = require_id(self, id, "update")?;
        if !attributes.is_empty() {
            self.populate(attributes)?;
        }
        self.fields_mut().id = Some(id);
        transport.put_model(self).await
    }

    async fn delete(
        &mut self,
        transport: &dyn Transport,
        id: Option<ModelId>,
    ) -> Result<(), ModelError> {
        let id = require_id(self, id, "delete")?;
        self.fields_mut().id = Some(id);
        transport.delete_model(self).await
    }
}

/// Either the given `id` or the model's own.
pub(crate) fn require_id<M: Model>(
    model: &M,
    id: Option<ModelId>,
    action: &'static str,
) -> Result<ModelId, ModelError> {
    id.or_else(|| model.id())
        .ok_or(ModelError::MissingId { action })
}

/// `<kind>.json` or `<kind>/<id>.json`.
pub fn model_uri(kind: &str, id: Option<ModelId>) -> String {
    match id {
        None => format!("{}.json", kind),
        Some(id) => format!("{}/{}.json", kind, id),
    }
}

/// Normalized attribute key, or `None` if the key is private.
pub(crate) fn attribute_key(key: &str) -> Option<Cow<'_, str>> {
    let key = key.strip_prefix("id_").unwrap_or(key);
    match key {
        "uri_" => Some(Cow::Borrowed("uri")),
        "class_" => Some(Cow::Borrowed("class")),
        _ if key.starts_with('_') => None,
        _ => Some(Cow::Borrowed(key)),
    }
}

/// Serialize a record to a JSON object, dropping null values.
pub fn record_to_json<R: Serialize + ?Sized>(record: &R) -> Result<Attributes, ModelError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => Err(ModelError::UnexpectedResponse(format!(
            "record serialized to {} instead of an object",
            other
        ))),
    }
}

/// Merge `attributes` into a record by round-tripping it through JSON.
///
/// A value that does not fit its field leaves that field empty (or unchanged,
/// if the field cannot be empty) and the other attributes are still merged.
///
/// Fields marked `#[serde(skip)]` are reset to their default value and must
/// be restored by the caller.
pub fn populate_record<R: Serialize + DeserializeOwned>(
    record: &mut R,
    attributes: Attributes,
) -> Result<(), ModelError> {
    let base = record_to_json(record)?;
    let attributes: Vec<(String, Value)> = attributes
        .into_iter()
        .filter_map(|(key, value)| attribute_key(&key).map(|k| (k.into_owned(), value)))
        .collect();

    let mut merged = base.clone();
    merged.extend(attributes.iter().cloned());
    if let Ok(populated) = serde_json::from_value(Value::Object(merged)) {
        *record = populated;
        return Ok(());
    }

    let mut merged = base;
    for (key, value) in attributes {
        let fits = |candidate: &Value| {
            let mut trial = merged.clone();
            trial.insert(key.clone(), candidate.clone());
            serde_json::from_value::<R>(Value::Object(trial)).is_ok()
        };
        if fits(&value) {
            merged.insert(key, value);
        } else if fits(&Value::Null) {
            log::warn!("attribute {} dropped, {} does not fit", key, value);
            merged.insert(key, Value::Null);
        } else {
            log::warn!("attribute {} ignored, {} does not fit", key, value);
        }
    }
    *record = serde_json::from_value(Value::Object(merged))?;
    Ok(())
}

/// Replace every `{field}` of `pattern` with the value of that field, or `_`
/// if the model has no such field.
pub fn expand_pattern<M: Model>(model: &M, pattern: &str) -> Result<String, ModelError> {
    let json = model.to_json()?;
    let mut expanded = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        expanded.push_str(&rest[..start]);
        let field = &rest[start + 1..start + len];
        match json.get(field) {
            Some(Value::String(s)) => expanded.push_str(s),
            Some(value) => expanded.push_str(&value.to_string()),
            None => expanded.push('_'),
        }
        rest = &rest[start + len + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

/// Implements the attribute-bag methods of [Model] for a struct with a
/// `fields: Fields` member.
///
/// The `domain` form also keeps the struct's `domain` snapshot across
/// [Model::populate].
macro_rules! record_model {
    ($kind:literal) => {
        fn kind(&self) -> &str {
            $kind
        }

        fn fields(&self) -> &$crate::model::Fields {
            &self.fields
        }

        fn fields_mut(&mut self) -> &mut $crate::model::Fields {
            &mut self.fields
        }

        fn populate(
            &mut self,
            attributes: $crate::model::Attributes,
        ) -> Result<&mut Self, $crate::errors::ModelError> {
            $crate::model::populate_record(self, attributes)?;
            Ok(self)
        }
    };
    (domain $kind:literal) => {
        fn kind(&self) -> &str {
            $kind
        }

        fn fields(&self) -> &$crate::model::Fields {
            &self.fields
        }

        fn fields_mut(&mut self) -> &mut $crate::model::Fields {
            &mut self.fields
        }

        fn populate(
            &mut self,
            attributes: $crate::model::Attributes,
        ) -> Result<&mut Self, $crate::errors::ModelError> {
            let domain = std::mem::take(&mut self.domain);
            let result = $crate::model::populate_record(self, attributes);
            self.domain = domain;
            result?;
            Ok(self)
        }

        fn to_json(&self) -> Result<$crate::model::Attributes, $crate::errors::ModelError> {
            let mut json = $crate::model::record_to_json(self)?;
            self.domain.write_to(&mut json);
            Ok(json)
        }
    };
}

pub(crate) use record_model;
