//! Models and collections addressed under another, already-persisted model.

use super::{model_uri, Attributes, Model};
use crate::constants::ANNOTATION_CLASS_NAME;
use crate::errors::ModelError;
use crate::types::{DomainClassName, ModelId};

/// Snapshot of the owner of a domain-scoped model or collection.
///
/// The owner's class and id are copied when the snapshot is taken: later
/// changes to the owner do not move the models attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain {
    class_name: DomainClassName,
    ident: ModelId,
    annotation: bool,
}

impl Domain {
    /// Take a snapshot of `owner`, which must have been fetched or saved before.
    pub fn of<O: Model>(owner: &O) -> Result<Self, ModelError> {
        let ident = owner
            .id()
            .ok_or_else(|| ModelError::UnsavedOwner(owner.kind().to_string()))?;
        Ok(Self {
            class_name: owner.domain_class_name(),
            ident,
            annotation: owner.kind() == ANNOTATION_CLASS_NAME,
        })
    }

    /// Snapshot of an owner known only by its class and id.
    pub fn new(class_name: DomainClassName, ident: ModelId) -> Self {
        let annotation = class_name.as_str() == ANNOTATION_CLASS_NAME;
        Self {
            class_name,
            ident,
            annotation,
        }
    }

    pub fn class_name(&self) -> &DomainClassName {
        &self.class_name
    }

    pub fn ident(&self) -> ModelId {
        self.ident
    }

    /// Whether the owner is an annotation, for which some endpoints
    /// are not under `domain/`. The server-sent class of an annotation
    /// (`UserAnnotation`, `AlgoAnnotation`...) does not matter.
    pub fn is_annotation(&self) -> bool {
        self.annotation
    }

    /// Nest `uri` under `annotation/<ident>/` if the owner is an annotation,
    /// under `domain/<class>/<ident>/` otherwise.
    pub fn nest_unless_annotation(&self, uri: &str) -> String {
        if self.annotation {
            format!("{}/{}/{}", ANNOTATION_CLASS_NAME, self.ident, uri)
        } else {
            self.nest(uri)
        }
    }

    /// Nest `uri` under `domain/<class>/<ident>/`.
    pub fn nest(&self, uri: &str) -> String {
        format!("domain/{}/{}/{}", self.class_name, self.ident, uri)
    }

    /// `domain/<class>/<ident>/<kind>.json` or `domain/<class>/<ident>/<kind>/<id>.json`.
    pub fn model_uri(&self, kind: &str, id: Option<ModelId>) -> String {
        self.nest(&model_uri(kind, id))
    }

    /// The server expects the owner in the body of attached models.
    pub(crate) fn write_to(&self, json: &mut Attributes) {
        json.insert(
            "domainClassName".to_string(),
            self.class_name.as_str().into(),
        );
        json.insert("domainIdent".to_string(), self.ident.0.into());
    }
}

/// Placeholder kept by a model while [Model::populate] rebuilds it.
impl Default for Domain {
    fn default() -> Self {
        Self {
            class_name: DomainClassName::new(String::new()),
            ident: ModelId(0),
            annotation: false,
        }
    }
}

/// A model owned by another model.
pub trait Attached: Model {
    /// A blank model attached to `domain`.
    fn attach(domain: Domain) -> Self;

    fn domain(&self) -> &Domain;

    /// A blank model attached to `owner`, which must have been fetched or
    /// saved before.
    fn of<O: Model>(owner: &O) -> Result<Self, ModelError> {
        Domain::of(owner).map(Self::attach)
    }
}
