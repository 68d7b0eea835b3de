use crate::collection::{Collection, Listed, Listing};
use crate::errors::ModelError;
use crate::model::{record_model, Attributes, Fields, Model};
use crate::transport::{into_attributes, Transport};
use crate::types::ModelId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ontology {
    #[serde(flatten)]
    pub fields: Fields,
    pub user: Option<ModelId>,
    pub title: Option<String>,
    pub is_folder: Option<bool>,
    pub key: Option<String>,
    /// Tree of terms, as sent by the server.
    pub children: Option<Value>,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type OntologyCollection = Collection<Ontology>;

impl Ontology {
    pub fn new(name: impl Into<String>) -> Self {
        let mut ontology = Self::default();
        ontology.fields.name = Some(name.into());
        ontology
    }
}

impl Model for Ontology {
    record_model!("ontology");
}

impl Listed for Ontology {
    fn listing() -> Listing {
        Listing::new("ontology")
    }
}

/// A class of annotations, in an ontology.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Term {
    #[serde(flatten)]
    pub fields: Fields,
    pub ontology: Option<ModelId>,
    pub parent: Option<ModelId>,
    /// HTML color, e.g. `#FF0000`.
    pub color: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type TermCollection = Collection<Term>;

impl Term {
    pub fn new(name: impl Into<String>, ontology: ModelId, color: impl Into<String>) -> Self {
        let mut term = Self {
            ontology: Some(ontology),
            color: Some(color.into()),
            ..Default::default()
        };
        term.fields.name = Some(name.into());
        term
    }
}

impl Model for Term {
    record_model!("term");
}

impl Listed for Term {
    fn listing() -> Listing {
        Listing::new("term").filters(&["project", "ontology", "annotation"])
    }
}

/// Parent-child relation between two terms, addressed by the pair of terms.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RelationTerm {
    #[serde(flatten)]
    pub fields: Fields,
    pub term1: Option<ModelId>,
    pub term2: Option<ModelId>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl RelationTerm {
    pub fn new(parent: ModelId, child: ModelId) -> Self {
        Self {
            term1: Some(parent),
            term2: Some(child),
            ..Default::default()
        }
    }

    fn pair_uri(&self, action: &'static str) -> Result<String, ModelError> {
        let term1 = self.term1.ok_or(ModelError::MissingKey {
            action,
            key: "term 1 ID",
        })?;
        let term2 = self.term2.ok_or(ModelError::MissingKey {
            action,
            key: "term 2 ID",
        })?;
        Ok(format!("relation/parent/term1/{}/term2/{}.json", term1, term2))
    }

    /// Fetch the relation between `term1` and `term2`, which default to the
    /// terms of this relation.
    pub async fn fetch_pair(
        &mut self,
        transport: &dyn Transport,
        term1: Option<ModelId>,
        term2: Option<ModelId>,
    ) -> Result<(), ModelError> {
        let mut pair = self.clone();
        pair.term1 = term1.or(self.term1);
        pair.term2 = term2.or(self.term2);
        let uri = pair.pair_uri("fetch")?;
        let body = transport.get(&uri, &self.query_parameters()).await?;
        pair.populate(into_attributes(body)?)?;
        *self = pair;
        Ok(())
    }
}

#[async_trait]
impl Model for RelationTerm {
    record_model!("relationterm");

    fn uri(&self) -> String {
        match self.pair_uri("address") {
            Ok(uri) if !self.is_new() => uri,
            _ => "relation/parent/term.json".to_string(),
        }
    }

    /// Relations have no URI by ID: `id` is ignored, see [RelationTerm::fetch_pair].
    async fn fetch(
        &mut self,
        transport: &dyn Transport,
        _id: Option<ModelId>,
    ) -> Result<(), ModelError> {
        self.fetch_pair(transport, None, None).await
    }

    async fn update(
        &mut self,
        _transport: &dyn Transport,
        _id: Option<ModelId>,
        _attributes: Attributes,
    ) -> Result<(), ModelError> {
        Err(ModelError::NotImplemented("Cannot update a relation-term."))
    }

    async fn delete(
        &mut self,
        transport: &dyn Transport,
        _id: Option<ModelId>,
    ) -> Result<(), ModelError> {
        let uri = self.pair_uri("delete")?;
        transport.delete(&uri).await?;
        log::info!("relationterm {} deleted", uri);
        Ok(())
    }
}
