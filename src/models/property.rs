//! Kinds attached to an owner record through [Domain].

use super::image::download_model;
use crate::collection::{Collection, Listed, Listing, UriRewrite};
use crate::errors::ModelError;
use crate::model::domain::{Attached, Domain};
use crate::model::{
    model_uri, populate_record, record_model, record_to_json, Attributes, Fields, Model,
};
use crate::query::QueryParameters;
use crate::transport::{into_attributes, unwrap_response, Transport, TransportExt};
use crate::types::{ModelId, PropertyKey};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A key-value pair attached to a record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Property {
    #[serde(flatten)]
    pub fields: Fields,
    #[serde(skip)]
    domain: Domain,
    pub key: Option<PropertyKey>,
    pub value: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type PropertyCollection = Collection<Property>;

impl Property {
    pub fn new<O: Model>(
        owner: &O,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let mut property = Self::of(owner)?;
        property.key = Some(PropertyKey::new(key.into()));
        property.value = Some(value.into());
        Ok(property)
    }

    /// Fetch the property of the owner with the given key, or with this
    /// property's key.
    pub async fn fetch_by_key(
        &mut self,
        transport: &dyn Transport,
        key: Option<PropertyKey>,
    ) -> Result<(), ModelError> {
        let key = key.or_else(|| self.key.clone()).ok_or(ModelError::MissingKey {
            action: "fetch",
            key: "key",
        })?;
        let uri = self
            .domain
            .nest_unless_annotation(&format!("key/{}/property.json", key));
        let body = transport.get(&uri, &self.query_parameters()).await?;
        self.populate(into_attributes(body)?)?;
        self.key = Some(key);
        Ok(())
    }
}

impl Attached for Property {
    fn attach(domain: Domain) -> Self {
        Self {
            fields: Fields::default(),
            domain,
            key: None,
            value: None,
            extra: Attributes::new(),
        }
    }

    fn domain(&self) -> &Domain {
        &self.domain
    }
}

impl Model for Property {
    record_model!(domain "property");

    fn uri(&self) -> String {
        // properties of annotations are not under `domain/`
        self.domain
            .nest_unless_annotation(&model_uri("property", self.id()))
    }
}

impl Listed for Property {
    fn listing() -> Listing {
        Listing::new("property").rewrite(UriRewrite::AnnotationDomain)
    }
}

impl Collection<Property> {
    /// Properties by key. Properties without a key are left out.
    pub fn as_map(&self) -> BTreeMap<PropertyKey, &Property> {
        self.iter()
            .filter_map(|property| property.key.clone().map(|key| (key, property)))
            .collect()
    }
}

/// A file attached to a record, uploaded from [AttachedFile::file].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AttachedFile {
    #[serde(flatten)]
    pub fields: Fields,
    #[serde(skip)]
    domain: Domain,
    /// Local file to upload. If not set, [AttachedFile::filename] is uploaded.
    #[serde(skip)]
    pub file: Option<Utf8PathBuf>,
    pub filename: Option<String>,
    /// Where the server serves the file.
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type AttachedFileCollection = Collection<AttachedFile>;

impl AttachedFile {
    pub fn new<O: Model>(owner: &O, file: &Utf8Path) -> Result<Self, ModelError> {
        let mut attached = Self::of(owner)?;
        attached.filename = file.file_name().map(str::to_string);
        attached.file = Some(file.to_path_buf());
        Ok(attached)
    }

    async fn upload(&mut self, transport: &dyn Transport) -> Result<(), ModelError> {
        let mut query = QueryParameters::new();
        query.insert(
            "domainClassName".to_string(),
            self.domain.class_name().as_str().into(),
        );
        query.insert("domainIdent".to_string(), self.domain.ident().into());
        let path = match (&self.file, &self.filename) {
            (Some(file), filename) => {
                if let Some(filename) = filename {
                    query.insert("filename".to_string(), filename.as_str().into());
                }
                file.clone()
            }
            (None, Some(filename)) => Utf8PathBuf::from(filename),
            (None, None) => {
                return Err(ModelError::MissingKey {
                    action: "upload",
                    key: "file",
                })
            }
        };
        let response = transport
            .upload_file("attachedfile.json", &path, &query)
            .await?;
        self.populate(unwrap_response(self.kind(), response)?)?;
        log::info!("{} uploaded as attachedfile {:?}", path, self.id());
        Ok(())
    }

    /// Download this file to `pattern` with its `{field}` placeholders
    /// replaced, e.g. `{filename}`.
    pub async fn download(
        &self,
        transport: &dyn Transport,
        pattern: &str,
        overwrite: bool,
    ) -> Result<Utf8PathBuf, ModelError> {
        download_model(self, transport, pattern, overwrite, &QueryParameters::new()).await
    }
}

impl Attached for AttachedFile {
    fn attach(domain: Domain) -> Self {
        Self {
            fields: Fields::default(),
            domain,
            file: None,
            filename: None,
            url: None,
            extra: Attributes::new(),
        }
    }

    fn domain(&self) -> &Domain {
        &self.domain
    }
}

#[async_trait]
impl Model for AttachedFile {
    fn kind(&self) -> &str {
        "attachedfile"
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    fn populate(&mut self, attributes: Attributes) -> Result<&mut Self, ModelError> {
        let domain = std::mem::take(&mut self.domain);
        let file = self.file.take();
        let result = populate_record(self, attributes);
        self.domain = domain;
        self.file = file;
        result?;
        Ok(self)
    }

    fn to_json(&self) -> Result<Attributes, ModelError> {
        let mut json = record_to_json(self)?;
        self.domain.write_to(&mut json);
        Ok(json)
    }

    /// Attached files are not nested under their owner.
    fn uri(&self) -> String {
        model_uri(self.kind(), self.id())
    }

    async fn save(&mut self, transport: &dyn Transport) -> Result<(), ModelError> {
        self.upload(transport).await
    }

    async fn update(
        &mut self,
        transport: &dyn Transport,
        _id: Option<ModelId>,
        _attributes: Attributes,
    ) -> Result<(), ModelError> {
        self.upload(transport).await
    }
}

impl Listed for AttachedFile {
    fn listing() -> Listing {
        Listing::new("attachedfile")
    }
}

/// Rich-text description of a record. A record has at most one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Description {
    #[serde(flatten)]
    pub fields: Fields,
    #[serde(skip)]
    domain: Domain,
    pub data: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

impl Description {
    pub fn new<O: Model>(owner: &O, data: impl Into<String>) -> Result<Self, ModelError> {
        let mut description = Self::of(owner)?;
        description.data = Some(data.into());
        Ok(description)
    }
}

impl Attached for Description {
    fn attach(domain: Domain) -> Self {
        Self {
            fields: Fields::default(),
            domain,
            data: None,
            extra: Attributes::new(),
        }
    }

    fn domain(&self) -> &Domain {
        &self.domain
    }
}

#[async_trait]
impl Model for Description {
    record_model!(domain "description");

    /// Addressed by its owner only.
    fn uri(&self) -> String {
        self.domain.nest("description.json")
    }

    /// The description of the owner, whether or not `id` is given.
    async fn fetch(
        &mut self,
        transport: &dyn Transport,
        id: Option<ModelId>,
    ) -> Result<(), ModelError> {
        if id.is_some() {
            self.fields.id = id;
        }
        let query = self.query_parameters();
        transport.get_model(self, &query).await
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Tag {
    #[serde(flatten)]
    pub fields: Fields,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type TagCollection = Collection<Tag>;

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        let mut tag = Self::default();
        tag.fields.name = Some(name.into());
        tag
    }
}

impl Model for Tag {
    record_model!("tag");
}

impl Listed for Tag {
    fn listing() -> Listing {
        Listing::new("tag")
    }
}

/// A [Tag] put on a record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TagDomainAssociation {
    #[serde(flatten)]
    pub fields: Fields,
    #[serde(skip)]
    domain: Domain,
    pub tag: Option<ModelId>,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type TagDomainAssociationCollection = Collection<TagDomainAssociation>;

impl TagDomainAssociation {
    pub fn new<O: Model>(owner: &O, tag: ModelId) -> Result<Self, ModelError> {
        let mut association = Self::of(owner)?;
        association.tag = Some(tag);
        Ok(association)
    }
}

impl Attached for TagDomainAssociation {
    fn attach(domain: Domain) -> Self {
        Self {
            fields: Fields::default(),
            domain,
            tag: None,
            extra: Attributes::new(),
        }
    }

    fn domain(&self) -> &Domain {
        &self.domain
    }
}

impl Model for TagDomainAssociation {
    record_model!(domain "tag_domain_association");

    /// Created under the owner, then addressed by id only.
    fn uri(&self) -> String {
        match self.id() {
            Some(id) => model_uri(self.kind(), Some(id)),
            None => self.domain.model_uri(self.kind(), None),
        }
    }
}

impl Listed for TagDomainAssociation {
    fn listing() -> Listing {
        Listing::new("tag_domain_association")
    }
}
