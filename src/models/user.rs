use crate::collection::{Collection, Listed, Listing, UriRewrite};
use crate::errors::ModelError;
use crate::model::{populate_record, record_model, require_id, Attributes, Fields, Model};
use crate::query::QueryParameters;
use crate::transport::{Transport, TransportExt};
use crate::types::ModelId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub fields: Fields,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub language: Option<String>,
    pub is_developer: Option<bool>,
    /// Whether this is the user of a job rather than a human.
    pub algo: Option<bool>,
    pub origin: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

/// Users, or the members of a project with the `project` filter. Members
/// are only the managers if the `admin` parameter is set.
pub type UserCollection = Collection<User>;

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    /// Public and private keys of this user. Only allowed to super-admins.
    pub async fn keys(&self, transport: &dyn Transport) -> Result<Value, ModelError> {
        let id = require_id(self, None, "get the keys of")?;
        let keys = transport
            .get(&format!("user/{}/keys.json", id), &QueryParameters::new())
            .await?;
        Ok(keys)
    }
}

impl Model for User {
    record_model!("user");
}

impl Listed for User {
    fn listing() -> Listing {
        Listing::new("user")
            .filters(&["project", "ontology"])
            .rewrite(UriRewrite::ProjectAdmins)
    }
}

/// The user the transport is authenticated as.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
    #[serde(flatten)]
    pub user: User,
}

impl CurrentUser {
    /// Public and private keys of the current user.
    pub async fn keys(&self, transport: &dyn Transport) -> Result<Value, ModelError> {
        let public_key = self.public_key.as_ref().ok_or(ModelError::MissingKey {
            action: "get the keys of",
            key: "public key",
        })?;
        let keys = transport
            .get(
                &format!("userkey/{}/keys.json", public_key),
                &QueryParameters::new(),
            )
            .await?;
        Ok(keys)
    }
}

#[async_trait]
impl Model for CurrentUser {
    fn kind(&self) -> &str {
        "user"
    }

    fn fields(&self) -> &Fields {
        &self.user.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.user.fields
    }

    fn populate(&mut self, attributes: Attributes) -> Result<&mut Self, ModelError> {
        populate_record(self, attributes)?;
        Ok(self)
    }

    fn uri(&self) -> String {
        "user/current.json".to_string()
    }

    /// The current user needs no id: `id` is ignored.
    async fn fetch(
        &mut self,
        transport: &dyn Transport,
        _id: Option<ModelId>,
    ) -> Result<(), ModelError> {
        let query = self.query_parameters();
        transport.get_model(self, &query).await
    }
}

/// A server-managed authority, e.g. `ROLE_ADMIN`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Role {
    #[serde(flatten)]
    pub fields: Fields,
    pub authority: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type RoleCollection = Collection<Role>;

#[async_trait]
impl Model for Role {
    record_model!("role");

    async fn save(&mut self, _transport: &dyn Transport) -> Result<(), ModelError> {
        Err(ModelError::NotImplemented("Cannot save a new role by client."))
    }

    async fn update(
        &mut self,
        _transport: &dyn Transport,
        _id: Option<ModelId>,
        _attributes: Attributes,
    ) -> Result<(), ModelError> {
        Err(ModelError::NotImplemented("Cannot update a role by client."))
    }

    async fn delete(
        &mut self,
        _transport: &dyn Transport,
        _id: Option<ModelId>,
    ) -> Result<(), ModelError> {
        Err(ModelError::NotImplemented("Cannot delete a role by client."))
    }
}

impl Listed for Role {
    fn listing() -> Listing {
        Listing::new("role").read_only("Cannot save a role collection by client.")
    }
}
