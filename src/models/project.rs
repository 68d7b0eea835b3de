use crate::collection::{Collection, Listed, Listing};
use crate::errors::ModelError;
use crate::model::{record_model, require_id, Attributes, Fields, Model};
use crate::query::QueryParameters;
use crate::transport::Transport;
use crate::types::ModelId;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(flatten)]
    pub fields: Fields,
    pub ontology: Option<ModelId>,
    pub ontology_name: Option<String>,
    pub blind_mode: Option<bool>,
    pub number_of_slides: Option<u64>,
    pub number_of_images: Option<u64>,
    pub number_of_annotations: Option<u64>,
    pub number_of_reviewed_annotations: Option<u64>,
    pub is_closed: Option<bool>,
    pub is_read_only: Option<bool>,
    pub hide_users_layers: Option<bool>,
    pub hide_admins_layers: Option<bool>,
    pub admins: Option<Vec<ModelId>>,
    pub users: Option<Vec<ModelId>>,
    pub mode: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type ProjectCollection = Collection<Project>;

impl Project {
    pub fn new(name: impl Into<String>, ontology: Option<ModelId>) -> Self {
        let mut project = Self {
            ontology,
            ..Default::default()
        };
        project.fields.name = Some(name.into());
        project
    }

    fn member_uri(
        &self,
        user: ModelId,
        admin: bool,
        action: &'static str,
    ) -> Result<String, ModelError> {
        let id = require_id(self, None, action)?;
        Ok(if admin {
            format!("project/{}/user/{}/admin.json", id, user)
        } else {
            format!("project/{}/user/{}.json", id, user)
        })
    }

    /// Add a user to this project, as a manager if `admin`.
    pub async fn add_user(
        &self,
        transport: &dyn Transport,
        user: ModelId,
        admin: bool,
    ) -> Result<(), ModelError> {
        let uri = self.member_uri(user, admin, "add a user to")?;
        transport.post(&uri, None, &QueryParameters::new()).await?;
        Ok(())
    }

    /// Remove a user from this project, or only their manager role if `admin`.
    pub async fn delete_user(
        &self,
        transport: &dyn Transport,
        user: ModelId,
        admin: bool,
    ) -> Result<(), ModelError> {
        let uri = self.member_uri(user, admin, "remove a user from")?;
        transport.delete(&uri).await?;
        Ok(())
    }
}

impl Model for Project {
    record_model!("project");
}

impl Listed for Project {
    fn listing() -> Listing {
        Listing::new("project")
            .filters(&["user", "ontology"])
            .read_only("Cannot save a project collection by client.")
    }
}
