use crate::collection::{Collection, Listed, Listing};
use crate::errors::ModelError;
use crate::model::{expand_pattern, record_model, require_id, Attributes, Fields, Model};
use crate::query::QueryParameters;
use crate::transport::Transport;
use crate::types::ModelId;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// An image file, independently of the projects it is used in.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AbstractImage {
    #[serde(flatten)]
    pub fields: Fields,
    pub filename: Option<String>,
    pub original_filename: Option<String>,
    pub path: Option<String>,
    pub mime: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    /// Micrometers per pixel.
    pub resolution: Option<f64>,
    pub magnification: Option<f64>,
    pub bit_depth: Option<u32>,
    pub colorspace: Option<String>,
    pub thumb: Option<String>,
    pub preview: Option<String>,
    #[serde(flatten)]
    pub extra: Attributes,
}

pub type AbstractImageCollection = Collection<AbstractImage>;

impl AbstractImage {
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            path: Some(filename.clone()),
            filename: Some(filename),
            ..Default::default()
        }
    }

    /// Download the original image, or its parent file if `parent`, to
    /// `pattern` with its `{field}` placeholders replaced.
    pub async fn download(
        &self,
        transport: &dyn Transport,
        pattern: &str,
        overwrite: bool,
        parent: bool,
    ) -> Result<Utf8PathBuf, ModelError> {
        let mut query = QueryParameters::new();
        query.insert("parent".to_string(), parent.into());
        download_model(self, transport, pattern, overwrite, &query).await
    }
}

impl Model for AbstractImage {
    record_model!("abstractimage");
}

impl Listed for AbstractImage {
    fn listing() -> Listing {
        Listing::new("abstractimage")
    }
}

/// An abstract image added to a project.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageInstance {
    #[serde(flatten)]
    pub fields: Fields,
    pub base_image: Option<ModelId>,
    pub project: Option<ModelId>,
    pub user: Option<ModelId>,
    pub filename: Option<String>,
    pub original_filename: Option<String>,
    pub instance_filename: Option<String>,
    pub path: Option<String>,
    pub mime: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub resolution: Option<f64>,
    pub magnification: Option<f64>,
    pub bit_depth: Option<u32>,
    pub colorspace: Option<String>,
    pub thumb: Option<String>,
    pub preview: Option<String>,
    pub number_of_annotations: Option<u64>,
    pub number_of_job_annotations: Option<u64>,
    pub number_of_reviewed_annotations: Option<u64>,
    pub reviewed: Option<bool>,
    #[serde(flatten)]
    pub extra: Attributes,
}

/// Images of a project: needs the `project` filter.
pub type ImageInstanceCollection = Collection<ImageInstance>;

impl ImageInstance {
    pub fn new(base_image: ModelId, project: ModelId) -> Self {
        Self {
            base_image: Some(base_image),
            project: Some(project),
            ..Default::default()
        }
    }

    /// Download the original image, or its parent file if `parent`, to
    /// `pattern` with its `{field}` placeholders replaced.
    pub async fn download(
        &self,
        transport: &dyn Transport,
        pattern: &str,
        overwrite: bool,
        parent: bool,
    ) -> Result<Utf8PathBuf, ModelError> {
        let mut query = QueryParameters::new();
        query.insert("parent".to_string(), parent.into());
        download_model(self, transport, pattern, overwrite, &query).await
    }
}

impl Model for ImageInstance {
    record_model!("imageinstance");
}

impl Listed for ImageInstance {
    fn listing() -> Listing {
        Listing::new("imageinstance")
            .filters(&["project"])
            .filter_required()
            .read_only("Cannot save an imageinstance collection by client.")
    }
}

/// Download `<kind>/<id>/download` to the path obtained by replacing the
/// `{field}` placeholders of `pattern` with the model's fields, e.g.
/// `images/{id}-{originalFilename}`. Returns that path.
pub(crate) async fn download_model<M: Model>(
    model: &M,
    transport: &dyn Transport,
    pattern: &str,
    overwrite: bool,
    query: &QueryParameters,
) -> Result<Utf8PathBuf, ModelError> {
    let id = require_id(model, None, "download")?;
    let destination = Utf8PathBuf::from(expand_pattern(model, pattern)?);
    let uri = format!("{}/{}/download", model.kind(), id);
    transport
        .download_file(&uri, &destination, overwrite, query)
        .await?;
    Ok(destination)
}
