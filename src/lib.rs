//! Client library for the REST API of a [Cytomine](https://cytomine.com) server.
//!
//! Records of the server are [Model]s: projects, images, ontologies,
//! properties... Lists of records are [Collection]s, fetched page by page and
//! saved in chunks sent concurrently. Both reach the server through a
//! [Transport], normally an [HttpTransport].
//!
//! ```no_run
//! use cytomine::{ApiUrl, HttpTransport, Model, Project, Property, ProjectCollection};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let url = ApiUrl::try_from("https://research.cytomine.be/api/")?;
//! let transport = HttpTransport::build(url)?.build();
//!
//! let mut projects = ProjectCollection::new();
//! projects.fetch(&transport, None).await?;
//!
//! let mut project = Project::new("Lungs", None);
//! project.save(&transport).await?;
//! Property::new(&project, "stain", "HE")?.save(&transport).await?;
//! # Ok(())
//! # }
//! ```

mod collection;
mod config;
mod constants;
pub mod errors;
mod model;
pub mod models;
mod parallel;
pub mod query;
mod transport;
pub mod types;

pub use collection::{Collection, Listed, Listing, SaveOptions, UriRewrite};
pub use config::{Settings, UploadSettings};
pub use constants::DEFAULT_CHUNK_SIZE;
pub use model::domain::{Attached, Domain};
pub use model::{
    expand_pattern, model_uri, populate_record, record_to_json, Attributes, Fields, Model, Timestamp,
};
pub use models::*;
pub use parallel::{chunk_parallel, chunk_ranges, ChunkOutcome};
pub use transport::http::{HttpTransport, HttpTransportBuilder};
pub use transport::{Transport, TransportExt};
pub use types::{ApiUrl, DomainClassName, ModelId, PropertyKey};
