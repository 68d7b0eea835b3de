/// Maximum number of models sent in one request by a chunked collection save.
pub const DEFAULT_CHUNK_SIZE: usize = 15;

/// Class discriminator the server uses for annotations in domain URIs.
pub const ANNOTATION_CLASS_NAME: &str = "annotation";

/// Name of the configuration file, see [crate::Settings].
pub const APP_NAME: &str = "cytomine";
