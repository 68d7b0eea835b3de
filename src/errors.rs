//! Errors for this crate.
//! About anyhow: see https://github.com/TrueLayer/reqwest-middleware/issues/119

use crate::collection::Collection;
use crate::model::Model;
use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum InvalidApiUrl {
    #[error("Given URL does not end with \"/api/\": {0}")]
    Endpoint(String),

    #[error("Given URL does not start with \"http://\" or \"https://\": {0}")]
    Protocol(String),
}

aliri_braid::from_infallible!(InvalidApiUrl);

/// Errors representing failed interactions with the Cytomine server.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// Error response with an explanation from the server.
    #[error("({status:?} {reason:?}): {text}")]
    Status {
        status: StatusCode,
        reason: &'static str,
        text: String,
    },

    /// Error without explanation from the server.
    #[error(transparent)]
    Raw(#[from] reqwest::Error),

    /// Error from reqwest middleware function.
    #[error(transparent)]
    Middleware(anyhow::Error),

    /// The server's response is not valid JSON.
    #[error("Invalid JSON response ({0}): {1}")]
    Decode(serde_json::Error, String),

    #[error("\"{0}\" is an invalid file path")]
    Path(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether the server answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

impl From<reqwest_middleware::Error> for TransportError {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Middleware(e) => TransportError::Middleware(e),
            reqwest_middleware::Error::Reqwest(e) => TransportError::Raw(e),
        }
    }
}

pub(crate) async fn check(res: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = res.status();
    if status.is_client_error() || status.is_server_error() {
        let reason = status.canonical_reason().unwrap_or("unknown reason");
        let text = res.text().await?;
        Err(TransportError::Status {
            status,
            reason,
            text,
        })
    } else {
        Ok(res)
    }
}

/// Errors of models and collections. Everything except [ModelError::Transport]
/// and [ModelError::Decode] is detected before any request is sent.
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Cannot {action} a model with no ID.")]
    MissingId { action: &'static str },

    #[error("Cannot {action} a model with no {key}.")]
    MissingKey {
        action: &'static str,
        key: &'static str,
    },

    #[error("More than 1 filter not allowed by default (got {0}).")]
    TooManyFilters(usize),

    #[error("This {0} collection cannot be fetched without a filter.")]
    FilterRequired(String),

    #[error("Value of kind \"{found}\" not allowed in a collection of \"{expected}\".")]
    WrongKind { expected: String, found: String },

    #[error("Only two collections of the same kind can be added together.")]
    KindMismatch,

    #[error("Invalid value {0:?} for chunk parameter.")]
    InvalidChunkSize(Option<usize>),

    #[error("The {0} must be fetched or saved before.")]
    UnsavedOwner(String),

    #[error("Index {index} is out of bounds for a collection of length {len}.")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("{0}")]
    NotImplemented(&'static str),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<reqwest_middleware::Error> for ModelError {
    fn from(error: reqwest_middleware::Error) -> Self {
        TransportError::from(error).into()
    }
}

/// A collection was saved, but only a part of it was successfully created.
///
/// Both partitions keep the original order of the saved collection, so the
/// caller can retry [PartialUploadError::failed] alone.
#[derive(thiserror::Error, Debug)]
#[error("Some items could not be uploaded ({} created, {} failed)", .created.len(), .failed.len())]
pub struct PartialUploadError<M: Model> {
    /// Items of the successful chunks, as they were submitted.
    pub created: Collection<M>,
    /// Items of the failed chunks.
    pub failed: Collection<M>,
    /// Why each failed chunk failed, in chunk order.
    pub causes: Vec<ModelError>,
}

/// Errors for [Collection::save].
#[derive(thiserror::Error, Debug)]
pub enum SaveError<M: Model> {
    #[error(transparent)]
    Partial(PartialUploadError<M>),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl<M: Model> From<TransportError> for SaveError<M> {
    fn from(error: TransportError) -> Self {
        SaveError::Model(error.into())
    }
}

/// Errors reading or writing [crate::Settings].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Confy(#[from] confy::ConfyError),
}
