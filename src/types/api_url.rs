//! NewType for the base URL of a Cytomine server's REST API.

use crate::errors::InvalidApiUrl;
use aliri_braid::braid;

/// An [ApiUrl] is the base URL for the REST API, e.g.
/// `https://research.cytomine.be/api/`
///
/// Every URI computed by models and collections is relative to it.
#[braid(validator, serde)]
pub struct ApiUrl(String);

impl aliri_braid::Validator for ApiUrl {
    type Error = InvalidApiUrl;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if !(s.starts_with("http://") || s.starts_with("https://")) {
            Err(InvalidApiUrl::Protocol(s.to_string()))
        } else if !s.ends_with("/api/") {
            Err(InvalidApiUrl::Endpoint(s.to_string()))
        } else {
            Ok(())
        }
    }
}

impl ApiUrl {
    /// Resolve a URI computed by a model or collection against this base URL.
    pub fn join(&self, uri: &str) -> String {
        format!("{}{}", self.as_str(), uri.trim_start_matches('/'))
    }
}
