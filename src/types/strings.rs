use aliri_braid::braid;

/// Class discriminator of a model which owns domain-scoped models, e.g.
/// `be.cytomine.domain.image.ImageInstance` or `annotation`.
#[braid(serde)]
pub struct DomainClassName;

/// Key of a [crate::models::Property].
#[braid(serde)]
pub struct PropertyKey;
