//! Concrete kinds of Cytomine records.
//!
//! Each kind is a struct implementing [crate::Model] with its declared
//! fields, plus an alias for its collection, e.g. [ProjectCollection].
//! Kinds which belong to another record (properties, attached files...)
//! also implement [crate::Attached] and are created with
//! [crate::Attached::of].

mod generic;
mod image;
mod ontology;
mod project;
mod property;
mod user;

pub use generic::*;
pub use image::*;
pub use ontology::*;
pub use project::*;
pub use property::*;
pub use user::*;
