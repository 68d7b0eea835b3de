//! Ordered lists of models of one kind, with filters, pagination and bulk save.
//!
//! A [Collection] is addressed by the [Listing] of its element kind:
//! `<resource>.json`, or `<key>/<value>/<resource>.json` when filtered, and
//! nested under `domain/<class>/<ident>/` when the collection belongs to an
//! owner (see [Collection::of]).

use crate::constants::DEFAULT_CHUNK_SIZE;
use crate::errors::{ModelError, PartialUploadError, SaveError};
use crate::model::domain::{Attached, Domain};
use crate::model::Model;
use crate::parallel::chunk_parallel;
use crate::query::{QueryParameters, QueryValue};
use crate::transport::{into_attributes, Transport, TransportExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;
use std::ops::Index;

/// Server-side exceptions to the collection addressing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UriRewrite {
    #[default]
    None,
    /// Project members are listed at `admin` instead of `user` when the
    /// collection is filtered by project and the `admin` parameter is true.
    ProjectAdmins,
    /// Collections owned by an annotation are not under `domain/`.
    AnnotationDomain,
}

/// How the collection endpoint of a kind is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Resource name in collection URIs, usually the model kind.
    pub resource: String,
    /// Filters which become a `<key>/<value>/` URI segment.
    pub allowed_filters: Vec<&'static str>,
    /// Whether the collection can be fetched without any filter.
    pub unfiltered: bool,
    /// Reason why the collection cannot be saved, if it cannot.
    pub read_only: Option<&'static str>,
    pub rewrite: UriRewrite,
}

impl Listing {
    /// Listing of `<resource>.json`, which accepts no filter and can be
    /// fetched without one.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            allowed_filters: Vec::new(),
            unfiltered: true,
            read_only: None,
            rewrite: UriRewrite::None,
        }
    }

    pub fn filters(self, allowed_filters: &[&'static str]) -> Self {
        Self {
            allowed_filters: allowed_filters.to_vec(),
            ..self
        }
    }

    /// Fetching requires at least one filter.
    pub fn filter_required(self) -> Self {
        Self {
            unfiltered: false,
            ..self
        }
    }

    pub fn read_only(self, reason: &'static str) -> Self {
        Self {
            read_only: Some(reason),
            ..self
        }
    }

    pub fn rewrite(self, rewrite: UriRewrite) -> Self {
        Self { rewrite, ..self }
    }
}

/// A [Model] kind with a collection endpoint.
pub trait Listed: Model {
    fn listing() -> Listing;
}

/// Parameters of [Collection::save].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Maximum number of models sent per request. `None` sends the whole
    /// collection at once; `Some(0)` is invalid.
    pub chunk: Option<usize>,
    /// Maximum number of chunks in flight, `0` for one per CPU.
    pub n_workers: usize,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            chunk: Some(DEFAULT_CHUNK_SIZE),
            n_workers: 0,
        }
    }
}

/// An ordered list of models of one kind.
///
/// Every element has the kind of the collection's prototype, which is
/// cloned then populated for each element of a fetched page.
#[derive(Debug, Clone)]
pub struct Collection<M: Model> {
    prototype: M,
    listing: Listing,
    domain: Option<Domain>,
    data: Vec<M>,
    filters: BTreeMap<String, String>,
    parameters: QueryParameters,
    /// Number of items per page, `0` for unpaged.
    pub max: u32,
    pub offset: u32,
    total: u32,
    total_pages: Option<u32>,
}

impl<M: Listed + Default> Collection<M> {
    pub fn new() -> Self {
        Self::with_prototype(M::default(), M::listing())
    }
}

impl<M: Listed + Default> Default for Collection<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Listed + Attached> Collection<M> {
    /// Collection of the `M`s owned by `owner`, which must have been fetched
    /// or saved before.
    pub fn of<O: Model>(owner: &O) -> Result<Self, ModelError> {
        let domain = Domain::of(owner)?;
        let mut collection = Self::with_prototype(M::attach(domain.clone()), M::listing());
        collection.domain = Some(domain);
        Ok(collection)
    }
}

impl<M: Model> Collection<M> {
    /// Collection of models shaped like `prototype`.
    pub fn with_prototype(prototype: M, listing: Listing) -> Self {
        Self {
            prototype,
            listing,
            domain: None,
            data: Vec::new(),
            filters: BTreeMap::new(),
            parameters: QueryParameters::new(),
            max: 0,
            offset: 0,
            total: 0,
            total_pages: None,
        }
    }

    /// Same kind, listing, owner and pagination, but no elements.
    fn emptied(&self) -> Self {
        Self {
            prototype: self.prototype.clone(),
            listing: self.listing.clone(),
            domain: self.domain.clone(),
            data: Vec::new(),
            filters: self.filters.clone(),
            parameters: self.parameters.clone(),
            max: self.max,
            offset: self.offset,
            total: self.total,
            total_pages: self.total_pages,
        }
    }

    pub fn kind(&self) -> &str {
        self.prototype.kind()
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn domain(&self) -> Option<&Domain> {
        self.domain.as_ref()
    }

    // ==================================================
    //                 FILTERS & PARAMETERS
    // ==================================================

    pub fn with_filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.add_filter(key, value);
        self
    }

    /// Filters are not checked against [Listing::allowed_filters]:
    /// filters which are not allowed are left out of the URI.
    pub fn add_filter(&mut self, key: impl Into<String>, value: impl ToString) {
        self.filters.insert(key.into(), value.to_string());
    }

    pub fn is_filtered_by(&self, key: &str) -> bool {
        self.filters.contains_key(key)
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.set_parameter(key, value);
        self
    }

    /// Set a query parameter sent with every page request, e.g. `withUser`.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn with_max(mut self, max: u32) -> Self {
        self.max = max;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Query string of a page request: the extra parameters, `max` and `offset`.
    pub fn parameters(&self) -> QueryParameters {
        let mut parameters = self.parameters.clone();
        parameters.insert("max".to_string(), self.max.into());
        parameters.insert("offset".to_string(), self.offset.into());
        parameters
    }

    /// Number of models on the server, as of the last fetched page.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// `None` until a page was fetched.
    ///
    /// Computed as `total / max` rounded down, so a last partial page is not
    /// counted: 25 items by pages of 10 make 2 pages.
    pub fn total_pages(&self) -> Option<u32> {
        self.total_pages
    }

    // ==================================================
    //                 ADDRESSING
    // ==================================================

    /// `<key>/<value>/<resource>.json` for the single filter, if allowed,
    /// `<resource>.json` otherwise.
    pub fn uri(&self) -> Result<String, ModelError> {
        if self.filters.len() > 1 {
            return Err(ModelError::TooManyFilters(self.filters.len()));
        }
        let prefix: String = self
            .filters
            .iter()
            .filter(|(key, _)| self.listing.allowed_filters.contains(&key.as_str()))
            .map(|(key, value)| format!("{}/{}/", key, value))
            .collect();
        Ok(self.address(&format!("{}{}.json", prefix, self.listing.resource)))
    }

    /// Where models are created in bulk.
    pub fn uri_without_filters(&self) -> String {
        self.address(&format!("{}.json", self.listing.resource))
    }

    fn address(&self, uri: &str) -> String {
        let uri = match (&self.domain, self.listing.rewrite) {
            (Some(domain), UriRewrite::AnnotationDomain) => domain.nest_unless_annotation(uri),
            (Some(domain), _) => domain.nest(uri),
            (None, _) => uri.to_string(),
        };
        match self.listing.rewrite {
            UriRewrite::ProjectAdmins
                if self.is_filtered_by("project")
                    && self.parameters.get("admin") == Some(&QueryValue::Bool(true)) =>
            {
                uri.replace("user", "admin")
            }
            _ => uri,
        }
    }

    /// URI of the next page request.
    pub(crate) fn fetch_uri(&self) -> Result<String, ModelError> {
        if self.filters.is_empty() && !self.listing.unfiltered {
            return Err(ModelError::FilterRequired(self.kind().to_string()));
        }
        self.uri()
    }

    // ==================================================
    //                 FETCHING
    // ==================================================

    /// Fetch one page, or with `max`, every page of `max` items.
    ///
    /// Paged fetching appends pages until [Collection::total_pages] pages
    /// were fetched by this call. A collection fetched before stops after as
    /// many pages as it counted then.
    pub async fn fetch(
        &mut self,
        transport: &dyn Transport,
        max: Option<u32>,
    ) -> Result<(), ModelError> {
        match max.filter(|max| *max > 0) {
            Some(max) => {
                self.max = max;
                let mut n_pages = 0;
                while self.total_pages.map_or(true, |pages| n_pages < pages.max(1)) {
                    self.fetch_next_page(transport, true).await?;
                    n_pages += 1;
                }
                Ok(())
            }
            None => transport.get_collection(self, false).await,
        }
    }

    /// Set a filter, then [Collection::fetch].
    pub async fn fetch_with_filter(
        &mut self,
        transport: &dyn Transport,
        key: impl Into<String>,
        value: impl ToString,
        max: Option<u32>,
    ) -> Result<(), ModelError> {
        self.add_filter(key, value);
        self.fetch(transport, max).await
    }

    /// Advance the offset by one page, at most up to the total, then fetch.
    pub async fn fetch_next_page(
        &mut self,
        transport: &dyn Transport,
        append: bool,
    ) -> Result<(), ModelError> {
        self.offset = self.total.min(self.offset.saturating_add(self.max));
        transport.get_collection(self, append).await
    }

    /// Move the offset back by one page, at least down to 0, then fetch.
    pub async fn fetch_previous_page(&mut self, transport: &dyn Transport) -> Result<(), ModelError> {
        self.offset = self.offset.saturating_sub(self.max);
        transport.get_collection(self, false).await
    }

    /// Load a page envelope `{"size": total, "collection": [...]}`.
    ///
    /// On error, the collection is left unchanged.
    pub fn populate(&mut self, page: Value, append: bool) -> Result<(), ModelError> {
        let mut page = into_attributes(page)?;
        let elements = match page.remove("collection") {
            Some(Value::Array(elements)) => elements,
            _ => {
                return Err(ModelError::UnexpectedResponse(
                    "page has no \"collection\" array".to_string(),
                ))
            }
        };
        let total = page
            .get("size")
            .and_then(Value::as_u64)
            .and_then(|size| u32::try_from(size).ok())
            .ok_or_else(|| {
                ModelError::UnexpectedResponse("page has no valid \"size\"".to_string())
            })?;
        let data = elements
            .into_iter()
            .map(|element| {
                let mut model = self.prototype.clone();
                model.populate(into_attributes(element)?)?;
                Ok(model)
            })
            .collect::<Result<Vec<M>, ModelError>>()?;
        if append {
            self.data.extend(data);
        } else {
            self.data = data;
        }
        self.total = total;
        self.total_pages = Some(if self.max == 0 { 1 } else { total / self.max });
        Ok(())
    }

    // ==================================================
    //                 SAVING
    // ==================================================

    /// Create every element on the server.
    ///
    /// With a chunk size, elements are sent by chunks of that size,
    /// [SaveOptions::n_workers] chunks at a time, and the future resolves
    /// once every chunk is done. If any chunk failed, the error lists
    /// the created and failed elements in their original order.
    pub async fn save(
        &self,
        transport: &dyn Transport,
        options: SaveOptions,
    ) -> Result<(), SaveError<M>> {
        if let Some(reason) = self.listing.read_only {
            return Err(ModelError::NotImplemented(reason).into());
        }
        let chunk_size = match options.chunk {
            None => {
                transport.post_collection(self).await?;
                return Ok(());
            }
            Some(chunk) => {
                NonZeroUsize::new(chunk).ok_or(ModelError::InvalidChunkSize(options.chunk))?
            }
        };
        let outcomes = chunk_parallel(&self.data, chunk_size, options.n_workers, |items| {
            self.save_chunk(transport, items)
        })
        .await;

        let mut created = self.emptied();
        let mut failed = self.emptied();
        let mut causes = Vec::new();
        for outcome in outcomes {
            let items = &self.data[outcome.range];
            match outcome.result {
                Ok(()) => created.data.extend_from_slice(items),
                Err(e) => {
                    failed.data.extend_from_slice(items);
                    causes.push(e);
                }
            }
        }
        if causes.is_empty() {
            Ok(())
        } else {
            Err(SaveError::Partial(PartialUploadError {
                created,
                failed,
                causes,
            }))
        }
    }

    async fn save_chunk(&self, transport: &dyn Transport, items: &[M]) -> Result<(), ModelError> {
        let mut chunk = self.emptied();
        chunk.data = items.to_vec();
        transport.post_collection(&chunk).await?;
        Ok(())
    }

    // ==================================================
    //                 SEQUENCE
    // ==================================================

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, M> {
        self.data.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, M> {
        self.data.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&M> {
        self.data.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut M> {
        self.data.get_mut(index)
    }

    pub fn as_slice(&self) -> &[M] {
        &self.data
    }

    fn check_kind(&self, value: &M) -> Result<(), ModelError> {
        if value.kind() == self.kind() {
            Ok(())
        } else {
            Err(ModelError::WrongKind {
                expected: self.kind().to_string(),
                found: value.kind().to_string(),
            })
        }
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), ModelError> {
        if index < len {
            Ok(())
        } else {
            Err(ModelError::IndexOutOfBounds {
                index,
                len: self.len(),
            })
        }
    }

    /// Replace the element at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: M) -> Result<M, ModelError> {
        self.check_kind(&value)?;
        self.check_index(index, self.len())?;
        Ok(std::mem::replace(&mut self.data[index], value))
    }

    /// Insert `value` at `index`, which may be the length of the collection.
    pub fn insert(&mut self, index: usize, value: M) -> Result<(), ModelError> {
        self.check_kind(&value)?;
        self.check_index(index, self.len() + 1)?;
        self.data.insert(index, value);
        Ok(())
    }

    pub fn push(&mut self, value: M) -> Result<(), ModelError> {
        self.check_kind(&value)?;
        self.data.push(value);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<M, ModelError> {
        self.check_index(index, self.len())?;
        Ok(self.data.remove(index))
    }

    /// Push every value, or none of them if one has the wrong kind.
    pub fn extend(&mut self, values: impl IntoIterator<Item = M>) -> Result<(), ModelError> {
        let values: Vec<M> = values.into_iter().collect();
        values.iter().try_for_each(|value| self.check_kind(value))?;
        self.data.extend(values);
        Ok(())
    }

    fn check_same_kind(&self, other: &Self) -> Result<(), ModelError> {
        if self.kind() == other.kind() && self.listing.resource == other.listing.resource {
            Ok(())
        } else {
            Err(ModelError::KindMismatch)
        }
    }

    /// Move the elements of `other` to the end of this collection.
    pub fn append(&mut self, other: Self) -> Result<(), ModelError> {
        self.check_same_kind(&other)?;
        self.data.extend(other.data);
        Ok(())
    }

    /// A new collection with the elements of both.
    pub fn concat(&self, other: &Self) -> Result<Self, ModelError> {
        self.check_same_kind(other)?;
        let mut collection = self.clone();
        collection.data.extend_from_slice(&other.data);
        Ok(collection)
    }

    /// A new collection of the elements for which `predicate` is true.
    pub fn filter(&self, mut predicate: impl FnMut(&M) -> bool) -> Self {
        let mut collection = self.emptied();
        collection.data = self.data.iter().filter(|m| predicate(m)).cloned().collect();
        collection
    }

    /// First element whose `attribute` equals `value`. Elements without
    /// `attribute` never match.
    pub fn find_by_attribute(&self, attribute: &str, value: &Value) -> Option<&M> {
        self.data.iter().find(|model| {
            model
                .to_json()
                .map_or(false, |json| json.get(attribute) == Some(value))
        })
    }

    /// Every element as a JSON object.
    pub fn to_json(&self) -> Result<Vec<Value>, ModelError> {
        self.data
            .iter()
            .map(|model| model.to_json().map(Value::Object))
            .collect()
    }
}

impl<M: Model> Index<usize> for Collection<M> {
    type Output = M;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<M: Model> IntoIterator for Collection<M> {
    type Item = M;
    type IntoIter = std::vec::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, M: Model> IntoIterator for &'a Collection<M> {
    type Item = &'a M;
    type IntoIter = std::slice::Iter<'a, M>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<M: Model> Display for Collection<M> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} collection] {} objects", self.kind(), self.len())
    }
}
