//! Forward-only page iteration over one resource.
//!
//! The API reports no page count. A page shorter than the requested size is
//! taken as the last one, so a collection that ends exactly on a page
//! boundary costs one extra request that comes back empty.

use std::marker::PhantomData;

use serde_json::Value;
use tracing::debug;

use super::client::PageSource;
use crate::decode::Decode;
use crate::error::Result;

/// Maximum page size accepted by the API.
pub const DEFAULT_PAGE_SIZE: u32 = 250;

/// Lazily fetch and decode every record of `D`'s resource.
pub fn fetch_all<S, D>(source: &S, page_size: u32) -> Pages<'_, S, D>
where
    S: PageSource + ?Sized,
    D: Decode,
{
    Pages {
        source,
        page_size: page_size.max(1),
        next_page: 1,
        buffer: Vec::new().into_iter(),
        exhausted: false,
        requests: 0,
        _record: PhantomData,
    }
}

/// Single-pass iterator over decoded records.
///
/// Each `next()` that drains the current page issues one request. The first
/// error ends the iteration.
pub struct Pages<'a, S: ?Sized, D> {
    source: &'a S,
    page_size: u32,
    next_page: u32,
    buffer: std::vec::IntoIter<Value>,
    exhausted: bool,
    requests: u32,
    _record: PhantomData<fn() -> D>,
}

impl<S: ?Sized, D> Pages<'_, S, D> {
    /// Number of page requests issued so far.
    pub fn requests(&self) -> u32 {
        self.requests
    }
}

impl<S, D> Iterator for Pages<'_, S, D>
where
    S: PageSource + ?Sized,
    D: Decode,
{
    type Item = Result<D>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(raw) = self.buffer.next() {
                let decoded = D::decode(&raw).map_err(Into::into);
                if decoded.is_err() {
                    self.stop();
                }
                return Some(decoded);
            }
            if self.exhausted {
                return None;
            }

            let page = self.next_page;
            let records = match self.source.fetch_page(D::RESOURCE, page, self.page_size) {
                Ok(records) => records,
                Err(e) => {
                    self.stop();
                    return Some(Err(e));
                }
            };
            self.requests += 1;
            self.next_page += 1;

            if records.len() < self.page_size as usize {
                let resource = D::RESOURCE;
                debug!(%resource, page, count = records.len(), "short page, stopping");
                self.exhausted = true;
            }
            self.buffer = records.into_iter();
        }
    }
}

impl<S: ?Sized, D> Pages<'_, S, D> {
    fn stop(&mut self) {
        self.exhausted = true;
        self.buffer = Vec::new().into_iter();
    }
}
