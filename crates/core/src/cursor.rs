//! Paginated result cursor
//!
//! A [`FindCursor`] materializes a query page by page, on demand. It is
//! forward-only and single-use: the terminal drain may run at most once and
//! only on a cursor that has not been advanced element-wise. Violations are
//! reported as [`Error::IllegalState`], never silently restarted.

use std::collections::VecDeque;
use std::marker::PhantomData;

use folio_domain::{Command, Error, FindOptions, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::runner::CommandRunner;

/// Assemble the wire command for one `find` page.
pub fn build_find_command(filter: &Value, options: &FindOptions) -> Command {
    let mut command = Command::new("find").with_field("filter", filter.clone());
    if let Some(sort) = &options.sort {
        command = command.with_field("sort", sort.clone());
    }
    if let Some(projection) = &options.projection {
        command = command.with_field("projection", projection.clone());
    }
    if let Some(wire_options) = options.to_wire_options() {
        command = command.with_field("options", wire_options);
    }
    command
}

/// Lazy, forward-only view over the documents a query matches.
pub struct FindCursor<T> {
    runner: CommandRunner,
    filter: Value,
    options: FindOptions,
    buffer: VecDeque<Value>,
    page_state: Option<String>,
    exhausted: bool,
    advanced: bool,
    drained: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> FindCursor<T> {
    /// Cursor over the given query. Nothing is fetched until the first
    /// element is requested.
    pub fn new(runner: CommandRunner, filter: Value, options: FindOptions) -> Self {
        let page_state = options.page_state.clone();
        Self {
            runner,
            filter,
            options,
            buffer: VecDeque::new(),
            page_state,
            exhausted: false,
            advanced: false,
            drained: false,
            _marker: PhantomData,
        }
    }

    /// Advance by one element, fetching the next page when the buffer runs
    /// dry. Returns `None` once the sequence is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates command failures; [`Error::Mapping`] when a document does
    /// not fit `T`.
    pub async fn next(&mut self) -> Result<Option<T>> {
        if self.drained {
            return Ok(None);
        }
        self.advanced = true;
        self.pull().await
    }

    /// Drain the remaining sequence into a vector. Terminal: allowed at
    /// most once, and only on a cursor that was never advanced manually.
    ///
    /// # Errors
    ///
    /// [`Error::IllegalState`] on a second drain or a drain after
    /// [`Self::next`]; otherwise everything [`Self::next`] can return.
    pub async fn all(&mut self) -> Result<Vec<T>> {
        if self.drained {
            return Err(Error::IllegalState("result sequence already drained".into()));
        }
        if self.advanced {
            return Err(Error::IllegalState(
                "result sequence already being iterated; drain requires a fresh cursor".into(),
            ));
        }
        self.drained = true;

        let mut items = Vec::new();
        while let Some(item) = self.pull().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Whether all pages have been fetched and the buffer is empty.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.buffer.is_empty()
    }

    async fn pull(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(value) = self.buffer.pop_front() {
                return serde_json::from_value(value).map(Some).map_err(|error| {
                    Error::Mapping(format!("document does not fit target type: {error}"))
                });
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let options = self.options.with_page_state(self.page_state.clone());
        let command = build_find_command(&self.filter, &options);
        let response = self.runner.run(&command).await?;

        if let Some(documents) = response.documents() {
            self.buffer.extend(documents.iter().cloned());
        }
        self.page_state = response.next_page_state().map(str::to_string);
        self.exhausted = self.page_state.is_none();
        Ok(())
    }
}
