use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    embed::Embed,
    error::{Error, Result},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Embed(Embed),
    Text(String),
}

/// Hint passed along with a page request. Sources that load their pages in
/// batches use it to jump a whole batch instead of a single index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Skip {
    #[default]
    None,
    Next,
    Prev,
}

#[async_trait]
pub trait PageSource: Send {
    /// `None` when the source cannot tell how many pages it has.
    fn page_count(&self) -> Option<usize>;

    async fn fetch_page(&mut self, index: usize, skip: Skip) -> Result<Page>;

    /// The index the source actually landed on for `requested`.
    fn settled_index(&self, requested: usize) -> usize {
        requested
    }

    async fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    /// Re-targets a date-driven source. Call `prepare` afterwards.
    fn set_date(&mut self, _date: NaiveDate) -> Result<()> {
        Err(Error::upstream("this menu can't be searched by date"))
    }

    fn empty_message(&self) -> String {
        "There is nothing to show.".to_string()
    }
}

/// Bounds check shared by the list-backed sources.
pub fn checked_index<T>(items: &[T], index: usize) -> Result<&T> {
    items.get(index).ok_or(Error::NotFound { index })
}

/// "Page n/m" footer text used by the list sources.
pub fn page_footer(index: usize, count: usize) -> String {
    format!("Page {}/{}", index + 1, count)
}
