//! Persistence interface.
//!
//! Handlers talk to the store only through the [`Store`] trait. The store owns
//! uniqueness: it rejects a second user with the same email or username and a
//! second album or photo with the same numeric id, reporting
//! [`StoreError::Duplicate`].
//!
//! Numeric ids are assigned as `max + 1`. Reading the maximum and inserting are
//! two separate calls, so two concurrent creators can pick the same id; the
//! loser's insert is rejected and [`create_album`]/[`create_photo`] retry with a
//! fresh maximum.

mod memory;

use std::future::Future;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Album, Photo, User};

pub use memory::MemoryStore;

/// How many times an insert is retried after losing an id race.
pub const ID_ATTEMPTS: u32 = 3;

// =============================================================================
// Queries
// =============================================================================

/// One page of a list request (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    /// Number of items to skip before this page starts.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Fields a list may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "title" => Some(SortField::Title),
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

/// Filters, ordering and paging for album and photo lists.
///
/// Without `sort`, items come in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Page,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
    /// Photos only
    pub album_id: Option<u64>,
    pub sort: Option<Sort>,
}

impl ListQuery {
    /// Unfiltered query for one page.
    pub fn page(page: Page) -> Self {
        Self {
            page,
            search: None,
            user_id: None,
            album_id: None,
            sort: None,
        }
    }
}

/// One page of items plus the total number of matches.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Pagination summary returned next to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub limit: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: Page, total_count: u64) -> Self {
        let total_pages = if page.limit == 0 {
            0
        } else {
            total_count.div_ceil(page.limit)
        };
        Self {
            current_page: page.page,
            total_pages,
            total_count,
            limit: page.limit,
            has_next_page: page.page < total_pages,
            has_prev_page: page.page > 1,
        }
    }
}

// =============================================================================
// Store trait
// =============================================================================

/// Narrow persistence interface used by the handlers.
///
/// Implementations must be thread-safe; a single instance is shared by every
/// request.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a user. Fails with `Duplicate { field: "email" | "username" }`.
    async fn insert_user(&self, user: User) -> Result<User, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Highest album id in use, `None` when there are no albums.
    async fn max_album_id(&self) -> Result<Option<u64>, StoreError>;

    /// Insert an album. Fails with `Duplicate { field: "id" }` if the id is taken.
    async fn insert_album(&self, album: Album) -> Result<Album, StoreError>;

    async fn find_album(&self, id: u64) -> Result<Option<Album>, StoreError>;

    async fn list_albums(&self, query: &ListQuery) -> Result<Listing<Album>, StoreError>;

    /// Replace a stored album. Returns `None` if it no longer exists.
    async fn update_album(&self, album: Album) -> Result<Option<Album>, StoreError>;

    /// Returns whether an album was removed.
    async fn delete_album(&self, id: u64) -> Result<bool, StoreError>;

    async fn max_photo_id(&self) -> Result<Option<u64>, StoreError>;

    /// Insert a photo. Fails with `Duplicate { field: "id" }` if the id is taken.
    async fn insert_photo(&self, photo: Photo) -> Result<Photo, StoreError>;

    async fn find_photo(&self, id: u64) -> Result<Option<Photo>, StoreError>;

    async fn list_photos(&self, query: &ListQuery) -> Result<Listing<Photo>, StoreError>;

    async fn count_photos_in_album(&self, album_id: u64) -> Result<u64, StoreError>;

    async fn update_photo(&self, photo: Photo) -> Result<Option<Photo>, StoreError>;

    async fn delete_photo(&self, id: u64) -> Result<bool, StoreError>;
}

// =============================================================================
// Id assignment
// =============================================================================

fn next_id(max: Option<u64>) -> u64 {
    max.map_or(1, |m| m + 1)
}

async fn with_next_id<T, F, Fut>(mut attempt: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(StoreError::Duplicate { field }) if field == "id" && tries < ID_ATTEMPTS => {
                debug!(attempt = tries, "Id taken by a concurrent insert, retrying");
                tries += 1;
            }
            result => return result,
        }
    }
}

/// Insert `album` under the next free id, ignoring the id it carries.
pub async fn create_album(store: &dyn Store, album: Album) -> Result<Album, StoreError> {
    with_next_id(|| {
        let mut album = album.clone();
        async move {
            album.id = next_id(store.max_album_id().await?);
            store.insert_album(album).await
        }
    })
    .await
}

/// Insert `photo` under the next free id, ignoring the id it carries.
pub async fn create_photo(store: &dyn Store, photo: Photo) -> Result<Photo, StoreError> {
    with_next_id(|| {
        let mut photo = photo.clone();
        async move {
            photo.id = next_id(store.max_photo_id().await?);
            store.insert_photo(photo).await
        }
    })
    .await
}
