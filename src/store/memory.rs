use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ListQuery, Listing, Sort, SortField, SortOrder, Store};
use crate::error::StoreError;
use crate::model::{Album, Photo, User};

/// In-process [`Store`] backed by maps behind async read-write locks.
///
/// Albums and photos are keyed by id in ordered maps so unsorted listings come
/// out in ascending id order without extra work.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    albums: RwLock<BTreeMap<u64, Album>>,
    photos: RwLock<BTreeMap<u64, Photo>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Record fields the generic list routine needs.
trait Listable: Clone {
    fn id(&self) -> u64;
    fn title(&self) -> &str;
    fn user_id(&self) -> Uuid;
    fn album_id(&self) -> Option<u64>;
    fn created_at(&self) -> chrono::DateTime<chrono::Utc>;
    fn updated_at(&self) -> chrono::DateTime<chrono::Utc>;
}

impl Listable for Album {
    fn id(&self) -> u64 {
        self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn user_id(&self) -> Uuid {
        self.user_id
    }
    fn album_id(&self) -> Option<u64> {
        None
    }
    fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }
    fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.updated_at
    }
}

impl Listable for Photo {
    fn id(&self) -> u64 {
        self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn user_id(&self) -> Uuid {
        self.user_id
    }
    fn album_id(&self) -> Option<u64> {
        Some(self.album_id)
    }
    fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.created_at
    }
    fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.updated_at
    }
}

fn compare<T: Listable>(a: &T, b: &T, sort: Sort) -> Ordering {
    let ordering = match sort.field {
        SortField::Title => a.title().cmp(b.title()),
        SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
        SortField::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
    };
    let ordering = match sort.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };
    ordering.then_with(|| a.id().cmp(&b.id()))
}

fn list<T: Listable>(records: &BTreeMap<u64, T>, query: &ListQuery) -> Listing<T> {
    let needle = query.search.as_ref().map(|s| s.to_lowercase());

    let mut matches: Vec<&T> = records
        .values()
        .filter(|r| match &needle {
            Some(needle) => r.title().to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .filter(|r| query.user_id.map_or(true, |id| r.user_id() == id))
        .filter(|r| query.album_id.map_or(true, |id| r.album_id() == Some(id)))
        .collect();

    if let Some(sort) = query.sort {
        matches.sort_by(|a, b| compare(*a, *b, sort));
    }

    let total = matches.len() as u64;
    let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.page.limit).unwrap_or(usize::MAX);
    let items = matches
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    Listing { items, total }
}

fn duplicate(field: &str) -> StoreError {
    StoreError::Duplicate {
        field: field.to_string(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(duplicate("email"));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(duplicate("username"));
        }
        if users.contains_key(&user.id) {
            return Err(duplicate("id"));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn max_album_id(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.albums.read().await.keys().next_back().copied())
    }

    async fn insert_album(&self, album: Album) -> Result<Album, StoreError> {
        let mut albums = self.albums.write().await;
        if albums.contains_key(&album.id) {
            return Err(duplicate("id"));
        }
        albums.insert(album.id, album.clone());
        Ok(album)
    }

    async fn find_album(&self, id: u64) -> Result<Option<Album>, StoreError> {
        Ok(self.albums.read().await.get(&id).cloned())
    }

    async fn list_albums(&self, query: &ListQuery) -> Result<Listing<Album>, StoreError> {
        Ok(list(&*self.albums.read().await, query))
    }

    async fn update_album(&self, album: Album) -> Result<Option<Album>, StoreError> {
        let mut albums = self.albums.write().await;
        match albums.get_mut(&album.id) {
            Some(stored) => {
                *stored = album.clone();
                Ok(Some(album))
            }
            None => Ok(None),
        }
    }

    async fn delete_album(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.albums.write().await.remove(&id).is_some())
    }

    async fn max_photo_id(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.photos.read().await.keys().next_back().copied())
    }

    async fn insert_photo(&self, photo: Photo) -> Result<Photo, StoreError> {
        let mut photos = self.photos.write().await;
        if photos.contains_key(&photo.id) {
            return Err(duplicate("id"));
        }
        photos.insert(photo.id, photo.clone());
        Ok(photo)
    }

    async fn find_photo(&self, id: u64) -> Result<Option<Photo>, StoreError> {
        Ok(self.photos.read().await.get(&id).cloned())
    }

    async fn list_photos(&self, query: &ListQuery) -> Result<Listing<Photo>, StoreError> {
        Ok(list(&*self.photos.read().await, query))
    }

    async fn count_photos_in_album(&self, album_id: u64) -> Result<u64, StoreError> {
        Ok(self
            .photos
            .read()
            .await
            .values()
            .filter(|p| p.album_id == album_id)
            .count() as u64)
    }

    async fn update_photo(&self, photo: Photo) -> Result<Option<Photo>, StoreError> {
        let mut photos = self.photos.write().await;
        match photos.get_mut(&photo.id) {
            Some(stored) => {
                *stored = photo.clone();
                Ok(Some(photo))
            }
            None => Ok(None),
        }
    }

    async fn delete_photo(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.photos.write().await.remove(&id).is_some())
    }
}
