//! Domain records and their public JSON views.
//!
//! Records (`User`, `Album`, `Photo`) are what the store holds. Views are what
//! leaves the process: they are built from records, use camelCase keys, and
//! never carry the password hash or storage keys.
//!
//! ```text
//!   User 1 ──< Album 1 ──< Photo
//!     │                      │
//!     └──────────────────────┘  (Photo also references its owner)
//! ```

mod password;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use password::{hash_password, verify_password};

// =============================================================================
// Records
// =============================================================================

/// Postal address on a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
}

/// Employer on a user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub name: String,
    pub catch_phrase: String,
    pub bs: String,
}

/// Optional profile fields supplied at registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<Address>,
    pub company: Option<Company>,
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A titled collection of photos owned by one user.
#[derive(Debug, Clone)]
pub struct Album {
    pub id: u64,
    pub title: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An uploaded image and its thumbnail.
#[derive(Debug, Clone)]
pub struct Photo {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
    pub album_id: u64,
    pub user_id: Uuid,
    /// Storage key of the main image
    pub asset_key: String,
    /// Storage key of the thumbnail
    pub thumbnail_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Album {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

impl Photo {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

// =============================================================================
// Views
// =============================================================================

/// Every stored user field except the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            phone: user.profile.phone.clone(),
            website: user.profile.website.clone(),
            address: user.profile.address.clone(),
            company: user.profile.company.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Account summary returned alongside a token.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: String,
}

impl From<&User> for AccountView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
        }
    }
}

/// Owner reference embedded in album and photo views.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Album reference embedded in photo views.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumSummary {
    pub id: u64,
    pub title: String,
}

impl From<&Album> for AlbumSummary {
    fn from(album: &Album) -> Self {
        Self {
            id: album.id,
            title: album.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumView {
    pub id: u64,
    pub title: String,
    pub user_id: Uuid,
    /// `null` when the owner no longer exists
    pub user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlbumView {
    pub fn new(album: &Album, owner: Option<&User>) -> Self {
        Self {
            id: album.id,
            title: album.title.clone(),
            user_id: album.user_id,
            user: owner.map(UserSummary::from),
            created_at: album.created_at,
            updated_at: album.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoView {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub thumbnail_url: String,
    pub album_id: u64,
    pub user_id: Uuid,
    pub album: Option<AlbumSummary>,
    pub user: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PhotoView {
    pub fn new(photo: &Photo, album: Option<&Album>, owner: Option<&User>) -> Self {
        Self {
            id: photo.id,
            title: photo.title.clone(),
            url: photo.url.clone(),
            thumbnail_url: photo.thumbnail_url.clone(),
            album_id: photo.album_id,
            user_id: photo.user_id,
            album: album.map(AlbumSummary::from),
            user: owner.map(UserSummary::from),
            created_at: photo.created_at,
            updated_at: photo.updated_at,
        }
    }
}
