//! Declarative request schemas.
//!
//! Each schema deserializes from the raw request shape (every field optional so
//! a missing field becomes a violation rather than a parse failure), carries its
//! rules as `validator` attributes, and converts into the typed value the
//! handlers work with.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::ApiError;
use crate::model::{Address, Company, Profile};
use crate::store::{ListQuery, Page, Sort, SortField, SortOrder};

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: u64 = 18;

/// Largest page size a client may request.
pub const MAX_LIMIT: u64 = 100;

static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static USERNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("valid regex"));

/// A request shape with validation rules and a conversion into a typed value.
///
/// `into_output` is only called after `validate()` succeeded, so it may rely on
/// every rule holding.
pub trait Schema: DeserializeOwned + Validate {
    type Output;

    /// Wire names of the fields in declaration order; violations are
    /// reported in this order.
    const FIELDS: &'static [&'static str];

    fn into_output(self) -> Result<Self::Output, ApiError>;
}

// =============================================================================
// Custom rules
// =============================================================================

fn rule(message: &'static str) -> ValidationError {
    ValidationError::new("invalid").with_message(message.into())
}

fn validate_title(value: &str) -> Result<(), ValidationError> {
    match value.chars().count() {
        0 => Err(rule("Title is required")),
        n if n > 200 => Err(rule("Title must not exceed 200 characters")),
        _ => Ok(()),
    }
}

fn validate_website(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || url::Url::parse(value).is_ok() {
        Ok(())
    } else {
        Err(rule("Invalid URL"))
    }
}

fn validate_page(value: &str) -> Result<(), ValidationError> {
    // Non-numeric input is reported by the regex rule
    if !NUMERIC.is_match(value) {
        return Ok(());
    }
    match value.parse::<u64>() {
        Ok(page) if page >= 1 => Ok(()),
        _ => Err(rule("Page must be at least 1")),
    }
}

fn validate_limit(value: &str) -> Result<(), ValidationError> {
    if !NUMERIC.is_match(value) {
        return Ok(());
    }
    match value.parse::<u64>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(()),
        _ => Err(rule("Limit must be between 1 and 100")),
    }
}

fn validate_user_id(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| rule("User ID must be a valid user id"))
}

fn validate_sort(value: &str) -> Result<(), ValidationError> {
    SortField::parse(value)
        .map(|_| ())
        .ok_or_else(|| rule("Sort must be one of: title, createdAt, updatedAt"))
}

fn validate_order(value: &str) -> Result<(), ValidationError> {
    SortOrder::parse(value)
        .map(|_| ())
        .ok_or_else(|| rule("Order must be one of: asc, desc"))
}

/// Parse a string the numeric rule already accepted.
fn parse_number(field: &str, value: &str, message: &str) -> Result<u64, ApiError> {
    value
        .parse::<u64>()
        .map_err(|_| ApiError::field(field, message))
}

/// Take a field that a `required` rule already accepted.
fn take(field: &str, value: Option<String>) -> Result<String, ApiError> {
    value.ok_or_else(|| ApiError::field(field, format!("{} is required", field)))
}

// =============================================================================
// Auth
// =============================================================================

/// `POST /api/auth/register` body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(
        required(message = "Name is required"),
        length(min = 2, max = 100, message = "Name must be between 2 and 100 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email address")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Username is required"),
        length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"),
        regex(
            path = *USERNAME,
            message = "Username can only contain letters, numbers, and underscores"
        )
    )]
    pub username: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 6, max = 100, message = "Password must be between 6 and 100 characters")
    )]
    pub password: Option<String>,

    pub phone: Option<String>,

    #[validate(custom(function = "validate_website"))]
    pub website: Option<String>,

    #[validate(nested)]
    pub address: Option<AddressInput>,

    #[validate(nested)]
    pub company: Option<CompanyInput>,
}

/// Optional postal address of a registration. Once present, every part is
/// required.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(required(message = "Street is required"))]
    pub street: Option<String>,

    #[validate(required(message = "Suite is required"))]
    pub suite: Option<String>,

    #[validate(required(message = "City is required"))]
    pub city: Option<String>,

    #[validate(required(message = "Zipcode is required"))]
    pub zipcode: Option<String>,
}

impl AddressInput {
    fn into_address(self) -> Result<Address, ApiError> {
        Ok(Address {
            street: take("address.street", self.street)?,
            suite: take("address.suite", self.suite)?,
            city: take("address.city", self.city)?,
            zipcode: take("address.zipcode", self.zipcode)?,
        })
    }
}

/// Optional employer of a registration. Once present, every part is required.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    #[validate(required(message = "Company name is required"))]
    pub name: Option<String>,

    #[validate(required(message = "Catch phrase is required"))]
    pub catch_phrase: Option<String>,

    #[validate(required(message = "Bs is required"))]
    pub bs: Option<String>,
}

impl CompanyInput {
    fn into_company(self) -> Result<Company, ApiError> {
        Ok(Company {
            name: take("company.name", self.name)?,
            catch_phrase: take("company.catchPhrase", self.catch_phrase)?,
            bs: take("company.bs", self.bs)?,
        })
    }
}

/// A validated registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub profile: Profile,
}

impl Schema for RegisterRequest {
    type Output = Registration;

    const FIELDS: &'static [&'static str] = &[
        "name",
        "email",
        "username",
        "password",
        "phone",
        "website",
        "address",
        "address.street",
        "address.suite",
        "address.city",
        "address.zipcode",
        "company",
        "company.name",
        "company.catchPhrase",
        "company.bs",
    ];

    fn into_output(self) -> Result<Registration, ApiError> {
        Ok(Registration {
            name: take("name", self.name)?,
            email: take("email", self.email)?,
            username: take("username", self.username)?,
            password: take("password", self.password)?,
            profile: Profile {
                phone: self.phone,
                website: self.website.filter(|w| !w.is_empty()),
                address: self.address.map(AddressInput::into_address).transpose()?,
                company: self.company.map(CompanyInput::into_company).transpose()?,
            },
        })
    }
}

/// `POST /api/auth/login` body.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "Email is required"),
        email(message = "Invalid email address")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "Password is required"),
        length(min = 1, message = "Password is required")
    )]
    pub password: Option<String>,
}

/// Login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Schema for LoginRequest {
    type Output = Credentials;

    const FIELDS: &'static [&'static str] = &["email", "password"];

    fn into_output(self) -> Result<Credentials, ApiError> {
        Ok(Credentials {
            email: take("email", self.email)?,
            password: take("password", self.password)?,
        })
    }
}

// =============================================================================
// Albums
// =============================================================================

/// `POST /api/albums` body.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateAlbumRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "validate_title")
    )]
    pub title: Option<String>,
}

impl Schema for CreateAlbumRequest {
    type Output = String;

    const FIELDS: &'static [&'static str] = &["title"];

    fn into_output(self) -> Result<String, ApiError> {
        take("title", self.title)
    }
}

/// `PUT /api/albums/{id}` body.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAlbumRequest {
    #[validate(
        custom(function = "validate_title")
    )]
    pub title: Option<String>,
}

/// Fields an album update may overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumChanges {
    pub title: Option<String>,
}

impl Schema for UpdateAlbumRequest {
    type Output = AlbumChanges;

    const FIELDS: &'static [&'static str] = &["title"];

    fn into_output(self) -> Result<AlbumChanges, ApiError> {
        Ok(AlbumChanges { title: self.title })
    }
}

/// Query string of `GET /api/albums`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AlbumListParams {
    #[validate(
        regex(path = *NUMERIC, message = "Page must be a number"),
        custom(function = "validate_page")
    )]
    #[serde(rename = "_page")]
    pub _page: Option<String>,

    #[validate(
        regex(path = *NUMERIC, message = "Limit must be a number"),
        custom(function = "validate_limit")
    )]
    #[serde(rename = "_limit")]
    pub _limit: Option<String>,

    #[validate(length(max = 100, message = "Search term too long"))]
    pub search: Option<String>,

    #[validate(custom(function = "validate_user_id"))]
    pub user_id: Option<String>,

    #[validate(custom(function = "validate_sort"))]
    pub sort: Option<String>,

    #[validate(custom(function = "validate_order"))]
    pub order: Option<String>,
}

impl Schema for AlbumListParams {
    type Output = ListQuery;

    const FIELDS: &'static [&'static str] =
        &["_page", "_limit", "search", "userId", "sort", "order"];

    fn into_output(self) -> Result<ListQuery, ApiError> {
        build_list_query(ListFields {
            page: self._page,
            limit: self._limit,
            search: self.search,
            user_id: self.user_id,
            album_id: None,
            sort: self.sort,
            order: self.order,
        })
    }
}

// =============================================================================
// Photos
// =============================================================================

/// Text fields of the `POST /api/photos` multipart form.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadPhotoForm {
    #[validate(
        required(message = "Title is required"),
        custom(function = "validate_title")
    )]
    pub title: Option<String>,

    #[validate(
        required(message = "Album ID is required"),
        regex(path = *NUMERIC, message = "Album ID must be a valid number")
    )]
    pub album_id: Option<String>,
}

/// A validated upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub title: String,
    pub album_id: u64,
}

impl Schema for UploadPhotoForm {
    type Output = PhotoUpload;

    const FIELDS: &'static [&'static str] = &["title", "albumId"];

    fn into_output(self) -> Result<PhotoUpload, ApiError> {
        let album_id = take("albumId", self.album_id)?;
        Ok(PhotoUpload {
            title: take("title", self.title)?,
            album_id: parse_number("albumId", &album_id, "Album ID must be a valid number")?,
        })
    }
}

/// `PUT /api/photos/{id}` body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhotoRequest {
    #[validate(
        custom(function = "validate_title")
    )]
    pub title: Option<String>,

    #[validate(range(min = 1, message = "Album ID must be a positive number"))]
    pub album_id: Option<u64>,
}

/// Fields a photo update may overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoChanges {
    pub title: Option<String>,
    pub album_id: Option<u64>,
}

impl Schema for UpdatePhotoRequest {
    type Output = PhotoChanges;

    const FIELDS: &'static [&'static str] = &["title", "albumId"];

    fn into_output(self) -> Result<PhotoChanges, ApiError> {
        Ok(PhotoChanges {
            title: self.title,
            album_id: self.album_id,
        })
    }
}

/// Query string of `GET /api/photos`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PhotoListParams {
    #[validate(
        regex(path = *NUMERIC, message = "Page must be a number"),
        custom(function = "validate_page")
    )]
    #[serde(rename = "_page")]
    pub _page: Option<String>,

    #[validate(
        regex(path = *NUMERIC, message = "Limit must be a number"),
        custom(function = "validate_limit")
    )]
    #[serde(rename = "_limit")]
    pub _limit: Option<String>,

    #[validate(length(max = 100, message = "Search term too long"))]
    pub search: Option<String>,

    #[validate(custom(function = "validate_user_id"))]
    pub user_id: Option<String>,

    #[validate(regex(path = *NUMERIC, message = "Album ID must be a number"))]
    pub album_id: Option<String>,

    #[validate(custom(function = "validate_sort"))]
    pub sort: Option<String>,

    #[validate(custom(function = "validate_order"))]
    pub order: Option<String>,
}

impl Schema for PhotoListParams {
    type Output = ListQuery;

    const FIELDS: &'static [&'static str] =
        &["_page", "_limit", "search", "userId", "albumId", "sort", "order"];

    fn into_output(self) -> Result<ListQuery, ApiError> {
        build_list_query(ListFields {
            page: self._page,
            limit: self._limit,
            search: self.search,
            user_id: self.user_id,
            album_id: self.album_id,
            sort: self.sort,
            order: self.order,
        })
    }
}

/// Query string of `GET /api/albums/{albumId}/photos`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PageParams {
    #[validate(
        regex(path = *NUMERIC, message = "Page must be a number"),
        custom(function = "validate_page")
    )]
    #[serde(rename = "_page")]
    pub _page: Option<String>,

    #[validate(
        regex(path = *NUMERIC, message = "Limit must be a number"),
        custom(function = "validate_limit")
    )]
    #[serde(rename = "_limit")]
    pub _limit: Option<String>,
}

impl Schema for PageParams {
    type Output = Page;

    const FIELDS: &'static [&'static str] = &["_page", "_limit"];

    fn into_output(self) -> Result<Page, ApiError> {
        parse_page(self._page.as_deref(), self._limit.as_deref())
    }
}

// =============================================================================
// Shared list-query conversion
// =============================================================================

struct ListFields {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
    user_id: Option<String>,
    album_id: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

fn parse_page(page: Option<&str>, limit: Option<&str>) -> Result<Page, ApiError> {
    let page = match page {
        Some(raw) => parse_number("_page", raw, "Page must be a number")?,
        None => 1,
    };
    let limit = match limit {
        Some(raw) => parse_number("_limit", raw, "Limit must be a number")?,
        None => DEFAULT_LIMIT,
    };
    Ok(Page { page, limit })
}

fn build_list_query(fields: ListFields) -> Result<ListQuery, ApiError> {
    let page = parse_page(fields.page.as_deref(), fields.limit.as_deref())?;

    let user_id = fields
        .user_id
        .map(|raw| {
            Uuid::parse_str(&raw).map_err(|_| ApiError::field("userId", "User ID must be a valid user id"))
        })
        .transpose()?;

    let album_id = fields
        .album_id
        .map(|raw| parse_number("albumId", &raw, "Album ID must be a number"))
        .transpose()?;

    // An order without a sort field has nothing to apply to
    let sort = match fields.sort.as_deref().and_then(SortField::parse) {
        Some(field) => Some(Sort {
            field,
            order: fields
                .order
                .as_deref()
                .and_then(SortOrder::parse)
                .unwrap_or(SortOrder::Desc),
        }),
        None => None,
    };

    Ok(ListQuery {
        page,
        search: fields.search.filter(|s| !s.trim().is_empty()),
        user_id,
        album_id,
        sort,
    })
}
