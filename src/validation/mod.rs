//! Request validation.
//!
//! Every endpoint input (JSON body, query string, path id, multipart text
//! fields) is described by a declarative schema type deriving
//! [`validator::Validate`]. A schema either yields a typed, coerced value or the
//! complete list of [`FieldError`]s found in the input; a request never fails
//! validation with a partial list.
//!
//! ```text
//!   raw input ──serde──▶ Schema ──validate()──▶ Schema::into_output() ──▶ typed value
//!                  │                 │
//!                  ▼                 ▼
//!        single "body" error   every violation, in field declaration order
//! ```

mod extract;
mod schemas;

use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::error::ApiError;

pub use extract::{ResourceId, ValidatedJson, ValidatedQuery};
pub use schemas::{
    AddressInput, AlbumChanges, AlbumListParams, CompanyInput, CreateAlbumRequest, Credentials,
    LoginRequest, PageParams, PhotoChanges, PhotoListParams, PhotoUpload, RegisterRequest,
    Registration, Schema, UpdateAlbumRequest, UpdatePhotoRequest, UploadPhotoForm,
    DEFAULT_LIMIT, MAX_LIMIT,
};

/// One violated rule on one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field (e.g. `address.city`)
    pub field: String,

    /// Human-readable description of the rule that failed
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Flatten validator output into an ordered list of field errors.
///
/// Nested structs produce dotted paths and list items produce `field.N`
/// paths. `order` lists wire paths in declaration order: an error ranks by its
/// full path if listed, else by its top-level field. Unlisted fields go last,
/// by path. Errors on the same field keep their rule order.
pub fn field_errors(errors: &ValidationErrors, order: &[&str]) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, None, &mut out);
    out.sort_by_cached_key(|error| (rank(&error.field, order), error.field.clone()));
    out
}

fn rank(path: &str, order: &[&str]) -> usize {
    let top = path.split('.').next().unwrap_or(path);
    order
        .iter()
        .position(|field| *field == path)
        .or_else(|| order.iter().position(|field| *field == top))
        .unwrap_or(usize::MAX)
}

fn collect(errors: &ValidationErrors, prefix: Option<&str>, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let field = wire_name(field);
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field,
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", path));
                    out.push(FieldError::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, Some(&format!("{}.{}", path, index)), out);
                }
            }
        }
    }
}

/// Convert a Rust field name to the camelCase name clients send.
///
/// Leading underscores are kept so `_page` stays `_page`.
fn wire_name(field: &str) -> String {
    let trimmed = field.trim_start_matches('_');
    let mut out = "_".repeat(field.len() - trimmed.len());
    let mut upper = false;
    for c in trimmed.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Run a schema's rules and, if they all pass, coerce it into its output type.
pub fn validate<T: Schema>(raw: T) -> Result<T::Output, ApiError> {
    if let Err(errors) = raw.validate() {
        return Err(ApiError::Validation(field_errors(&errors, T::FIELDS)));
    }
    raw.into_output()
}
