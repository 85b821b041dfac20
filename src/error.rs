//! Crate-wide error taxonomy.
//!
//! One flat enum; writer failures carry a breadcrumb chain (`WriteContext`)
//! naming the field/type that was being rendered when the inner error fired,
//! so callers see `failed to write query for struct field `X`: ...`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // ---- document writer ---- //
    /// Native maps have no guaranteed field order, so they are rejected
    /// everywhere a shape is walked.
    #[error("type map is not supported, use ordered pairs instead")]
    MapNotSupported,

    #[error("failed to write query for {context}: {source}")]
    WriteContext {
        context: String,
        #[source]
        source: Box<Error>,
    },

    // ---- decoder: stream shape ---- //
    #[error("struct field for {key:?} doesn't exist in any of {places} places to unmarshal")]
    NoFieldForKey { key: String, places: usize },

    #[error("slice doesn't exist in any of {places} places to unmarshal")]
    NoSliceForArray { places: usize },

    #[error("template slice can only have 1 item, got {got}")]
    TemplateTooLong { got: usize },

    #[error("unexpected token {token} at {at}")]
    UnexpectedToken { token: String, at: String },

    #[error("invalid token '{token}' after top-level value")]
    TrailingToken { token: String },

    #[error("failed to copy template: map templates are not supported, use ordered pairs instead")]
    MapTemplate,

    #[error("unexpected end of JSON input")]
    UnexpectedEnd,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    // ---- decoder: value conversion ---- //
    #[error("cannot convert {got} into {want} value")]
    Conversion { got: String, want: String },

    // ---- response envelope ---- //
    #[error("invalid response envelope at {path}: {message}")]
    Envelope { path: String, message: String },
}

impl Error {
    /// Wrap with a writer breadcrumb, e.g. `struct field `Name``.
    pub(crate) fn in_write_context(self, context: impl Into<String>) -> Error {
        Error::WriteContext { context: context.into(), source: Box::new(self) }
    }
}
