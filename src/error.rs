use thiserror::Error;

/// Errors raised by the office modules.
///
/// The HTTP layer collapses all of these into a `{ "success": false }`
/// action result; the variants exist so the cause can be logged and tested.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("amount {amount} exceeds the per-item limit of {limit}")]
    LimitExceeded { amount: i64, limit: i64 },

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("template source error: {0}")]
    TemplateSource(#[from] handlebars::TemplateError),

    #[error("export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AppError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Invalid(message.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
