//! The unified error handling system for the application.

use std::fmt::Display;

pub use provider::{ProviderError, ProviderErrorKind};
pub use types::DashboardError;
pub use validation::ValidationErrors;

/// A unified `Result` type for the entire application.
pub type Result<T> = std::result::Result<T, DashboardError>;

pub mod macros;
pub mod provider;
pub mod types;
pub mod validation;

/// Context trait for adding context to errors.
pub trait Context<T, E> {
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<DashboardError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(DashboardError::Context {
                context: context().to_string(),
                source: Box::new(error.into()),
            }),
        }
    }
}
