//! Wire types shared by the evento client and CLI.

pub mod envelope;
pub mod error;
pub mod model;

pub use envelope::{ApiResult, Envelope};
pub use error::{
    ApiError, ApiErrorKind, DEFAULT_ERROR_MESSAGE, INVALID_CREDENTIALS_MESSAGE,
    NOT_LOGGED_IN_MESSAGE, RawFieldErrors,
};
pub use model::{
    AttendeesPayload, AuthStatus, CategoriesPayload, Category, Empty, Event, EventPayload,
    EventsPayload, NewEvent, SigninPayload, User,
};
