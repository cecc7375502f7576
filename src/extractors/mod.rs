//! Request extractors: the logged-in user, JSON bodies and multipart catalog forms.

pub mod form;
pub mod json;
pub mod user;

pub use form::{FormData, UploadedFile};
pub use json::JsonBody;
pub use user::LoggedUser;
