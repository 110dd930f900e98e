pub mod auth;
pub mod response;

pub use auth::{optional_auth, require_auth, Authenticator, CurrentUser, MaybeUser};
pub use response::{ApiResponse, ApiResult, Message};
