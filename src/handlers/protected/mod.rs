// handlers/protected/mod.rs - endpoints behind `require_auth`
//
// Each handler takes `Extension<CurrentUser>` and never looks at another
// user's id except to compare it with its own.
pub mod appointments;
pub mod auth;
pub mod family_members;
pub mod health_records;
pub mod medications;
pub mod users;
