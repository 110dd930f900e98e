// handlers/mod.rs - two security tiers
//
// Public (no auth, or optional auth) → Protected (bearer token required).
// Protected handlers receive the resolved `CurrentUser` and pass its id to
// the services, which scope every query by it.
pub mod protected;
pub mod public;

use serde::Deserialize;

/// `?skip=&limit=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}
