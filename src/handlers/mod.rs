// Handlers are split by security tier:
// public (no auth) -> protected (JWT) -> elevated (staff JWT).
// Route wiring and middleware live in `crate::app`.

pub mod elevated;
pub mod extract;
pub mod protected;
pub mod public;

use serde::Deserialize;

use crate::config;
use crate::database::PropertyQuery;

/// Query string shared by the property listings.
#[derive(Debug, Default, Deserialize)]
pub struct PropertyListParams {
    pub search: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PropertyListParams {
    /// Empty filters are treated as absent; page size is clamped by config.
    pub fn into_query(self) -> PropertyQuery {
        let api = &config::config().api;
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        PropertyQuery {
            search: non_empty(self.search),
            city: non_empty(self.city),
            state: non_empty(self.state),
            ..PropertyQuery::paged(self.page, self.page_size, api.default_page_size, api.max_page_size)
        }
    }
}
