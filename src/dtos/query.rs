//! Query parameter DTOs.

use serde::Deserialize;

/// Filters for the conversation list endpoint. Omitting `archived`
/// yields the default active view.
#[derive(Deserialize, Debug, Default)]
pub struct ConversationsQuery {
    pub assigned_to: Option<i32>,
    pub archived: Option<bool>,
}
