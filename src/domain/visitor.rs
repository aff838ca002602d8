//! Visitor identity as captured by the widget contact form.

use serde::{Deserialize, Serialize};

/// The contact details an anonymous visitor submits before chatting.
/// Email is the resume key: the same email + property pair maps back to
/// the same open conversation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VisitorIdentity {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}
