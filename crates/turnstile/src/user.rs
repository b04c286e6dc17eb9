//! User identity records.
//!
//! Authentication resolves identity before requests reach this crate; the
//! engine only needs to know the user exists.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
}
