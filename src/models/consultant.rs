//! Signed-in consultant profile.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Google profile of the signed-in sales consultant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Consultant {
    /// Google account ID
    pub id: String,
    pub email: String,
    pub name: String,
    /// Profile picture URL
    #[serde(default)]
    pub picture: String,
}
