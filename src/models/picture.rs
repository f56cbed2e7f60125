//! Represents a hosted image reference returned by the media store.

use serde::{Deserialize, Serialize};

/// A single uploaded picture attached to a car listing.
///
/// Both fields come back from the media store on upload and never change
/// afterwards. A picture belongs to exactly one car record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Picture {
    /// Stable HTTPS URL serving the image.
    pub url: String,

    /// Opaque asset identifier assigned by the media store.
    pub public_id: String,
}
