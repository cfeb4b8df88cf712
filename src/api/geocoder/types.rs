use serde::{Deserialize, Serialize};

/// One entry of a Nominatim `format=json` search result.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Place {
    // nominatim encodes coordinates as strings
    pub lat: String,
    pub lon: String,

    #[serde(default)]
    pub display_name: Option<String>,
}
