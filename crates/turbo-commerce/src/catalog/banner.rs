//! Home page banners.

use crate::ids::BannerId;
use serde::{Deserialize, Serialize};

/// Where a banner is shown on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BannerPlacement {
    /// Thin strip above the carousel.
    Top,
    /// Main carousel slide.
    #[default]
    Main,
    /// Side panel next to the carousel.
    Side,
    /// A placement this client does not know about.
    #[serde(untagged)]
    Other(String),
}

impl BannerPlacement {
    pub fn as_str(&self) -> &str {
        match self {
            BannerPlacement::Top => "top",
            BannerPlacement::Main => "main",
            BannerPlacement::Side => "side",
            BannerPlacement::Other(s) => s,
        }
    }
}

/// A promotional banner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub id: BannerId,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub placement: BannerPlacement,
}
