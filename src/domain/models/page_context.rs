use serde_derive::Deserialize;
use serde_derive::Serialize;

pub const DEFAULT_TITLE: &str = "No title";
pub const DEFAULT_ICON: &str = "default-icon.png";

/// The page the chat was opened next to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub title: String,
    pub url: String,
    pub icon: String,
}

impl PageContext {
    /// Blank fields fall back to the same placeholders the popup shows.
    pub fn new(title: &str, url: &str, icon: &str) -> PageContext {
        let title = if title.trim().is_empty() {
            DEFAULT_TITLE
        } else {
            title
        };
        let icon = if icon.trim().is_empty() {
            DEFAULT_ICON
        } else {
            icon
        };

        return PageContext {
            title: title.to_string(),
            url: url.to_string(),
            icon: icon.to_string(),
        };
    }
}

impl Default for PageContext {
    fn default() -> PageContext {
        return PageContext::new("", "", "");
    }
}
