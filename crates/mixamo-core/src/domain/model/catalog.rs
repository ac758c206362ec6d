use serde::{Deserialize, Serialize};

/// A character listed on the site, discovered by scraping the character listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Absolute URL of the character's detail page
    pub page_url: String,
}

/// An animation that can be exported for a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animation {
    pub id: String,
    pub name: String,
    /// Absolute URL of the page carrying the download action
    pub page_url: String,
}

impl Animation {
    /// Case-insensitive substring match on the display name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animation(name: &str) -> Animation {
        Animation {
            id: name.to_lowercase(),
            name: name.to_string(),
            page_url: format!("https://example.com/{}", name),
        }
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let anim = animation("Walking Backwards");
        assert!(anim.matches("walk"));
        assert!(anim.matches("BACK"));
        assert!(anim.matches("  "));
        assert!(!anim.matches("run"));
    }
}
