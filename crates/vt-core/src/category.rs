//! Domain categorization via static membership lists.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Productivity category assigned to a visit's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Social,
    #[default]
    Other,
}

impl Category {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Social => "social",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Self::Work),
            "social" => Ok(Self::Social),
            "other" => Ok(Self::Other),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

/// Default members of the work list.
const DEFAULT_WORK: &[&str] = &[
    "github.com",
    "gitlab.com",
    "stackoverflow.com",
    "docs.google.com",
    "atlassian.net",
    "notion.so",
    "linear.app",
    "figma.com",
];

/// Default members of the social list.
const DEFAULT_SOCIAL: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "reddit.com",
    "tiktok.com",
    "youtube.com",
    "linkedin.com",
];

/// Membership lists driving the classifier.
///
/// Anything matching neither list is [`Category::Other`]. Lists are
/// overridable through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLists {
    pub work: Vec<String>,
    pub social: Vec<String>,
}

impl Default for CategoryLists {
    fn default() -> Self {
        Self {
            work: DEFAULT_WORK.iter().map(ToString::to_string).collect(),
            social: DEFAULT_SOCIAL.iter().map(ToString::to_string).collect(),
        }
    }
}

impl CategoryLists {
    /// Classifies a domain. Matching is suffix-based, so `mail.google.com`
    /// matches a `google.com` entry; the work list wins over the social list.
    #[must_use]
    pub fn classify(&self, domain: &str) -> Category {
        let domain = domain.to_ascii_lowercase();
        if Self::contains(&self.work, &domain) {
            Category::Work
        } else if Self::contains(&self.social, &domain) {
            Category::Social
        } else {
            Category::Other
        }
    }

    fn contains(list: &[String], domain: &str) -> bool {
        list.iter().any(|entry| {
            domain == *entry
                || domain
                    .strip_suffix(entry.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
