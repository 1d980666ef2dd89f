use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One invited person. A guest is pending until `checked_in_at` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub confirmation: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub checked_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Option<GuestCategory>,
}

impl Guest {
    pub fn is_checked_in(&self) -> bool {
        self.checked_in_at.is_some()
    }

    pub fn bucket(&self) -> Bucket {
        if self.is_checked_in() {
            Bucket::CheckedIn
        } else {
            Bucket::Pending
        }
    }

    /// Display style for this guest's category, falling back to the default.
    pub fn style(&self) -> CategoryStyle {
        CategoryStyle::for_category(self.category)
    }
}

/// The two disjoint listings a guest can appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Pending,
    CheckedIn,
}

/// Relationship of a guest to the couple. Display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestCategory {
    Friend,
    ParentsGuest,
    WeddingParty,
    Family,
    Work,
    PartnerFriend,
}

impl GuestCategory {
    pub const ALL: [GuestCategory; 6] = [
        GuestCategory::Friend,
        GuestCategory::ParentsGuest,
        GuestCategory::WeddingParty,
        GuestCategory::Family,
        GuestCategory::Work,
        GuestCategory::PartnerFriend,
    ];

    /// Stable label used in storage and query strings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::ParentsGuest => "parents_guest",
            Self::WeddingParty => "wedding_party",
            Self::Family => "family",
            Self::Work => "work",
            Self::PartnerFriend => "partner_friend",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Friend => "Friend",
            Self::ParentsGuest => "Parents' guest",
            Self::WeddingParty => "Wedding party",
            Self::Family => "Family",
            Self::Work => "Work",
            Self::PartnerFriend => "Partner's friend",
        }
    }
}

impl std::fmt::Display for GuestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Color and icon a front end uses to render a category badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryStyle {
    pub category: Option<GuestCategory>,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

impl CategoryStyle {
    pub const DEFAULT: CategoryStyle = CategoryStyle {
        category: None,
        label: "Guest",
        color: "gray",
        icon: "user",
    };

    pub fn for_category(category: Option<GuestCategory>) -> Self {
        let Some(category) = category else {
            return Self::DEFAULT;
        };

        let (color, icon) = match category {
            GuestCategory::Friend => ("blue", "user-circle"),
            GuestCategory::ParentsGuest => ("green", "users"),
            GuestCategory::WeddingParty => ("purple", "crown"),
            GuestCategory::Family => ("red", "home"),
            GuestCategory::Work => ("yellow", "briefcase"),
            GuestCategory::PartnerFriend => ("pink", "heart"),
        };

        Self {
            category: Some(category),
            label: category.display_name(),
            color,
            icon,
        }
    }

    /// Style for a raw stored label; unknown labels get the default.
    pub fn for_label(label: &str) -> Self {
        Self::for_category(GuestCategory::from_label(label))
    }

    /// Every known category followed by the fallback entry.
    pub fn table() -> Vec<CategoryStyle> {
        GuestCategory::ALL
            .into_iter()
            .map(|c| Self::for_category(Some(c)))
            .chain(std::iter::once(Self::DEFAULT))
            .collect()
    }
}
