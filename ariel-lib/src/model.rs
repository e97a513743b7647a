//! Records produced by the extractors.
//!
//! Every record is an owned snapshot of the page it came from; list fields keep document order.

use std::fmt;

use chrono::NaiveDateTime;
#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

/// The page a [`Course`](Course) was read from, which decides the fields it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub enum CourseVariant {
    /// Recently visited courses: name, link, last access, info sheet, remove and
    /// toggle-favorite links.
    History,
    /// Courses marked as favorite: name, link, instructors, related sites, access and public
    /// flags, action links.
    Favorites,
    /// Site search results: same as [`Favorites`](CourseVariant::Favorites) plus the favorite
    /// flag.
    SearchResult,
    /// The full course listing: everything but the history fields. Courses without an active
    /// site only carry name and edition.
    FullListing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Permissions {
    pub can_access: bool,
    pub is_public: bool,
    pub is_favorite: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            can_access: true,
            is_public: false,
            is_favorite: false,
        }
    }
}

/// Links to the actions available on a course. Empty when the action is not offered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct CourseLinks {
    pub toggle_favorite: String,
    pub activity: String,
    pub info_sheet: String,
    pub remove_from_history: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Instructor {
    pub name: String,
    /// Profile page.
    pub link: String,
}

impl fmt::Display for Instructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.name, self.link)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct RelatedSite {
    pub name: String,
    pub link: String,
}

impl fmt::Display for RelatedSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.name, self.link)
    }
}

/// What the course-site pages share: everything but the page-specific extras.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteSummary {
    pub name: String,
    pub link: String,
    pub instructors: Vec<Instructor>,
    pub related_sites: Vec<RelatedSite>,
    pub permissions: Permissions,
    pub toggle_favorite: String,
    pub activity: String,
    pub info_sheet: String,
}

/// A course site ("insegnamento").
///
/// Only buildable through one constructor per [`CourseVariant`](CourseVariant); fields outside
/// the variant keep their defaults (empty strings and lists, [`Permissions::default`]).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Course {
    name: String,
    link: String,
    edition: String,
    module: String,
    last_access: String,
    instructors: Vec<Instructor>,
    related_sites: Vec<RelatedSite>,
    permissions: Permissions,
    links: CourseLinks,
    variant: CourseVariant,
}

impl Course {
    fn empty(variant: CourseVariant) -> Self {
        Self {
            name: String::new(),
            link: String::new(),
            edition: String::new(),
            module: String::new(),
            last_access: String::new(),
            instructors: Vec::new(),
            related_sites: Vec::new(),
            permissions: Permissions::default(),
            links: CourseLinks::default(),
            variant,
        }
    }

    fn from_site(site: SiteSummary, variant: CourseVariant) -> Self {
        Self {
            name: site.name,
            link: site.link,
            instructors: site.instructors,
            related_sites: site.related_sites,
            permissions: site.permissions,
            links: CourseLinks {
                toggle_favorite: site.toggle_favorite,
                activity: site.activity,
                info_sheet: site.info_sheet,
                remove_from_history: String::new(),
            },
            ..Self::empty(variant)
        }
    }

    pub fn history(
        name: String,
        link: String,
        last_access: String,
        info_sheet: String,
        remove_from_history: String,
        toggle_favorite: String,
    ) -> Self {
        Self {
            name,
            link,
            last_access,
            links: CourseLinks {
                toggle_favorite,
                info_sheet,
                remove_from_history,
                activity: String::new(),
            },
            ..Self::empty(CourseVariant::History)
        }
    }

    /// The favorite flag is not read on the favorites page and stays `false`.
    pub fn favorite(site: SiteSummary) -> Self {
        let mut course = Self::from_site(site, CourseVariant::Favorites);
        course.permissions.is_favorite = false;
        course
    }

    pub fn search_result(site: SiteSummary) -> Self {
        Self::from_site(site, CourseVariant::SearchResult)
    }

    /// A listed course with an active site.
    pub fn listed(site: SiteSummary, edition: String, module: String) -> Self {
        Self {
            edition,
            module,
            ..Self::from_site(site, CourseVariant::FullListing)
        }
    }

    /// A listed course without an active site.
    pub fn listed_without_site(name: String, edition: String) -> Self {
        Self {
            name,
            edition,
            ..Self::empty(CourseVariant::FullListing)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn edition(&self) -> &str {
        &self.edition
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// When the course was last visited, as shown by the history page.
    pub fn last_access(&self) -> &str {
        &self.last_access
    }

    pub fn instructors(&self) -> &[Instructor] {
        &self.instructors
    }

    pub fn related_sites(&self) -> &[RelatedSite] {
        &self.related_sites
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn links(&self) -> &CourseLinks {
        &self.links
    }

    pub fn variant(&self) -> CourseVariant {
        self.variant
    }
}

/// A top-level content area of a course site ("ambiente").
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Room {
    pub name: String,
    pub description: String,
    pub link: String,
    pub total_items: u32,
    /// Usually no more than `total_items`, not enforced.
    pub unread_items: u32,
}

/// A discussion or announcement inside a room ("sottoambiente").
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Thread {
    pub name: String,
    pub description: String,
    pub author: String,
    pub date: NaiveDateTime,
    pub edits: Vec<Edit>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Edit {
    pub author: String,
    /// Kept as shown by the platform, the format isn't reliable enough to parse.
    pub date: String,
}

impl fmt::Display for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.author, self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Attachment {
    pub name: String,
    pub description: String,
    pub link: String,
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.trim().is_empty() {
            write!(f, "{}\n{}", self.name, self.link)
        } else {
            write!(f, "{}\n{}\n{}", self.name, self.description, self.link)
        }
    }
}

/// Rooms and threads of a single page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct Page {
    pub rooms: Vec<Room>,
    pub threads: Vec<Thread>,
}

/// One row of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize))]
pub struct RecentActivity {
    pub course_name: String,
    pub course_link: String,
    pub title: String,
    pub title_link: String,
    pub author: String,
    pub attachments: u32,
    pub date: String,
    pub tool: String,
    pub tool_link: String,
    pub environment: String,
    pub environment_link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteSummary {
        SiteSummary {
            name: "Basi di dati".to_owned(),
            link: "https://example.org/bd".to_owned(),
            instructors: vec![Instructor {
                name: "Ada".to_owned(),
                link: "/ada".to_owned(),
            }],
            related_sites: Vec::new(),
            permissions: Permissions {
                can_access: true,
                is_public: true,
                is_favorite: true,
            },
            toggle_favorite: "/fav".to_owned(),
            activity: "/act".to_owned(),
            info_sheet: "/sheet".to_owned(),
        }
    }

    #[test]
    fn favorite_drops_favorite_flag() {
        let course = Course::favorite(site());
        assert_eq!(course.variant(), CourseVariant::Favorites);
        assert!(course.permissions().is_public);
        assert!(!course.permissions().is_favorite);
        assert_eq!(course.edition(), "");
    }

    #[test]
    fn search_result_keeps_favorite_flag() {
        let course = Course::search_result(site());
        assert_eq!(course.variant(), CourseVariant::SearchResult);
        assert!(course.permissions().is_favorite);
        assert_eq!(course.links().activity, "/act");
        assert_eq!(course.links().remove_from_history, "");
    }

    #[test]
    fn listed_without_site_uses_defaults() {
        let course = Course::listed_without_site("Fisica".to_owned(), "2019/2020".to_owned());
        assert_eq!(course.variant(), CourseVariant::FullListing);
        assert_eq!(course.link(), "");
        assert_eq!(course.links(), &CourseLinks::default());
        assert!(course.related_sites().is_empty());
        assert!(course.instructors().is_empty());
        assert_eq!(course.permissions(), Permissions::default());
    }

    #[test]
    fn history_only_sets_history_fields() {
        let course = Course::history(
            "Analisi".to_owned(),
            "/analisi".to_owned(),
            "ieri".to_owned(),
            "/sheet".to_owned(),
            "/remove".to_owned(),
            "/fav".to_owned(),
        );
        assert_eq!(course.variant(), CourseVariant::History);
        assert_eq!(course.last_access(), "ieri");
        assert_eq!(course.links().remove_from_history, "/remove");
        assert_eq!(course.links().activity, "");
        assert_eq!(course.permissions(), Permissions::default());
    }

    #[test]
    fn attachment_rendering_skips_blank_description() {
        let attachment = Attachment {
            name: "slides.pdf".to_owned(),
            description: " ".to_owned(),
            link: "/slides.pdf".to_owned(),
        };
        assert_eq!(attachment.to_string(), "slides.pdf\n/slides.pdf");
    }
}
