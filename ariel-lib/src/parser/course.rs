use tracing::debug;

use crate::model::{Course, Instructor, Permissions, RelatedSite, SiteSummary};

use super::{
    dom::{Document, Element},
    text, Defect, Extractor, MalformedRowError,
};

// Labels of the course action links.
const INFO_SHEET_LABEL: &str = "Scheda";
const TOGGLE_FAVORITE_LABEL: &str = "preferito";
const ACTIVITY_LABEL: &str = "Attività";

// Columns of a history row.
const HISTORY_NAME_CELL: usize = 1;
const HISTORY_LAST_ACCESS_CELL: usize = 2;
const HISTORY_LINKS_CELL: usize = 4;

/// The course listing page. Never fails: rows missing parts get default values.
pub fn courses(document: &Document) -> Vec<Course> {
    let Some(table) = document.find(|element| element.is("table") && element.class_is("table"))
    else {
        return Vec::new();
    };

    direct_rows(table)
        .into_iter()
        .map(|row| {
            let site = row
                .find(|element| element.is("td") && element.class_is("col-md-11"))
                .and_then(|cell| cell.first("table"));
            match site {
                Some(site) => listed_course(row, site),
                None => {
                    let name = row
                        .first("strong")
                        .map(|strong| strong.text())
                        .unwrap_or_default();
                    debug!(%name, "course without active site");
                    Course::listed_without_site(name, fallback_edition(row))
                }
            }
        })
        .collect()
}

fn listed_course(row: Element<'_>, site: Element<'_>) -> Course {
    let labels = site.find_all(|element| element.is("span") && element.class_is("tag bg-B"));
    // Courses split in modules render edition and module as inline tags inside the site table.
    let (edition, module) = match labels.as_slice() {
        [] => (fallback_edition(row), String::new()),
        [edition] => (edition.text(), String::new()),
        [edition, module, ..] => (edition.text(), module.text()),
    };

    let summary = SiteSummary {
        related_sites: related_sites(row),
        ..site_summary(site)
    };
    Course::listed(summary, edition, module)
}

fn fallback_edition(row: Element<'_>) -> String {
    row.find(|element| {
        element.is("span")
            && (element.class_is("tag pull-right bg-B") || element.class_is("tag bg-B"))
    })
    .map(|span| span.text())
    .unwrap_or_default()
}

/// Recently visited courses.
///
/// Rows are read by column position and fail the whole list when a column is missing.
pub fn course_history(document: &Document) -> Result<Vec<Course>, MalformedRowError> {
    let Some(table) = document.find(|element| element.is("table") && element.class_is("table"))
    else {
        return Ok(Vec::new());
    };

    table
        .find_all(|element| element.is("tr") && element.has_attributes())
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let cells = row.all("td");
            if cells.len() <= HISTORY_LINKS_CELL {
                return Err(MalformedRowError::new(
                    Extractor::History,
                    index,
                    Defect::MissingCell(HISTORY_LINKS_CELL + 1),
                ));
            }

            let site = cells[HISTORY_NAME_CELL].first("a");
            // Info sheet, remove from history, toggle favorite.
            let links = cells[HISTORY_LINKS_CELL].all("a");

            Ok(Course::history(
                site.map(|anchor| anchor.text()).unwrap_or_default(),
                site.map(|anchor| anchor.href()).unwrap_or_default(),
                cells[HISTORY_LAST_ACCESS_CELL].text(),
                links.first().map(Element::href).unwrap_or_default(),
                links.get(1).map(Element::href).unwrap_or_default(),
                links.last().map(Element::href).unwrap_or_default(),
            ))
        })
        .collect()
}

/// Courses marked as favorite.
pub fn favorite_courses(document: &Document) -> Vec<Course> {
    let Some(table) = document.find(|element| {
        element.is("table")
            && element.class_is("table")
            && element.attr_matches("id", |id| id == "favoriteTable")
    }) else {
        return Vec::new();
    };

    table
        .find_all(|element| element.is("tr") && element.has_attributes())
        .into_iter()
        .map(|row| {
            let anchor = row
                .find(|element| element.is("td") && element.class_is("col-md-11"))
                .and_then(|cell| cell.first("a"));
            Course::favorite(SiteSummary {
                name: anchor.map(|anchor| anchor.text()).unwrap_or_default(),
                link: anchor.map(|anchor| anchor.href()).unwrap_or_default(),
                related_sites: related_sites(row),
                ..site_summary(row)
            })
        })
        .collect()
}

/// Courses found by the site search.
pub fn search_results(document: &Document) -> Vec<Course> {
    let Some(results) = document
        .find(|element| element.is("div") && element.class_contains("tab-content"))
        .and_then(|tabs| {
            tabs.find(|element| {
                element.is("div") && element.attr_matches("id", |id| id.contains("sitiariel"))
            })
        })
    else {
        return Vec::new();
    };

    results
        .find_all(|element| element.is("div") && element.class_contains("col-md-6"))
        .into_iter()
        .map(|result| {
            Course::search_result(SiteSummary {
                related_sites: related_sites(result),
                ..site_summary(result)
            })
        })
        .collect()
}

/// Name and link from the first anchor, plus everything the site box lists.
fn site_summary(node: Element<'_>) -> SiteSummary {
    let anchor = node.first("a");
    let actions = project_details(node, 1);
    let link_to = |label| link_by_label(actions.as_deref().unwrap_or_default(), label);

    SiteSummary {
        name: anchor.map(|anchor| anchor.text()).unwrap_or_default(),
        link: anchor.map(|anchor| anchor.href()).unwrap_or_default(),
        instructors: instructors(node),
        related_sites: Vec::new(),
        permissions: permissions(node),
        toggle_favorite: link_to(TOGGLE_FAVORITE_LABEL),
        activity: link_to(ACTIVITY_LABEL),
        info_sheet: link_to(INFO_SHEET_LABEL),
    }
}

fn instructors(node: Element<'_>) -> Vec<Instructor> {
    node.find(|element| element.is("div") && element.class_is("table-view"))
        .and_then(|view| {
            view.find(|element| element.is("ul") && element.class_is("list-inline list-user"))
        })
        .map(|list| {
            list.all("li")
                .into_iter()
                .map(|item| {
                    let anchor = item.first("a");
                    Instructor {
                        name: anchor.map(|anchor| anchor.text()).unwrap_or_default(),
                        link: anchor.map(|anchor| anchor.href()).unwrap_or_default(),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

fn related_sites(row: Element<'_>) -> Vec<RelatedSite> {
    row.find(|element| element.is("ul") && element.class_is("list-unstyled"))
        .map(|list| {
            list.all("li")
                .into_iter()
                .map(|item| {
                    let anchor = item.first("a");
                    RelatedSite {
                        name: anchor.map(|anchor| anchor.text()).unwrap_or_default(),
                        link: anchor.map(|anchor| anchor.href()).unwrap_or_default(),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

fn permissions(node: Element<'_>) -> Permissions {
    let labels = project_details(node, 0)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|row| row.first("span").map(|span| span.text()))
        .collect::<Vec<_>>();
    text::permissions(labels.iter().map(String::as_str))
}

/// Items of the `index`-th list in the project details box: 0 holds permission labels, 1 the
/// action links.
fn project_details<'a>(node: Element<'a>, index: usize) -> Option<Vec<Element<'a>>> {
    let details = node.find(|element| element.is("div") && element.class_is("project-details"))?;
    let list = details.all("ul").into_iter().nth(index)?;
    Some(list.all("li"))
}

/// The link of the first row whose anchor text contains `label`, empty if none does.
fn link_by_label(rows: &[Element<'_>], label: &str) -> String {
    rows.iter()
        .filter_map(|row| row.first("a"))
        .find(|anchor| anchor.text().contains(label))
        .map(|anchor| anchor.href())
        .unwrap_or_default()
}

/// Rows of `table` itself, leaving out the ones of nested tables.
fn direct_rows(table: Element<'_>) -> Vec<Element<'_>> {
    table
        .children()
        .into_iter()
        .flat_map(|child| {
            if child.is("tr") {
                vec![child]
            } else if child.is("tbody") || child.is("thead") || child.is("tfoot") {
                child.children().into_iter().filter(|row| row.is("tr")).collect()
            } else {
                Vec::new()
            }
        })
        .collect()
}
