use std::fmt;

use tracing::warn;

use crate::model::RecentActivity;

use super::{
    dom::{Document, Element},
    text, Defect, Extractor, MalformedRowError,
};

/// The links of an activity row, in the order the platform renders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSlot {
    Thread,
    Tool,
    Environment,
}

impl LinkSlot {
    fn index(self) -> usize {
        match self {
            LinkSlot::Thread => 0,
            LinkSlot::Tool => 1,
            LinkSlot::Environment => 2,
        }
    }
}

impl fmt::Display for LinkSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkSlot::Thread => "thread",
            LinkSlot::Tool => "tool",
            LinkSlot::Environment => "environment",
        })
    }
}

/// Anchors of a row addressed by slot rather than by raw position.
struct RowLinks<'a> {
    anchors: Vec<Element<'a>>,
    row: usize,
}

impl<'a> RowLinks<'a> {
    fn get(&self, slot: LinkSlot) -> Result<Element<'a>, MalformedRowError> {
        self.anchors.get(slot.index()).copied().ok_or_else(|| {
            MalformedRowError::new(Extractor::RecentActivity, self.row, Defect::MissingLink(slot))
        })
    }
}

/// Entries of the recent-activity feed.
///
/// Day headers and rows without a main cell are skipped; a data row missing its title, author,
/// date or any of its three links fails the whole feed.
pub fn recent_activity(document: &Document) -> Result<Vec<RecentActivity>, MalformedRowError> {
    let Some(table) = document.find(|element| element.is("table") && element.class_is("table"))
    else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    for (index, row) in table.all("tr").into_iter().enumerate() {
        // Groups entries of the same day.
        if row.first("th").is_some() {
            continue;
        }
        let Some(cell) = row.find(|element| element.is("td") && element.class_contains("col-md-8"))
        else {
            warn!(row = index, "skipping activity row without main cell");
            continue;
        };
        entries.push(entry(row, cell, index)?);
    }
    Ok(entries)
}

fn entry(
    row: Element<'_>,
    cell: Element<'_>,
    index: usize,
) -> Result<RecentActivity, MalformedRowError> {
    let malformed =
        |node| MalformedRowError::new(Extractor::RecentActivity, index, Defect::MissingNode(node));

    let title = cell.first("span").ok_or_else(|| malformed("title"))?.text();
    let author = cell.first("strong").ok_or_else(|| malformed("author"))?.text();

    let links = RowLinks {
        anchors: cell.all("a"),
        row: index,
    };
    let thread = links.get(LinkSlot::Thread)?;
    let tool = links.get(LinkSlot::Tool)?;
    let environment = links.get(LinkSlot::Environment)?;

    let tags = cell.find_all(|element| element.is("span") && element.class_is("tag bg-tag-grey"));
    // The attachment tag only shows up next to the date tag.
    let attachments = match tags.as_slice() {
        [attachments, _date] => text::digits(&attachments.text()),
        _ => 0,
    };
    let date = tags
        .last()
        .ok_or_else(|| malformed("date"))?
        .first("strong")
        .map(|strong| strong.text())
        .unwrap_or_default();

    let course = row
        .find(|element| element.is("td") && element.class_contains("col-md-3"))
        .and_then(|cell| cell.first("a"));

    Ok(RecentActivity {
        course_name: course.map(|anchor| anchor.text()).unwrap_or_default(),
        course_link: course.map(|anchor| anchor.href()).unwrap_or_default(),
        title,
        title_link: thread.href(),
        author,
        attachments,
        date,
        tool: tool.text(),
        tool_link: tool.href(),
        environment: environment.text(),
        environment_link: environment.href(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tags: &str, anchors: &str) -> String {
        format!(
            r#"<tr>
                <td class="col-md-3"><a href="/sito/bd">Basi di dati</a></td>
                <td class="col-md-8">
                    <span>Nuovo avviso</span> di <strong>Mario Rossi</strong>
                    {anchors}
                    {tags}
                </td>
            </tr>"#
        )
    }

    fn feed(rows: &[String]) -> Document {
        format!(
            r#"<table class="table"><tbody>
                <tr><th colspan="2">Oggi</th></tr>
                {}
            </tbody></table>"#,
            rows.concat()
        )
        .parse()
        .unwrap()
    }

    const ANCHORS: &str = r#"
        <a href="/v5/frm3/ThreadList.aspx?msg=1">apri</a>
        <a href="/v5/frm3/ThreadList.aspx?name=forum">Forum</a>
        <a href="/v5/frm3/?name=lezioni">Lezioni</a>
    "#;

    #[test]
    fn two_tags_give_attachments_and_date() {
        let document = feed(&[row(
            r#"<span class="tag bg-tag-grey">3 allegati</span>
               <span class="tag bg-tag-grey">alle <strong> 10:35 </strong></span>"#,
            ANCHORS,
        )]);
        let entries = recent_activity(&document).unwrap();
        assert_eq!(
            entries,
            [RecentActivity {
                course_name: "Basi di dati".to_owned(),
                course_link: "/sito/bd".to_owned(),
                title: "Nuovo avviso".to_owned(),
                title_link: "/v5/frm3/ThreadList.aspx?msg=1".to_owned(),
                author: "Mario Rossi".to_owned(),
                attachments: 3,
                date: "10:35".to_owned(),
                tool: "Forum".to_owned(),
                tool_link: "/v5/frm3/ThreadList.aspx?name=forum".to_owned(),
                environment: "Lezioni".to_owned(),
                environment_link: "/v5/frm3/?name=lezioni".to_owned(),
            }]
        );
    }

    #[test]
    fn two_tags_without_count() {
        let document = feed(&[row(
            r#"<span class="tag bg-tag-grey">allegati</span>
               <span class="tag bg-tag-grey">il <strong>12/03/2019</strong></span>"#,
            ANCHORS,
        )]);
        let entries = recent_activity(&document).unwrap();
        assert_eq!(entries[0].attachments, 0);
        assert_eq!(entries[0].date, "12/03/2019");
    }

    #[test]
    fn single_tag_has_no_attachments() {
        let document = feed(&[row(
            r#"<span class="tag bg-tag-grey"><strong>ieri</strong></span>"#,
            ANCHORS,
        )]);
        let entries = recent_activity(&document).unwrap();
        assert_eq!(entries[0].attachments, 0);
        assert_eq!(entries[0].date, "ieri");
    }

    #[test]
    fn headers_and_rows_without_main_cell_are_skipped() {
        let document = feed(&[
            "<tr><td class=\"col-md-12\">pubblicità</td></tr>".to_owned(),
            row(r#"<span class="tag bg-tag-grey"><strong>oggi</strong></span>"#, ANCHORS),
        ]);
        assert_eq!(recent_activity(&document).unwrap().len(), 1);
    }

    #[test]
    fn missing_link_names_its_slot() {
        let document = feed(&[row(
            r#"<span class="tag bg-tag-grey"><strong>oggi</strong></span>"#,
            r#"<a href="/thread">apri</a><a href="/tool">Forum</a>"#,
        )]);
        let err = recent_activity(&document).unwrap_err();
        assert_eq!(err.extractor, Extractor::RecentActivity);
        assert_eq!(err.row, 1);
        assert_eq!(err.defect, Defect::MissingLink(LinkSlot::Environment));
    }

    #[test]
    fn missing_date_tag_fails() {
        let document = feed(&[row("", ANCHORS)]);
        let err = recent_activity(&document).unwrap_err();
        assert_eq!(err.defect, Defect::MissingNode("date"));
    }

    #[test]
    fn no_table_no_entries() {
        let document: Document = "<div>vuoto</div>".parse().unwrap();
        assert!(recent_activity(&document).unwrap().is_empty());
    }
}
