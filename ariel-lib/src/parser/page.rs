use crate::model::{Attachment, Edit, Page, Room, Thread};

use super::{
    dom::{Document, Element},
    text, Defect, Extractor, MalformedRowError,
};

/// Rooms and threads of a room page.
pub fn page(document: &Document) -> Result<Page, MalformedRowError> {
    Ok(Page {
        rooms: rooms(document),
        threads: threads(document)?,
    })
}

/// Rooms listed on a page, empty if the page has no room table.
pub fn rooms(document: &Document) -> Vec<Room> {
    let Some(table) =
        document.find(|element| element.is("tbody") && element.class_starts_with("arielRoomList"))
    else {
        return Vec::new();
    };

    table
        .find_all(|element| {
            element.is("tr") && element.attr_matches("id", |id| id.starts_with("room"))
        })
        .into_iter()
        .map(|row| {
            let anchor = row.first("a");
            let (total_items, unread_items) = row
                .first("small")
                .map_or((0, 0), |small| text::item_counts(&small.text()));

            Room {
                name: anchor.map(|anchor| anchor.text()).unwrap_or_default(),
                description: row.last("span").map(|span| span.text()).unwrap_or_default(),
                link: anchor.map(|anchor| anchor.href()).unwrap_or_default(),
                total_items,
                unread_items,
            }
        })
        .collect()
}

/// Threads listed on a page, empty if the page has no thread table.
///
/// Fails on the first row without a readable creation date or with a malformed edit entry.
pub fn threads(document: &Document) -> Result<Vec<Thread>, MalformedRowError> {
    let Some(table) = document.find(|element| {
        element.is("tbody") && element.attr_matches("id", |id| id.contains("threadList"))
    }) else {
        return Ok(Vec::new());
    };

    table
        .find_all(|element| {
            element.is("tr") && element.attr_matches("id", |id| id.starts_with("msg"))
        })
        .into_iter()
        .enumerate()
        .map(|(index, row)| thread(row, index))
        .collect()
}

fn thread(row: Element<'_>, index: usize) -> Result<Thread, MalformedRowError> {
    let malformed = |defect| MalformedRowError::new(Extractor::Thread, index, defect);

    let name = row
        .find(|element| element.is("h2") && element.class_is("arielTitle"))
        .and_then(|title| title.last("span"))
        .map(|span| span.text())
        .unwrap_or_default();
    let description = row
        .find(|element| element.is("div") && element.class_is("arielMessageBody"))
        .and_then(|body| body.find(|element| element.is("span") && element.class_is("postbody")))
        .map(|span| span.text())
        .unwrap_or_default();

    let panel = row
        .find(|element| element.is("div") && element.class_starts_with("arielInfoPanel"))
        .and_then(|panel| {
            panel.find(|element| element.is("div") && element.class_is("panel-body"))
        });
    let paragraphs = panel.map(|panel| panel.all("p")).unwrap_or_default();

    let author = paragraphs
        .first()
        .and_then(|paragraph| paragraph.first("a"))
        .map(|anchor| anchor.text())
        .unwrap_or_default();
    let date = paragraphs
        .get(1)
        .ok_or_else(|| malformed(Defect::MissingNode("creation date")))?
        .text();
    let date = text::thread_date(&date).ok_or_else(|| malformed(Defect::InvalidDate(date)))?;

    let edits = match panel.and_then(|panel| panel.first("ol")) {
        Some(list) => edits(list, index)?,
        None => Vec::new(),
    };

    Ok(Thread {
        name,
        description,
        author,
        date,
        edits,
        attachments: attachments(row),
    })
}

/// Edit history of the thread at row `thread`.
fn edits(list: Element<'_>, thread: usize) -> Result<Vec<Edit>, MalformedRowError> {
    list.all("li")
        .into_iter()
        .enumerate()
        .map(|(entry, item)| {
            let raw = item.text();
            let (date, author) = text::edit_entry(&raw).ok_or_else(|| {
                MalformedRowError::new(
                    Extractor::Thread,
                    thread,
                    Defect::InvalidEdit {
                        entry,
                        text: raw.clone(),
                    },
                )
            })?;
            Ok(Edit { author, date })
        })
        .collect()
}

fn attachments(row: Element<'_>) -> Vec<Attachment> {
    let Some(attachment_box) =
        row.find(|element| element.is("div") && element.class_is("arielAttachmentBox"))
    else {
        return Vec::new();
    };

    attachment_box
        .all("tr")
        .into_iter()
        .map(|file| {
            let anchor = file.first("a");
            Attachment {
                name: anchor.map(|anchor| anchor.text()).unwrap_or_default(),
                description: file.last("span").map(|span| span.text()).unwrap_or_default(),
                link: anchor.map(|anchor| anchor.href()).unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const ROOMS: &str = r#"
        <table><tbody class="arielRoomList table">
            <tr id="room1">
                <td><a href="/v5/frm3/ThreadList.aspx?name=lezioni">Lezioni &amp; slide</a></td>
                <td><span>icon</span><span> Materiale delle lezioni </span></td>
                <td><small>12 letti, 3 non letti</small></td>
            </tr>
            <tr class="separator"><td>ignored</td></tr>
            <tr id="room2">
                <td><a href="/v5/frm3/ThreadList.aspx?name=avvisi">Avvisi</a></td>
                <td><small>7 letti</small></td>
            </tr>
            <tr id="room3"><td>no anchor</td></tr>
        </tbody></table>
    "#;

    const THREADS: &str = r#"
        <table><tbody id="ctl00_threadList">
            <tr id="msg1">
                <td>
                    <h2 class="arielTitle"><span>#</span><span>Esame di giugno</span></h2>
                    <div class="arielMessageBody"><span class="postbody">L&#39;esame si terr&agrave; in aula.</span></div>
                    <div class="arielAttachmentBox"><table>
                        <tr><td><a href=" /files/testo.pdf "> testo.pdf </a></td><td><span>Testo d&#39;esame</span></td></tr>
                        <tr><td><a href="/files/soluzioni.pdf">soluzioni.pdf</a></td></tr>
                    </table></div>
                    <div class="arielInfoPanel panel">
                        <div class="panel-body">
                            <p>di <a href="/profilo/1">Mario Rossi</a></p>
                            <p>12/03/2019 10.35 modificato</p>
                            <ol>
                                <li>13/03/2019 08.00 | Mario Rossi</li>
                                <li>14/03/2019 09.15 | Anna Bianchi</li>
                            </ol>
                        </div>
                    </div>
                </td>
            </tr>
            <tr id="msg2">
                <td>
                    <h2 class="arielTitle"><span>Orari</span></h2>
                    <div class="arielInfoPanel"><div class="panel-body">
                        <p><a href="/profilo/2">Anna Bianchi</a></p>
                        <p>01/02/2020 14.00</p>
                    </div></div>
                </td>
            </tr>
        </tbody></table>
    "#;

    #[test]
    fn rooms_with_counts() {
        let document: Document = ROOMS.parse().unwrap();
        let rooms = rooms(&document);
        assert_eq!(rooms.len(), 3);

        assert_eq!(
            rooms[0],
            Room {
                name: "Lezioni & slide".to_owned(),
                description: "Materiale delle lezioni".to_owned(),
                link: "/v5/frm3/ThreadList.aspx?name=lezioni".to_owned(),
                total_items: 12,
                unread_items: 3,
            }
        );
        assert_eq!(rooms[1].total_items, 7);
        assert_eq!(rooms[1].unread_items, 0);
        assert_eq!(rooms[1].description, "");
        assert_eq!(rooms[2].name, "");
        assert_eq!(rooms[2].link, "");
    }

    #[test]
    fn threads_with_edits_and_attachments() {
        let document: Document = THREADS.parse().unwrap();
        let threads = threads(&document).unwrap();
        assert_eq!(threads.len(), 2);

        let first = &threads[0];
        assert_eq!(first.name, "Esame di giugno");
        assert_eq!(first.description, "L'esame si terrà in aula.");
        assert_eq!(first.author, "Mario Rossi");
        assert_eq!(
            first.date,
            NaiveDate::from_ymd_opt(2019, 3, 12)
                .unwrap()
                .and_hms_opt(10, 35, 0)
                .unwrap()
        );
        assert_eq!(
            first.edits,
            [
                Edit {
                    author: "Mario Rossi".to_owned(),
                    date: "13/03/2019 08:00".to_owned(),
                },
                Edit {
                    author: "Anna Bianchi".to_owned(),
                    date: "14/03/2019 09:15".to_owned(),
                },
            ]
        );
        assert_eq!(
            first.attachments,
            [
                Attachment {
                    name: "testo.pdf".to_owned(),
                    description: "Testo d'esame".to_owned(),
                    link: "/files/testo.pdf".to_owned(),
                },
                Attachment {
                    name: "soluzioni.pdf".to_owned(),
                    description: "".to_owned(),
                    link: "/files/soluzioni.pdf".to_owned(),
                },
            ]
        );

        let second = &threads[1];
        assert_eq!(second.name, "Orari");
        assert_eq!(second.description, "");
        assert!(second.edits.is_empty());
        assert!(second.attachments.is_empty());
    }

    #[test]
    fn thread_without_date_fails_the_page() {
        let html = r#"
            <table><tbody id="threadList">
                <tr id="msg1"><td>
                    <h2 class="arielTitle"><span>Senza data</span></h2>
                    <div class="arielInfoPanel"><div class="panel-body">
                        <p><a href="/profilo/2">Anna Bianchi</a></p>
                    </div></div>
                </td></tr>
            </tbody></table>
        "#;
        let document: Document = html.parse().unwrap();
        let err = threads(&document).unwrap_err();
        assert_eq!(err.extractor, Extractor::Thread);
        assert_eq!(err.row, 0);
        assert_eq!(err.defect, Defect::MissingNode("creation date"));
        assert!(page(&document).is_err());
    }

    #[test]
    fn unreadable_date_reports_row() {
        let html = r#"
            <table><tbody id="threadList">
                <tr id="msg1"><td><div class="arielInfoPanel"><div class="panel-body">
                    <p>a</p><p>01/01/2020 10.00</p>
                </div></div></td></tr>
                <tr id="msg2"><td><div class="arielInfoPanel"><div class="panel-body">
                    <p>a</p><p>domani</p>
                </div></div></td></tr>
            </tbody></table>
        "#;
        let document: Document = html.parse().unwrap();
        let err = threads(&document).unwrap_err();
        assert_eq!(err.row, 1);
        assert_eq!(err.defect, Defect::InvalidDate("domani".to_owned()));
    }

    #[test]
    fn malformed_edit_entry_names_thread_and_entry() {
        let html = r#"
            <table><tbody id="threadList">
                <tr id="msg1"><td><div class="arielInfoPanel"><div class="panel-body">
                    <p>a</p><p>01/01/2020 10.00</p>
                    <ol><li>01/01/2020 11.00 | Mario</li></ol>
                </div></div></td></tr>
                <tr id="msg2"><td><div class="arielInfoPanel"><div class="panel-body">
                    <p>a</p><p>02/01/2020 10.00</p>
                    <ol><li>02/01/2020 11.00 | Mario</li><li>solo data</li></ol>
                </div></div></td></tr>
            </tbody></table>
        "#;
        let document: Document = html.parse().unwrap();
        let err = threads(&document).unwrap_err();
        assert_eq!(err.extractor, Extractor::Thread);
        assert_eq!(err.row, 1);
        assert_eq!(
            err.defect,
            Defect::InvalidEdit {
                entry: 1,
                text: "solo data".to_owned(),
            }
        );
        assert_eq!(
            err.to_string(),
            "malformed thread row 1: edit 1: expected `date | author`, found `solo data`"
        );
    }

    #[test]
    fn page_without_containers_is_empty() {
        let document: Document = "<html><body><p>Nessun contenuto</p></body></html>"
            .parse()
            .unwrap();
        assert_eq!(page(&document).unwrap(), Page::default());
    }
}
