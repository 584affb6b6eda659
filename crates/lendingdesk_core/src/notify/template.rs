//! Overdue notice rendering.

use crate::model::notification::{
    EmailTemplate, NotificationPayload, BOOK_DETAILS_PLACEHOLDER, READER_NAME_PLACEHOLDER,
};
use crate::model::overdue::{OverdueBookDetail, OverdueReader};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "{}|{}",
        regex::escape(READER_NAME_PLACEHOLDER),
        regex::escape(BOOK_DETAILS_PLACEHOLDER)
    ))
    .expect("valid placeholder regex")
});

/// Subject and body ready to send or preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub subject: String,
    pub message: String,
}

/// Formats one overdue line: `<title> (Due: <M/D/YYYY>, <n> days overdue)`.
pub fn format_book_line(book: &OverdueBookDetail) -> String {
    format!(
        "{} (Due: {}, {} days overdue)",
        book.book_title,
        book.due_date.format("%-m/%-d/%Y"),
        book.days_overdue
    )
}

/// Joins every overdue line of `reader`, one per line.
pub fn format_book_details(reader: &OverdueReader) -> String {
    reader
        .overdue_books
        .iter()
        .map(format_book_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitutes both placeholders in `template.message`, every occurrence.
///
/// Single pass: substituted text is never rescanned for placeholders.
pub fn render(reader: &OverdueReader, template: &EmailTemplate) -> RenderedNotification {
    let book_details = format_book_details(reader);
    let message = PLACEHOLDER_RE
        .replace_all(&template.message, |caps: &Captures<'_>| {
            if &caps[0] == READER_NAME_PLACEHOLDER {
                reader.reader_name.clone()
            } else {
                book_details.clone()
            }
        })
        .into_owned();

    RenderedNotification {
        subject: template.subject.clone(),
        message,
    }
}

/// Builds the channel payload for `reader`.
pub fn build_payload(reader: &OverdueReader, template: &EmailTemplate) -> NotificationPayload {
    let rendered = render(reader, template);
    NotificationPayload {
        to: reader.reader_email.trim().to_string(),
        reader_name: reader.reader_name.clone(),
        subject: rendered.subject,
        message: rendered.message,
        overdue_books: reader.overdue_books.clone(),
    }
}
