//! Roster search.

use crate::model::overdue::OverdueReader;

/// Returns roster entries matching `term`.
///
/// Matching is a case-insensitive substring test on reader name, reader
/// email and every overdue book title. A blank term matches everything.
pub fn filter_roster<'a>(roster: &'a [OverdueReader], term: &str) -> Vec<&'a OverdueReader> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return roster.iter().collect();
    }

    roster
        .iter()
        .filter(|reader| {
            reader.reader_name.to_lowercase().contains(&needle)
                || reader.reader_email.to_lowercase().contains(&needle)
                || reader
                    .overdue_books
                    .iter()
                    .any(|book| book.book_title.to_lowercase().contains(&needle))
        })
        .collect()
}
