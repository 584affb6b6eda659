use chrono::{DateTime, Duration, TimeZone, Utc};
use lendingdesk_core::{
    build_overdue_roster, filter_by_status, filter_roster, Book, LendingStatus,
    LendingTransaction, Reader, RosterSelection, SelectionError, StatusFilter,
};

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn lending(
    id: &str,
    reader_id: &str,
    book_id: &str,
    due_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
) -> LendingTransaction {
    LendingTransaction {
        id: id.to_string(),
        book_id: book_id.to_string(),
        reader_id: reader_id.to_string(),
        lend_date: due_date - Duration::days(14),
        due_date,
        return_date,
    }
}

fn readers() -> Vec<Reader> {
    vec![
        Reader::new("R1", "Ada Lovelace", "ada@example.org"),
        Reader::new("R2", "Charles Babbage", "charles@example.org"),
        Reader::new("R3", "Grace Hopper", "grace@example.org"),
    ]
}

fn books() -> Vec<Book> {
    vec![
        Book::new("B1", "Dune"),
        Book::new("B2", "Emma"),
        Book::new("B3", "Ulysses"),
    ]
}

#[test]
fn single_overdue_loan_scenario() {
    let transactions = vec![lending("T1", "R1", "B1", day(2024, 1, 1), None)];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 5));

    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].reader_id, "R1");
    assert_eq!(roster[0].reader_name, "Ada Lovelace");
    assert_eq!(roster[0].reader_email, "ada@example.org");
    assert_eq!(roster[0].total_overdue_books, 1);
    assert_eq!(roster[0].overdue_books[0].book_id, "B1");
    assert_eq!(roster[0].overdue_books[0].book_title, "Dune");
    assert_eq!(roster[0].overdue_books[0].days_overdue, 4);
    assert_eq!(roster[0].overdue_books[0].due_date, day(2024, 1, 1));
}

#[test]
fn returned_loan_scenario_yields_empty_roster() {
    let transactions = vec![lending(
        "T1",
        "R1",
        "B1",
        day(2024, 1, 1),
        Some(day(2024, 1, 2)),
    )];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 5));
    assert!(roster.is_empty());
}

#[test]
fn returned_loans_never_appear_even_when_long_past_due() {
    let transactions = vec![
        lending("T1", "R1", "B1", day(2020, 1, 1), Some(day(2024, 6, 1))),
        lending("T2", "R2", "B2", day(2019, 3, 1), Some(day(2019, 2, 1))),
    ];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 7, 1));
    assert!(roster.is_empty());
}

#[test]
fn due_exactly_now_is_not_overdue() {
    let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
    let transactions = vec![
        lending("T1", "R1", "B1", now, None),
        lending("T2", "R2", "B2", now - Duration::milliseconds(1), None),
        lending("T3", "R3", "B3", now + Duration::days(1), None),
    ];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), now);

    let ids: Vec<&str> = roster.iter().map(|entry| entry.reader_id.as_str()).collect();
    assert_eq!(ids, vec!["R2"]);
}

#[test]
fn loan_less_than_a_day_late_is_listed_with_zero_days() {
    let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap();
    let transactions = vec![
        lending("T1", "R1", "B1", now - Duration::hours(1), None),
        lending("T2", "R2", "B2", now - Duration::days(2), None),
    ];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), now);

    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].reader_id, "R1");
    assert_eq!(roster[0].overdue_books[0].days_overdue, 0);
    assert_eq!(roster[1].overdue_books[0].days_overdue, 2);
}

#[test]
fn days_overdue_floors_partial_days() {
    let due = day(2024, 2, 10);
    let now = due + Duration::days(3) + Duration::hours(4);
    let transactions = vec![lending("T1", "R1", "B1", due, None)];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), now);
    assert_eq!(roster[0].overdue_books[0].days_overdue, 3);
}

#[test]
fn loans_of_one_reader_are_grouped_under_one_entry() {
    let transactions = vec![
        lending("T1", "R1", "B1", day(2024, 1, 1), None),
        lending("T2", "R1", "B2", day(2024, 1, 3), None),
    ];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 10));

    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].total_overdue_books, 2);
    let titles: Vec<&str> = roster[0]
        .overdue_books
        .iter()
        .map(|book| book.book_title.as_str())
        .collect();
    assert_eq!(titles, vec!["Dune", "Emma"]);
}

#[test]
fn roster_keeps_first_discovery_order_of_readers() {
    let transactions = vec![
        lending("T1", "R3", "B1", day(2024, 1, 1), None),
        lending("T2", "R1", "B2", day(2024, 1, 1), None),
        lending("T3", "R3", "B3", day(2024, 1, 2), None),
        lending("T4", "R2", "B1", day(2024, 1, 2), None),
    ];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 10));

    let ids: Vec<&str> = roster.iter().map(|entry| entry.reader_id.as_str()).collect();
    assert_eq!(ids, vec!["R3", "R1", "R2"]);
    assert_eq!(roster[0].total_overdue_books, 2);
}

#[test]
fn unresolvable_reader_or_book_is_excluded_without_error() {
    let transactions = vec![
        lending("T1", "ghost", "B1", day(2024, 1, 1), None),
        lending("T2", "R1", "missing-book", day(2024, 1, 1), None),
        lending("T3", "R2", "B2", day(2024, 1, 1), None),
    ];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 5));

    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].reader_id, "R2");
}

#[test]
fn book_can_be_resolved_by_title_when_id_holds_a_title() {
    let transactions = vec![lending("T1", "R1", "Emma", day(2024, 1, 1), None)];

    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 5));

    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].overdue_books[0].book_title, "Emma");
    // The detail keeps the key the transaction carried.
    assert_eq!(roster[0].overdue_books[0].book_id, "Emma");
}

#[test]
fn roster_is_a_pure_function_of_its_inputs() {
    let transactions = vec![
        lending("T1", "R1", "B1", day(2024, 1, 1), None),
        lending("T2", "R2", "B2", day(2024, 1, 2), None),
        lending("T3", "R1", "B3", day(2024, 1, 3), Some(day(2024, 1, 4))),
    ];
    let readers = readers();
    let books = books();
    let now = day(2024, 1, 8);

    let first = build_overdue_roster(&transactions, &readers, &books, now);
    let second = build_overdue_roster(&transactions, &readers, &books, now);
    assert_eq!(first, second);
}

#[test]
fn status_filter_agrees_with_roster_membership() {
    let now = day(2024, 1, 10);
    let transactions = vec![
        lending("T1", "R1", "B1", day(2024, 1, 1), None),
        lending("T2", "R2", "B2", day(2024, 1, 20), None),
        lending("T3", "R3", "B3", day(2024, 1, 1), Some(day(2024, 1, 2))),
    ];

    let overdue = filter_by_status(
        &transactions,
        StatusFilter::Only(LendingStatus::Overdue),
        now,
    );
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, "T1");

    assert_eq!(transactions[1].status_at(now), LendingStatus::Active);
    assert_eq!(transactions[2].status_at(now), LendingStatus::Returned);
    assert_eq!(
        filter_by_status(&transactions, StatusFilter::All, now).len(),
        3
    );

    let roster = build_overdue_roster(&transactions, &readers(), &books(), now);
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].reader_id, "R1");
}

#[test]
fn status_filter_parses_names() {
    assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
    assert_eq!(
        " overdue ".parse::<StatusFilter>().unwrap(),
        StatusFilter::Only(LendingStatus::Overdue)
    );
    assert!("late".parse::<StatusFilter>().is_err());
}

#[test]
fn search_matches_name_email_and_titles_case_insensitively() {
    let transactions = vec![
        lending("T1", "R1", "B1", day(2024, 1, 1), None),
        lending("T2", "R2", "B2", day(2024, 1, 1), None),
    ];
    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 5));

    assert_eq!(filter_roster(&roster, "").len(), 2);
    assert_eq!(filter_roster(&roster, "ADA")[0].reader_id, "R1");
    assert_eq!(filter_roster(&roster, "charles@")[0].reader_id, "R2");
    assert_eq!(filter_roster(&roster, "emma")[0].reader_id, "R2");
    assert!(filter_roster(&roster, "hopper").is_empty());
}

#[test]
fn selection_rejects_empty_and_unknown_readers() {
    let transactions = vec![
        lending("T1", "R1", "B1", day(2024, 1, 1), None),
        lending("T2", "R2", "B2", day(2024, 1, 1), None),
    ];
    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 5));

    let empty = RosterSelection::new();
    assert_eq!(empty.resolve(&roster).unwrap_err(), SelectionError::Empty);

    let unknown: RosterSelection = vec!["R9".to_string()].into_iter().collect();
    assert_eq!(
        unknown.resolve(&roster).unwrap_err(),
        SelectionError::UnknownReader("R9".to_string())
    );
}

#[test]
fn selection_resolves_in_roster_order() {
    let transactions = vec![
        lending("T1", "R2", "B1", day(2024, 1, 1), None),
        lending("T2", "R1", "B2", day(2024, 1, 1), None),
        lending("T3", "R3", "B3", day(2024, 1, 1), None),
    ];
    let roster = build_overdue_roster(&transactions, &readers(), &books(), day(2024, 1, 5));

    let mut selection = RosterSelection::new();
    assert!(selection.toggle("R3"));
    assert!(selection.toggle("R2"));
    assert!(selection.toggle("R1"));
    assert!(!selection.toggle("R1"));

    let picked = selection.resolve(&roster).expect("selection should resolve");
    let ids: Vec<&str> = picked.iter().map(|entry| entry.reader_id.as_str()).collect();
    assert_eq!(ids, vec!["R2", "R3"]);

    assert_eq!(RosterSelection::all(&roster).len(), 3);
}
