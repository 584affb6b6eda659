use chrono::{TimeZone, Utc};
use lendingdesk_core::{
    ApiClient, ApiError, ArchiveQuery, BookRepository, ChannelError, EmailTemplate,
    HttpBookRepository, HttpLendingRepository, HttpNotificationArchive, HttpNotificationChannel,
    HttpReaderRepository, LendingRepository, NotificationArchive, NotificationChannel,
    NotificationDispatcher, NotificationStatus, OverdueBookDetail, OverdueReader,
    ReaderRepository, RosterService, StatusFilter,
};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

#[derive(Debug, Clone)]
struct SeenRequest {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

/// Single-threaded HTTP stub answering scripted responses in order.
struct StubServer {
    base_url: String,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    fn start(responses: Vec<(u16, &str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let responses: Vec<(u16, String)> = responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();

        let seen_by_server = Arc::clone(&seen);
        let handle = std::thread::spawn(move || {
            for (status, body) in responses {
                let (stream, _) = match listener.accept() {
                    Ok(connection) => connection,
                    Err(_) => return,
                };
                let request = handle_connection(stream, status, &body);
                seen_by_server
                    .lock()
                    .expect("stub request log")
                    .push(request);
            }
        });

        Self {
            base_url: format!("http://{addr}/api"),
            seen,
            handle: Some(handle),
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(5)).expect("client should build")
    }

    fn finish(mut self) -> Vec<SeenRequest> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("stub thread should exit");
        }
        let seen = self.seen.lock().expect("stub request log");
        seen.clone()
    }
}

fn handle_connection(stream: TcpStream, status: u16, body: &str) -> SeenRequest {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stub stream"));

    let mut request_line = String::new();
    let _ = reader.read_line(&mut request_line);
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0_u64;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if name == "content-length" {
                content_length = value.parse().unwrap_or(0);
            } else if name == "authorization" {
                authorization = Some(value);
            }
        }
    }

    // Body is framed by Content-Length only; a short body is kept as read.
    let mut request_body = Vec::new();
    let _ = (&mut reader)
        .take(content_length)
        .read_to_end(&mut request_body);

    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = stream;
    stream
        .write_all(response.as_bytes())
        .expect("write stub response");
    stream.flush().expect("flush stub response");

    SeenRequest {
        method,
        path,
        authorization,
        body: String::from_utf8_lossy(&request_body).into_owned(),
    }
}

fn overdue_reader() -> OverdueReader {
    let mut reader = OverdueReader::new("r-1", "Ada", "ada@example.org");
    reader.push_book(OverdueBookDetail {
        book_id: "b-1".to_string(),
        book_title: "Dune".to_string(),
        due_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        lend_date: Utc.with_ymd_and_hms(2023, 12, 18, 0, 0, 0).unwrap(),
        days_overdue: 4,
    });
    reader
}

#[test]
fn forbidden_response_refreshes_token_and_replays_once() {
    let server = StubServer::start(vec![
        (403, r#"{"message":"token expired"}"#),
        (200, r#"{"accessToken":"fresh-token"}"#),
        (200, r#"[{"_id":"r-1","name":"Ada","email":"ada@example.org"}]"#),
    ]);
    let client = server.client();
    client.set_access_token("stale-token");

    let readers = HttpReaderRepository::new(&client)
        .list_readers()
        .expect("replayed request should succeed");
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].id, "r-1");
    assert_eq!(client.access_token().as_deref(), Some("fresh-token"));

    let seen = server.finish();
    let paths: Vec<(&str, &str)> = seen
        .iter()
        .map(|request| (request.method.as_str(), request.path.as_str()))
        .collect();
    assert_eq!(
        paths,
        vec![
            ("GET", "/api/readers"),
            ("POST", "/api/auth/refresh-token"),
            ("GET", "/api/readers"),
        ]
    );
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer stale-token"));
    assert_eq!(seen[2].authorization.as_deref(), Some("Bearer fresh-token"));
}

#[test]
fn rejected_refresh_reports_expired_session() {
    let server = StubServer::start(vec![
        (403, r#"{"message":"token expired"}"#),
        (401, r#"{"message":"refresh token invalid"}"#),
    ]);
    let client = server.client();

    let err = HttpBookRepository::new(&client)
        .list_books()
        .expect_err("expired session should fail");
    assert!(matches!(err, ApiError::SessionExpired));

    let seen = server.finish();
    assert_eq!(seen.len(), 2);
}

#[test]
fn failed_refresh_surfaces_the_original_forbidden_error() {
    let server = StubServer::start(vec![
        (403, r#"{"message":"not allowed"}"#),
        (500, r#"{"message":"refresh store down"}"#),
    ]);
    let client = server.client();

    let err = HttpLendingRepository::new(&client)
        .list_lendings()
        .expect_err("forbidden should surface");
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "not allowed");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let seen = server.finish();
    assert_eq!(seen.len(), 2);
}

#[test]
fn error_status_carries_backend_message() {
    let server = StubServer::start(vec![(404, r#"{"message":"Reader not found"}"#)]);
    let client = server.client();

    let err = HttpReaderRepository::new(&client)
        .delete_reader("r-404")
        .expect_err("missing reader should fail");
    assert_eq!(err.user_message(), "Reader not found");

    let seen = server.finish();
    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(seen[0].path, "/api/readers/r-404");
}

#[test]
fn delete_book_targets_book_collection() {
    let server = StubServer::start(vec![(200, "")]);
    let client = server.client();

    HttpBookRepository::new(&client)
        .delete_book("b-7")
        .expect("delete should succeed on empty body");

    let seen = server.finish();
    assert_eq!(seen[0].path, "/api/books/b-7");
}

#[test]
fn roster_service_fetches_all_collections_and_builds_roster() {
    let server = StubServer::start(vec![
        (
            200,
            r#"[{"id":"t-1","bookId":"b-1","readerId":"r-1","lendDate":"2023-12-18T00:00:00.000Z","dueDate":"2024-01-01T00:00:00.000Z","returnDate":null},
                {"id":"t-2","bookId":"b-1","readerId":"r-1","lendDate":"2023-12-01","dueDate":"2023-12-15","returnDate":"2023-12-14"}]"#,
        ),
        (200, r#"[{"_id":"r-1","name":"Ada","email":"ada@example.org"}]"#),
        (200, r#"[{"id":"b-1","title":"Dune","author":"Herbert","isbn":"9780441013593","status":true}]"#),
    ]);
    let client = server.client();
    let service = RosterService::new(
        HttpReaderRepository::new(&client),
        HttpBookRepository::new(&client),
        HttpLendingRepository::new(&client),
    );

    let now = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
    let roster = service.overdue_roster(now).expect("roster should load");

    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].reader_name, "Ada");
    assert_eq!(roster[0].overdue_books[0].book_title, "Dune");
    assert_eq!(roster[0].overdue_books[0].days_overdue, 4);

    let seen = server.finish();
    let paths: Vec<&str> = seen.iter().map(|request| request.path.as_str()).collect();
    assert_eq!(paths, vec!["/api/lendings", "/api/readers", "/api/books"]);
}

#[test]
fn roster_service_fails_fast_when_a_collection_fails() {
    let server = StubServer::start(vec![
        (200, "[]"),
        (500, r#"{"message":"database offline"}"#),
    ]);
    let client = server.client();
    let service = RosterService::new(
        HttpReaderRepository::new(&client),
        HttpBookRepository::new(&client),
        HttpLendingRepository::new(&client),
    );

    let err = service
        .overdue_roster(Utc::now())
        .expect_err("reader fetch failure should abort");
    assert_eq!(err.user_message(), "database offline");

    let seen = server.finish();
    assert_eq!(seen.len(), 2);
}

#[test]
fn channel_posts_payload_to_send_overdue() {
    let server = StubServer::start(vec![(200, r#"{"success":true,"messageId":"m-1"}"#)]);
    let client = server.client();
    let channel = HttpNotificationChannel::new(&client);
    let mut dispatcher = NotificationDispatcher::new(&channel);

    let record = dispatcher.send_one(&overdue_reader(), &EmailTemplate::default());
    assert!(record.is_success());

    let seen = server.finish();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/api/notifications/send-overdue");
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).expect("json body");
    assert_eq!(body["to"], "ada@example.org");
    assert_eq!(body["readerName"], "Ada");
    assert_eq!(body["subject"], "Overdue Books Reminder - Library System");
    assert_eq!(body["overdueBooks"][0]["bookId"], "b-1");
}

#[test]
fn channel_reports_backend_refusal() {
    let server = StubServer::start(vec![(
        200,
        r#"{"success":false,"message":"Email service not configured"}"#,
    )]);
    let client = server.client();
    let channel = HttpNotificationChannel::new(&client);

    let err = channel
        .send_test("desk@example.org", "Front Desk")
        .expect_err("refusal should fail");
    assert!(matches!(err, ChannelError::Rejected(_)));
    assert_eq!(err.user_message(), "Email service not configured");

    let seen = server.finish();
    assert_eq!(seen[0].path, "/api/notifications/test");
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).expect("json body");
    assert_eq!(body["to"], "desk@example.org");
    assert_eq!(body["name"], "Front Desk");
}

#[test]
fn bulk_channel_wraps_payloads_and_reads_results() {
    let server = StubServer::start(vec![(
        200,
        r#"{"results":[{"success":true},{"success":false,"error":"mailbox full"}]}"#,
    )]);
    let client = server.client();
    let channel = HttpNotificationChannel::new(&client);
    let mut dispatcher = NotificationDispatcher::new(&channel);

    let mut second = overdue_reader();
    second.reader_id = "r-2".to_string();
    second.reader_email = "bob@example.org".to_string();
    let records = dispatcher.send_many(&[overdue_reader(), second], &EmailTemplate::default());

    assert!(records[0].is_success());
    assert_eq!(records[1].error_message.as_deref(), Some("mailbox full"));

    let seen = server.finish();
    assert_eq!(seen[0].path, "/api/notifications/send-bulk-overdue");
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).expect("json body");
    assert_eq!(body["notifications"].as_array().map(Vec::len), Some(2));
}

#[test]
fn archive_stats_unwrap_the_data_envelope() {
    let server = StubServer::start(vec![(
        200,
        r#"{"success":true,"data":{"totalSent":12,"totalFailed":3,"sentToday":2,
            "recentNotifications":[{"_id":"n-1","readerEmail":"ada@example.org","readerName":"Ada",
            "subject":"Overdue Books Reminder","status":"sent","sentAt":"2024-01-05T09:30:00.000Z"}]}}"#,
    )]);
    let client = server.client();

    let stats = HttpNotificationArchive::new(&client)
        .stats()
        .expect("stats should load");
    assert_eq!(stats.total_sent, 12);
    assert_eq!(stats.total_failed, 3);
    assert_eq!(stats.sent_today, 2);
    assert_eq!(stats.recent_notifications[0].id, "n-1");
    assert_eq!(
        stats.recent_notifications[0].status,
        NotificationStatus::Success
    );

    let seen = server.finish();
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].path, "/api/notifications/stats");
}

#[test]
fn archive_stats_without_data_read_as_zero() {
    let server = StubServer::start(vec![(200, r#"{"success":true}"#)]);
    let client = server.client();

    let stats = HttpNotificationArchive::new(&client)
        .stats()
        .expect("stats should load");
    assert_eq!(stats.total_sent, 0);
    assert!(stats.recent_notifications.is_empty());

    server.finish();
}

#[test]
fn archive_history_sends_paging_query_and_maps_status() {
    let server = StubServer::start(vec![(
        200,
        r#"{"data":{"notifications":[
            {"id":"n-7","readerEmail":"ada@example.org","readerName":"Ada","subject":"Overdue",
             "bookTitles":["Dune","Emma"],"status":"sent","sentAt":"2024-01-05T09:30:00.000Z"},
            {"id":"n-6","readerEmail":"bob@example.org","readerName":"Bob","subject":"Overdue",
             "status":"failed","errorMessage":"mailbox full"}],
            "total":7,"page":2,"totalPages":4}}"#,
    )]);
    let client = server.client();

    let page = HttpNotificationArchive::new(&client)
        .history(ArchiveQuery::new(2, 2))
        .expect("history should load");
    assert_eq!(page.page, 2);
    assert_eq!(page.total, 7);
    assert_eq!(page.total_pages, 4);
    assert_eq!(page.notifications[0].status, NotificationStatus::Success);
    assert_eq!(page.notifications[0].book_titles, vec!["Dune", "Emma"]);
    assert_eq!(page.notifications[1].status, NotificationStatus::Failed);
    assert!(page.notifications[1].book_titles.is_empty());
    assert_eq!(
        page.notifications[1].error_message.as_deref(),
        Some("mailbox full")
    );

    let seen = server.finish();
    assert_eq!(seen[0].path, "/api/notifications/history?page=2&limit=2");
}

#[test]
fn archive_delete_targets_the_entry() {
    let server = StubServer::start(vec![(200, r#"{"success":true}"#)]);
    let client = server.client();

    HttpNotificationArchive::new(&client)
        .delete(" n-3 ")
        .expect("delete should succeed");

    let seen = server.finish();
    assert_eq!(seen[0].method, "DELETE");
    assert_eq!(seen[0].path, "/api/notifications/n-3");
}

#[test]
fn archive_blank_id_is_rejected_without_a_request() {
    let server = StubServer::start(vec![]);
    let client = server.client();
    let archive = HttpNotificationArchive::new(&client);

    assert!(matches!(archive.delete("  "), Err(ApiError::InvalidUrl(_))));
    assert!(archive.retry("").is_err());

    assert!(server.finish().is_empty());
}

#[test]
fn archive_retry_returns_new_message_id() {
    let server = StubServer::start(vec![(200, r#"{"success":true,"messageId":"m-9"}"#)]);
    let client = server.client();

    let receipt = HttpNotificationArchive::new(&client)
        .retry("n-4")
        .expect("retry should succeed");
    assert_eq!(receipt.message_id.as_deref(), Some("m-9"));

    let seen = server.finish();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/api/notifications/retry/n-4");
}

#[test]
fn archive_retry_refusal_falls_back_to_generic_reason() {
    let server = StubServer::start(vec![
        (200, r#"{"success":false}"#),
        (404, r#"{"message":"Notification not found"}"#),
    ]);
    let client = server.client();
    let archive = HttpNotificationArchive::new(&client);

    let refused = archive.retry("n-5").expect_err("refusal should fail");
    assert!(matches!(refused, ChannelError::Rejected(_)));
    assert_eq!(
        refused.user_message(),
        "Unknown error occurred while retrying notification"
    );

    let missing = archive.retry("n-404").expect_err("missing entry should fail");
    assert_eq!(missing.user_message(), "Notification not found");

    server.finish();
}

#[test]
fn lending_search_runs_over_fetched_collection() {
    let server = StubServer::start(vec![(
        200,
        r#"[{"id":"t-1","bookId":"b-1","readerId":"r-1","lendDate":"2023-12-18","dueDate":"2024-01-01"},
            {"id":"t-2","bookId":"b-2","readerId":"r-2","lendDate":"2023-12-18","dueDate":"2024-01-01"}]"#,
    )]);
    let client = server.client();
    let service = RosterService::new(
        HttpReaderRepository::new(&client),
        HttpBookRepository::new(&client),
        HttpLendingRepository::new(&client),
    );

    let hits = service
        .search_lendings(StatusFilter::All, "R-2", Utc::now())
        .expect("lendings should load");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "t-2");

    let seen = server.finish();
    assert_eq!(seen[0].path, "/api/lendings");
}
