//! Integration tests for document sessions.

mod common;

use common::{docx, numbered_xlsx, paragraph, xlsx, Cell};
use docpane::resource::{BlobStore, ResourceAllocator};
use docpane::{
    DocumentKind, DocumentSession, JsonFormat, SessionEvent, SessionOptions, SessionSnapshot,
    SourceFile, Status, DOCX_MIME, PDF_MIME, XLSX_MIME,
};
use std::sync::Arc;

fn xlsx_file(rows: usize) -> SourceFile {
    SourceFile::new("data.xlsx", XLSX_MIME, numbered_xlsx(rows))
}

// ==================== Tabular ====================

#[test]
fn test_85_rows_make_three_pages() {
    let mut session = DocumentSession::new();
    session.process_file(&xlsx_file(85));

    assert_eq!(session.status(), &Status::Ready);
    assert_eq!(session.kind(), Some(DocumentKind::Tabular));
    assert_eq!(session.total_pages(), 3);
    assert_eq!(session.current_page(), 1);
    assert_eq!(session.pages().len(), 3);
    assert_eq!(session.content(), session.pages()[0]);
    assert!(!session.is_loading());
    assert_eq!(session.error(), None);
}

#[test]
fn test_pages_hold_their_rows() {
    let mut session = DocumentSession::new();
    session.process_file(&xlsx_file(85));

    let pages = session.pages();
    assert!(pages[0].contains(">row 1<"));
    assert!(pages[0].contains(">row 42<"));
    assert!(!pages[0].contains(">row 43<"));
    assert!(pages[1].contains(">row 43<"));
    assert!(pages[1].contains(">row 84<"));
    assert!(pages[2].contains(">row 85<"));
    assert_eq!(pages[2].matches("<tr>").count(), 1);
}

#[test]
fn test_every_page_restarts_coordinates() {
    let mut session = DocumentSession::new();
    session.process_file(&xlsx_file(50));

    for page in session.pages() {
        assert!(page.contains("id=\"cell-A1\""));
        assert!(page.starts_with("<html>"));
    }
}

#[test]
fn test_page_count_formula() {
    for (rows, expected) in [(1, 1), (41, 1), (42, 1), (43, 2), (84, 2), (85, 3), (126, 3)] {
        let mut session = DocumentSession::new();
        session.process_file(&xlsx_file(rows));
        assert_eq!(session.total_pages(), expected, "rows = {}", rows);
    }
}

#[test]
fn test_go_to_page_republishes_content() {
    let mut session = DocumentSession::new();
    session.process_file(&xlsx_file(85));

    for target in [3, 1, 2] {
        assert!(session.go_to_page(target));
        assert_eq!(session.current_page(), target);
        assert_eq!(session.content(), session.pages()[target as usize - 1]);
    }
}

#[test]
fn test_go_to_page_out_of_range_is_noop() {
    let mut session = DocumentSession::new();
    session.process_file(&xlsx_file(85));
    let before = session.content().to_string();

    assert!(!session.go_to_page(0));
    assert_eq!(session.current_page(), 1);
    assert!(!session.go_to_page(4));
    assert!(!session.go_to_page(u32::MAX));
    assert_eq!(session.current_page(), 1);
    assert_eq!(session.content(), before);
}

#[test]
fn test_empty_sheet() {
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new(
        "empty.xlsx",
        XLSX_MIME,
        xlsx(&[("Empty", Vec::new())]),
    ));

    assert_eq!(session.status(), &Status::Ready);
    assert_eq!(session.total_pages(), 1);
    assert!(session.content().contains("<table></table>"));
}

#[test]
fn test_only_first_sheet_is_shown() {
    let bytes = xlsx(&[
        ("First", vec![vec![Cell::Text("alpha".into())]]),
        ("Second", vec![vec![Cell::Text("beta".into())]]),
    ]);
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new("two.xlsx", XLSX_MIME, bytes));

    assert!(session.content().contains(">alpha<"));
    assert!(!session.content().contains("beta"));
}

#[test]
fn test_workbook_without_sheets() {
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new("none.xlsx", XLSX_MIME, xlsx(&[])));

    assert_eq!(
        session.error(),
        Some("Error processing XLSX file: Workbook contains no sheets".to_string())
    );
}

#[test]
fn test_custom_rows_per_page() {
    let mut session =
        DocumentSession::with_options(SessionOptions::new().with_rows_per_page(10).sequential());
    session.process_file(&xlsx_file(25));

    assert_eq!(session.total_pages(), 3);
    assert_eq!(session.page(3).unwrap().matches("<tr>").count(), 5);
}

// ==================== PDF ====================

#[test]
fn test_pdf_gets_handle() {
    let store = Arc::new(BlobStore::new());
    let mut session = DocumentSession::new().with_allocator(store.clone());
    session.process_file(&SourceFile::new("paper.pdf", PDF_MIME, b"%PDF-1.7\n".to_vec()));

    let url = session.pdf_url().unwrap().to_string();
    assert!(!url.is_empty());
    assert_eq!(session.total_pages(), 1);
    assert_eq!(session.content(), "");

    let blob = store.resolve(&url).unwrap();
    assert_eq!(&blob.data[..], b"%PDF-1.7\n");
    assert_eq!(blob.mime_type, PDF_MIME);
}

#[test]
fn test_pdf_handle_resolves_through_session() {
    let session = docpane::open_bytes("paper.pdf", PDF_MIME, b"%PDF-1.7\n".to_vec());
    let url = session.pdf_url().unwrap();

    let blob = session.allocator().resolve(url).unwrap();
    assert_eq!(&blob.data[..], b"%PDF-1.7\n");
    assert_eq!(blob.mime_type, PDF_MIME);
    assert_eq!(session.pdf_blob().unwrap().data, blob.data);
}

#[test]
fn test_pdf_handle_revoked_when_replaced() {
    let store = Arc::new(BlobStore::new());
    let mut session = DocumentSession::new().with_allocator(store.clone());

    session.process_file(&SourceFile::new("a.pdf", PDF_MIME, b"%PDF-a".to_vec()));
    let first = session.pdf_url().unwrap().to_string();

    session.process_file(&SourceFile::new("b.pdf", PDF_MIME, b"%PDF-b".to_vec()));
    let second = session.pdf_url().unwrap().to_string();

    assert_ne!(first, second);
    assert!(store.resolve(&first).is_none());
    assert!(store.resolve(&second).is_some());
    assert_eq!(store.len(), 1);

    session.process_file(&xlsx_file(3));
    assert!(store.is_empty());
    assert_eq!(session.pdf_url(), None);
}

#[test]
fn test_pdf_handle_revoked_on_drop() {
    let store = Arc::new(BlobStore::new());
    {
        let mut session = DocumentSession::new().with_allocator(store.clone());
        session.process_file(&SourceFile::new("a.pdf", PDF_MIME, b"%PDF-a".to_vec()));
        assert_eq!(store.len(), 1);
    }
    assert!(store.is_empty());
}

// ==================== DOCX ====================

#[test]
fn test_docx_single_page() {
    let body = [
        paragraph(Some("Heading1"), "Report"),
        paragraph(None, "Intro text"),
    ]
    .concat();
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new("report.docx", DOCX_MIME, docx(&body)));

    assert_eq!(session.status(), &Status::Ready);
    assert_eq!(session.content(), "<h1>Report</h1><p>Intro text</p>");
    assert_eq!(session.total_pages(), 1);
    assert!(session.pages().is_empty());
    assert!(!session.go_to_page(2));
}

#[test]
fn test_docx_decode_failure() {
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new("bad.docx", DOCX_MIME, b"garbage".to_vec()));

    let message = session.error().unwrap();
    assert!(message.starts_with("Error processing DOCX file: "), "{}", message);
    assert_eq!(session.file_name(), "bad.docx");
    assert_eq!(session.content(), "");
    assert!(!session.is_loading());
}

// ==================== Unsupported and reset ====================

#[test]
fn test_text_plain_is_unsupported() {
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new("a.txt", "text/plain", b"hello".to_vec()));

    assert_eq!(session.error(), Some("Unsupported file type".to_string()));
    assert_eq!(session.content(), "");
    assert_eq!(session.file_type(), "text/plain");
    assert!(!session.is_loading());
}

#[test]
fn test_mime_match_is_exact() {
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new("a.pdf", "Application/PDF", b"%PDF".to_vec()));
    assert_eq!(session.error(), Some("Unsupported file type".to_string()));
}

#[test]
fn test_new_file_clears_previous_error() {
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new("a.txt", "text/plain", Vec::<u8>::new()));
    assert!(session.error().is_some());

    session.process_file(&xlsx_file(5));
    assert_eq!(session.error(), None);
    assert_eq!(session.file_name(), "data.xlsx");
}

#[test]
fn test_reset_restores_defaults() {
    let mut session = DocumentSession::new();
    session.process_file(&xlsx_file(100));
    session.go_to_page(3);
    session.reset();

    assert_eq!(session.snapshot(), SessionSnapshot::default());
    assert_eq!(session.content(), "");
    assert_eq!(session.status(), &Status::Idle);
    assert_eq!(session.current_page(), 1);
    assert_eq!(session.total_pages(), 1);
    assert!(session.pages().is_empty());
}

// ==================== Observation ====================

#[test]
fn test_event_sequence() {
    let mut session = DocumentSession::new();
    let events = session.subscribe();

    session.process_file(&xlsx_file(43));
    session.next_page();
    session.reset();

    let received: Vec<SessionEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![
            SessionEvent::Reset,
            SessionEvent::Loading {
                file_name: "data.xlsx".into()
            },
            SessionEvent::Ready {
                kind: DocumentKind::Tabular,
                total_pages: 2
            },
            SessionEvent::PageChanged { page: 2 },
            SessionEvent::Reset,
        ]
    );
}

#[test]
fn test_snapshot_json() {
    let mut session = DocumentSession::new();
    session.process_file(&SourceFile::new("a.txt", "text/plain", Vec::<u8>::new()));

    let json = session.snapshot().to_json(JsonFormat::Compact).unwrap();
    assert!(json.contains(r#""error":"Unsupported file type""#));
    assert!(json.contains(r#""loading":false"#));
    assert!(json.contains(r#""kind":"unsupported""#));
}
