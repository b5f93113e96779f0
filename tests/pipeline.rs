//! Integration tests for the grading pipeline.
//!
//! Everything here runs on text dumps (`.txt`, pages separated by form
//! feeds) or on in-memory page strings, so no pdfium library is needed.
//!
//! Run with:
//!   cargo test --test pipeline

use pdf2gpa::{
    compute, compute_from_bytes, compute_from_pages, compute_sync, compute_to_file, inspect,
    CreditRuleKind, CreditSource, ExtractionFailure, GpaConfig, GpaOutput, GpaProgressCallback,
    GradingScheme, Marks, MarksPolicy, PassFail, Pdf2GpaError,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Fixtures ─────────────────────────────────────────────────────────────────

const SEM3_SHEET: &str = "\
VISVESVARAYA TECHNOLOGICAL UNIVERSITY
Provisional Results
University Seat Number : 1AA21EC045
Student Name : A STUDENT
Sem  Code     Subject                       IA   SEE  Total  Result
3    BEC302   Digital System Design         20   18   38     F
3    BEC303   Electronic Devices            30   22   52     P
";

const SEM4_SHEET: &str = "\
University Seat Number : 1AA21EC045
Sem  Code     Subject                       IA   SEE  Total  Result
4    BEC402   Principles of Communication   45   46   91     P
4    BECL405  Communication Laboratory      40   45   85     P
";

const SUPPLEMENTARY_SHEET: &str = "\
Supplementary Examination
University Seat Number : 1AA21EC045
3    BEC302   Digital System Design         36   36   72     P
";

fn write_dump(dir: &TempDir, name: &str, pages: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut body = pages.join("\u{0C}");
    body.push('\u{0C}');
    std::fs::write(&path, body).unwrap();
    path
}

fn path_str(p: &Path) -> String {
    p.to_str().unwrap().to_string()
}

fn quiet_config() -> GpaConfig {
    GpaConfig::builder().concurrency(2).build().unwrap()
}

// ── Core scenarios on page strings ───────────────────────────────────────────

#[test]
fn best_attempt_wins_across_documents() {
    let transcript = compute_from_pages(
        [
            "1AA21EC045\nBEC302 Digital System Design 38 F",
            "1AA21EC045\nBEC302 Digital System Design 62 P",
        ],
        &GpaConfig::default(),
    )
    .unwrap();

    let bec302 = transcript.subject("BEC302").unwrap();
    assert_eq!(bec302.marks.raw(), Some(62));
    assert_eq!(bec302.pass_fail, PassFail::Pass);
    assert_eq!(bec302.letter_grade, "B+");
    assert_eq!(bec302.grade_point, 7);
    assert_eq!(bec302.credits, 4);
    assert_eq!(bec302.earned_points(), 28);

    let sem3 = transcript.semester(3).unwrap();
    assert_eq!(sem3.earned_grade_points, 28);
    assert_eq!(sem3.subjects.len(), 1);
}

#[test]
fn second_student_aborts_the_batch() {
    let err = compute_from_pages(
        [
            "USN 1AA21EC045\nBEC302 62 P",
            "USN 1AA21EC099\nBEC303 71 P",
        ],
        &GpaConfig::default(),
    )
    .unwrap_err();

    match err {
        Pdf2GpaError::Extraction(ExtractionFailure::IdentityConflict { locked, found, page }) => {
            assert_eq!(locked, "1AA21EC045");
            assert_eq!(found, "1AA21EC099");
            assert_eq!(page, 2);
        }
        other => panic!("expected identity conflict, got {other:?}"),
    }
}

#[test]
fn noise_only_batch_is_no_data() {
    let err = compute_from_pages(
        ["Provisional Results\nPage 1 of 1", "BEC302 Digital System Design"],
        &GpaConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Pdf2GpaError::Extraction(ExtractionFailure::NoData)));
}

#[test]
fn semester_sgpa_is_credit_weighted() {
    // BEC302: 4 credits, A (8). BEC303: 3 credits, C (5).
    let transcript = compute_from_pages(
        ["BEC302 Digital System Design 72 P\nBEC303 Electronic Devices 52 P"],
        &GpaConfig::default(),
    )
    .unwrap();

    let sem3 = transcript.semester(3).unwrap();
    assert_eq!(sem3.total_credits, 7);
    assert_eq!(sem3.earned_grade_points, 47);
    assert_eq!(sem3.sgpa, 6.71);
}

#[test]
fn cgpa_weights_every_subject_not_every_semester() {
    let transcript = compute_from_pages(
        [
            "BEC302 Digital System Design 72 P\nBEC303 Electronic Devices 52 P",
            "BEC402 Principles of Communication 91 P\nBECL405 Communication Laboratory 85 P",
        ],
        &GpaConfig::default(),
    )
    .unwrap();

    assert_eq!(transcript.semester(3).unwrap().sgpa, 6.71);
    assert_eq!(transcript.semester(4).unwrap().sgpa, 9.8);
    // (47 + 49) / (7 + 5)
    assert_eq!(transcript.total_credits, 12);
    assert_eq!(transcript.earned_grade_points, 96);
    assert_eq!(transcript.cgpa, 8.0);

    let mean_of_sgpas = (6.71 + 9.8) / 2.0;
    assert!((transcript.cgpa - mean_of_sgpas).abs() > 0.1);
}

#[test]
fn semesters_ascend_and_subjects_keep_first_seen_order() {
    let transcript = compute_from_pages(
        [
            "BEC402 91 P\nBEC302 72 P",
            "BEC303 52 P\nBEC302 80 P\nBEC401 66 P",
        ],
        &GpaConfig::default(),
    )
    .unwrap();

    let semesters: Vec<u8> = transcript.semesters.iter().map(|s| s.semester).collect();
    assert_eq!(semesters, [3, 4]);

    let sem3: Vec<&str> = transcript.semester(3).unwrap().subjects.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(sem3, ["BEC302", "BEC303"]);
    let sem4: Vec<&str> = transcript.semester(4).unwrap().subjects.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(sem4, ["BEC402", "BEC401"]);

    assert_eq!(transcript.subject("BEC302").unwrap().marks.raw(), Some(80));
}

#[test]
fn unknown_codes_are_credited_by_rule_and_flagged() {
    let transcript = compute_from_pages(
        [
            "BXY803 Major Project 170 P\n\
             BXYL306 Analog Lab 90 P\n\
             BXY602 Control Systems 75 P\n\
             BXY611 Open Elective 68 P\n\
             BEC302 Digital System Design 72 P",
        ],
        &GpaConfig::default(),
    )
    .unwrap();

    let project = transcript.subject("BXY803").unwrap();
    assert_eq!(project.credits, 8);
    assert_eq!(project.credit_source, CreditSource::Fallback(CreditRuleKind::Project));
    // 170 printed out of 200
    assert_eq!(project.marks, Marks::Numeric { raw: 170, percentage: 85.0 });
    assert_eq!(project.grade_point, 9);

    let lab = transcript.subject("BXYL306").unwrap();
    assert_eq!(lab.credits, 1);
    assert_eq!(lab.credit_source, CreditSource::Fallback(CreditRuleKind::Lab));

    let core = transcript.subject("BXY602").unwrap();
    assert_eq!(core.credits, 4);
    assert_eq!(core.credit_source, CreditSource::Fallback(CreditRuleKind::CorePosition));

    let elective = transcript.subject("BXY611").unwrap();
    assert_eq!(elective.credits, 3);
    assert_eq!(elective.credit_source, CreditSource::Fallback(CreditRuleKind::Default));

    assert_eq!(transcript.subject("BEC302").unwrap().credit_source, CreditSource::Table);

    let mut flagged: Vec<&str> = transcript.fallback_codes().into_iter().map(|c| c.as_str()).collect();
    flagged.sort_unstable();
    assert_eq!(flagged, ["BXY602", "BXY611", "BXY803", "BXYL306"]);
}

#[test]
fn explicit_fail_overrides_marks() {
    let transcript =
        compute_from_pages(["BEC303 Electronic Devices 64 F"], &GpaConfig::default()).unwrap();
    let r = transcript.subject("BEC303").unwrap();
    assert_eq!(r.pass_fail, PassFail::Fail);
    assert_eq!((r.letter_grade.as_str(), r.grade_point), ("F", 0));
    assert_eq!(transcript.cgpa, 0.0);
}

#[test]
fn marks_below_pass_mark_fail_without_token() {
    let transcript = compute_from_pages(["BEC303 Electronic Devices 35"], &GpaConfig::default()).unwrap();
    let r = transcript.subject("BEC303").unwrap();
    assert_eq!(r.pass_fail, PassFail::Fail);
    assert_eq!(r.grade_point, 0);
}

#[test]
fn columnar_policy_sums_internal_and_external() {
    let page = ["BEC303 Electronic Devices 38 40 P"];

    let maximum = compute_from_pages(page, &GpaConfig::default()).unwrap();
    assert_eq!(maximum.subject("BEC303").unwrap().marks.raw(), Some(40));

    let config = GpaConfig::builder()
        .marks_policy(MarksPolicy::Columnar)
        .build()
        .unwrap();
    let columnar = compute_from_pages(page, &config).unwrap();
    let r = columnar.subject("BEC303").unwrap();
    assert_eq!(r.marks.raw(), Some(78));
    assert_eq!(r.letter_grade, "A");
}

#[test]
fn letter_grade_rows_are_graded_from_the_ladder() {
    let transcript = compute_from_pages(
        ["BEC404 Linear Integrated Circuits A+ P\nBEC303 Electronic Devices 52 P"],
        &GpaConfig::default(),
    )
    .unwrap();
    let r = transcript.subject("BEC404").unwrap();
    assert_eq!(r.marks, Marks::Letter { letter: "A+".into() });
    assert_eq!(r.grade_point, 9);
    assert_eq!(r.credits, 3);
}

#[test]
fn custom_scheme_changes_credits_and_ladder() {
    let scheme = GradingScheme::from_json_str(
        r#"{
            "name": "pass-fail-2019",
            "credit_table": { "CS101": 5 },
            "grade_ladder": {
                "bands": [
                    { "letter": "S", "min_percentage": 85.0, "points": 10 },
                    { "letter": "E", "min_percentage": 35.0, "points": 5 }
                ]
            },
            "pass_percentage": 35.0
        }"#,
    )
    .unwrap();
    let config = GpaConfig::builder().scheme(scheme).build().unwrap();

    let transcript = compute_from_pages(["CS101 Programming 88 P\nCS102 Discrete Maths 36"], &config).unwrap();
    let cs101 = transcript.subject("CS101").unwrap();
    assert_eq!((cs101.letter_grade.as_str(), cs101.grade_point, cs101.credits), ("S", 10, 5));
    let cs102 = transcript.subject("CS102").unwrap();
    assert_eq!(cs102.pass_fail, PassFail::Pass);
    assert_eq!(cs102.letter_grade, "E");
}

#[test]
fn extraction_is_repeatable() {
    let pages = [SEM3_SHEET, SEM4_SHEET, SUPPLEMENTARY_SHEET];
    let first = compute_from_pages(pages, &GpaConfig::default()).unwrap();
    let second = compute_from_pages(pages, &GpaConfig::default()).unwrap();
    assert_eq!(first, second);
}

// ── Document batches through the I/O shell ───────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl GpaProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.events.lock().unwrap().push(format!("batch {total_documents}"));
    }

    fn on_document_start(&self, index: usize, _total: usize, _source: &str) {
        self.events.lock().unwrap().push(format!("start {index}"));
    }

    fn on_document_complete(&self, index: usize, _total: usize, pages: usize, attempts: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {index} {pages}p {attempts}a"));
    }

    fn on_document_error(&self, index: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error {index}"));
    }

    fn on_batch_complete(&self, _total_documents: usize, subjects: usize) {
        self.events.lock().unwrap().push(format!("complete {subjects}"));
    }
}

#[tokio::test]
async fn batch_of_text_dumps() {
    let dir = tempfile::tempdir().unwrap();
    let regular = write_dump(&dir, "regular.txt", &[SEM3_SHEET, SEM4_SHEET]);
    let supplementary = write_dump(&dir, "supplementary.txt", &[SUPPLEMENTARY_SHEET]);

    let recorder = Arc::new(RecordingCallback::default());
    let config = GpaConfig::builder()
        .progress_callback(recorder.clone() as Arc<dyn GpaProgressCallback>)
        .build()
        .unwrap();

    let output: GpaOutput = compute([path_str(&regular), path_str(&supplementary)], &config)
        .await
        .unwrap();

    assert_eq!(output.identifier.as_ref().map(|i| i.as_str()), Some("1AA21EC045"));
    assert_eq!(output.scheme, "vtu-2022");

    // BEC302 re-sat: 72 (A, 8) replaces 38 (F)
    let t = &output.transcript;
    assert_eq!(t.subject("BEC302").unwrap().marks.raw(), Some(72));
    assert_eq!(t.semester(3).unwrap().sgpa, 6.71);
    assert_eq!(t.semester(4).unwrap().sgpa, 9.8);
    assert_eq!(t.cgpa, 8.0);

    assert_eq!(output.documents.len(), 2);
    assert_eq!(output.documents[0].pages, 2);
    assert_eq!(output.documents[0].attempts, 4);
    assert_eq!(output.documents[1].attempts, 1);
    assert_eq!(output.stats.documents, 2);
    assert_eq!(output.stats.pages, 3);
    assert_eq!(output.stats.attempts, 5);
    assert_eq!(output.stats.subjects, 4);
    assert_eq!(output.stats.fallback_credit_subjects, 0);

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        [
            "batch 2",
            "start 1",
            "done 1 2p 4a",
            "start 2",
            "done 2 1p 1a",
            "complete 4",
        ]
    );
}

#[tokio::test]
async fn batch_order_is_input_order_under_concurrency() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_dump(&dir, "a.txt", &["BEC303 Electronic Devices 60 P"]);
    let b = write_dump(&dir, "b.txt", &["BEC303 Electronic Devices 60 P\nBEC302 72 P"]);

    let output = compute([path_str(&a), path_str(&b)], &quiet_config()).await.unwrap();
    // Equal marks: the attempt from the first document is kept.
    let sem3: Vec<&str> = output.transcript.semester(3).unwrap().subjects.iter().map(|s| s.code.as_str()).collect();
    assert_eq!(sem3, ["BEC303", "BEC302"]);
}

#[tokio::test]
async fn zero_concurrency_set_directly_still_completes() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_dump(&dir, "a.txt", &["BEC303 Electronic Devices 60 P"]);
    let b = write_dump(&dir, "b.txt", &["BEC302 Digital System Design 72 P"]);

    let mut config = GpaConfig::default();
    config.concurrency = 0;
    let output = tokio::time::timeout(
        std::time::Duration::from_secs(10),
        compute([path_str(&a), path_str(&b)], &config),
    )
    .await
    .expect("batch stalled")
    .unwrap();
    assert_eq!(output.stats.documents, 2);
    assert_eq!(output.stats.subjects, 2);
}

#[tokio::test]
async fn conflicting_documents_abort_with_error_event() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_dump(&dir, "a.txt", &["USN 1AA21EC045\nBEC302 62 P"]);
    let b = write_dump(&dir, "b.txt", &["USN 1AA21EC099\nBEC303 71 P"]);

    let recorder = Arc::new(RecordingCallback::default());
    let config = GpaConfig::builder()
        .progress_callback(recorder.clone() as Arc<dyn GpaProgressCallback>)
        .build()
        .unwrap();

    let err = compute([path_str(&a), path_str(&b)], &config).await.unwrap_err();
    assert!(matches!(
        err,
        Pdf2GpaError::Extraction(ExtractionFailure::IdentityConflict { .. })
    ));

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events.last().map(String::as_str), Some("error 2"));
    assert!(!events.iter().any(|e| e.starts_with("complete")));
}

#[tokio::test]
async fn empty_batch_is_no_data() {
    let inputs: Vec<String> = Vec::new();
    let err = compute(inputs, &quiet_config()).await.unwrap_err();
    assert!(matches!(err, Pdf2GpaError::Extraction(ExtractionFailure::NoData)));
}

#[tokio::test]
async fn unreadable_inputs_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_dump(&dir, "good.txt", &[SEM3_SHEET]);
    let image = dir.path().join("scan.png");
    std::fs::write(&image, b"\x89PNG\r\n").unwrap();

    let err = compute([path_str(&good), path_str(&image)], &quiet_config())
        .await
        .unwrap_err();
    assert!(matches!(err, Pdf2GpaError::NotAPdf { .. }), "{err}");

    let missing = dir.path().join("missing.pdf");
    let err = compute([path_str(&missing)], &quiet_config()).await.unwrap_err();
    assert!(matches!(err, Pdf2GpaError::FileNotFound { .. }), "{err}");
}

#[tokio::test]
async fn oversized_document_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let big = write_dump(&dir, "big.txt", &[SEM3_SHEET, SEM4_SHEET, SUPPLEMENTARY_SHEET]);
    let config = GpaConfig::builder().max_pages_per_document(2).build().unwrap();

    let err = compute([path_str(&big)], &config).await.unwrap_err();
    assert!(matches!(err, Pdf2GpaError::TooManyPages { pages: 3, limit: 2, .. }), "{err}");
}

#[tokio::test]
async fn json_output_written_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let dump = write_dump(&dir, "sem3.txt", &[SEM3_SHEET]);
    let out = dir.path().join("reports").join("transcript.json");

    let output = compute_to_file([path_str(&dump)], &out, &quiet_config()).await.unwrap();
    assert!(out.exists());
    assert!(!out.with_extension("json.tmp").exists());

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["identifier"], "1AA21EC045");
    assert_eq!(written["transcript"]["cgpa"], output.transcript.cgpa);
    assert_eq!(
        written["transcript"]["semesters"][0]["subjects"][0]["credit_source"]["source"],
        "table"
    );
}

#[tokio::test]
async fn inspect_reports_without_grading() {
    let dir = tempfile::tempdir().unwrap();
    let dump = write_dump(&dir, "sem3.txt", &["Cover page", SEM3_SHEET]);

    let report = inspect(path_str(&dump), &quiet_config()).await.unwrap();
    assert_eq!(report.pages, 2);
    assert_eq!(report.attempts, 2);
    assert_eq!(report.identifier.map(|i| i.to_string()).as_deref(), Some("1AA21EC045"));
}

#[test]
fn in_memory_text_dump() {
    let bytes = format!("{SEM3_SHEET}\u{0C}{SEM4_SHEET}");
    let output = tokio_test::block_on(compute_from_bytes(bytes.as_bytes(), &quiet_config())).unwrap();
    assert_eq!(output.stats.pages, 2);
    assert_eq!(output.transcript.semesters.len(), 2);
}

#[test]
fn sync_wrapper_matches_async() {
    let dir = tempfile::tempdir().unwrap();
    let dump = write_dump(&dir, "sem4.txt", &[SEM4_SHEET]);
    let output = compute_sync([path_str(&dump)], &quiet_config()).unwrap();
    assert_eq!(output.transcript.cgpa, 9.8);
}
