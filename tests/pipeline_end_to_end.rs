use doc_stitch::{
    config::Config,
    pipeline::SplitPipeline,
    report::{JobContext, Outcome, RejectReason},
};
use flate2::{write::GzEncoder, Compression};
use std::io::{Cursor, Write};
use tar::{Builder, Header};

fn tar_gz(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut tar_data = Vec::new();
    {
        let mut builder = Builder::new(&mut tar_data);
        for (name, data) in entries {
            let mut header = Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, data.as_slice()).unwrap();
        }
        builder.finish().unwrap();
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_data).unwrap();
    encoder.finish().unwrap()
}

fn record(page: u32, total: u32, classes: &[(&str, f64)]) -> String {
    serde_json::json!({
        "File": "batch.pdf",
        "DocumentType": "ScannedPDF",
        "DocumentMetadata": { "PageNumber": page, "Pages": total },
        "Version": "2023-03-20",
        "Classes": classes
            .iter()
            .map(|(name, score)| serde_json::json!({ "Name": name, "Score": score }))
            .collect::<Vec<_>>(),
    })
    .to_string()
}

fn ocr_payload(lines: &[&str]) -> Vec<u8> {
    let mut blocks = vec![serde_json::json!({ "BlockType": "PAGE" })];
    for line in lines {
        blocks.push(serde_json::json!({ "BlockType": "LINE", "Text": line }));
        blocks.push(serde_json::json!({ "BlockType": "WORD", "Text": "ignored" }));
    }
    serde_json::to_vec(&serde_json::json!({ "Blocks": blocks })).unwrap()
}

fn job() -> JobContext {
    JobContext {
        execution_id: "exec-9".into(),
        source: "s3://in/batch.pdf".into(),
    }
}

fn run(entries: &[(&str, Vec<u8>)]) -> doc_stitch::report::SplitResult {
    let cfg = Config::default();
    let pipeline = SplitPipeline::new(&cfg);
    pipeline.run(&job(), Cursor::new(tar_gz(entries)))
}

#[test]
fn accepts_fully_classified_archive() {
    let manifest = [
        record(1, 4, &[("FIRST_PAGE", 1.0), ("BLANK", 0.0), ("PAGE", 0.0)]),
        record(2, 4, &[("PAGE", 0.999)]),
        record(3, 4, &[("FIRST_PAGE", 0.995)]),
        record(4, 4, &[("PAGE", 1.0)]),
    ]
    .join("\n");

    let result = run(&[
        ("job/batch.pdf.out", manifest.into_bytes()),
        ("job/batch.pdf/1", ocr_payload(&["INVOICE", "No. 1138"])),
        ("job/batch.pdf/2", ocr_payload(&["page two"])),
        ("job/batch.pdf/3", ocr_payload(&["CONTRACT"])),
        ("job/batch.pdf/4", ocr_payload(&["page four"])),
    ]);

    assert_eq!(result.outcome, Outcome::Accepted);
    assert!(result.reason.is_none());
    assert!(result.unprocessed_pages.is_none());

    let docs = result.documents.unwrap();
    let numbers: Vec<Vec<u32>> = docs
        .iter()
        .map(|d| d.pages.iter().map(|p| p.page_number).collect())
        .collect();
    assert_eq!(numbers, vec![vec![1, 2], vec![3, 4]]);

    // Pages are strictly increasing within documents and document order
    // follows first-page order; together with the assignment above the whole
    // universe 1..=4 is accounted for.
    for doc in &docs {
        assert!(doc.pages.windows(2).all(|w| w[0].page_number < w[1].page_number));
        assert_eq!(doc.execution_id, "exec-9");
        assert_eq!(doc.source, "s3://in/batch.pdf");
    }

    // OCR text: LINE blocks joined by line breaks, WORD blocks ignored.
    assert_eq!(docs[0].pages[0].ocr.as_deref(), Some("INVOICE\nNo. 1138"));

    // The classification payload rides through verbatim, unknown keys
    // included.
    let value = serde_json::to_value(&docs[0]).unwrap();
    assert_eq!(value["Pages"][0]["Classification"]["File"], "batch.pdf");
    assert_eq!(value["Pages"][0]["Classification"]["Version"], "2023-03-20");
    assert_eq!(value["ExecutionId"], "exec-9");
}

#[test]
fn rejects_low_confidence_and_missing_pages() {
    // Manifest declares two pages but only page 1 has a record, and that one
    // scores below the gate: both pages end up unprocessed.
    let manifest = record(1, 2, &[("FIRST_PAGE", 0.5)]);

    let result = run(&[
        ("job/batch.pdf.out", manifest.into_bytes()),
        ("job/batch.pdf/1", ocr_payload(&["hello"])),
    ]);

    assert_eq!(result.outcome, Outcome::Rejected);
    assert_eq!(result.reason, Some(RejectReason::UnclassifiedPages));
    assert_eq!(
        result.unprocessed_pages,
        Some(vec!["1".to_string(), "2".to_string()])
    );
    assert!(result.error_message.is_none());
    assert_eq!(result.documents.map(|d| d.len()), Some(0));
}

#[test]
fn classifies_pages_missing_their_ocr_half() {
    let manifest = [
        record(1, 2, &[("FIRST_PAGE", 1.0)]),
        record(2, 2, &[("PAGE", 1.0)]),
    ]
    .join("\n");

    // No archive entry for page 2: its text defaults to empty.
    let result = run(&[
        ("job/batch.pdf.out", manifest.into_bytes()),
        ("job/batch.pdf/1", ocr_payload(&["first"])),
    ]);

    assert_eq!(result.outcome, Outcome::Accepted);
    let docs = result.documents.unwrap();
    assert_eq!(docs[0].pages[1].page_number, 2);
    assert_eq!(docs[0].pages[1].ocr.as_deref(), Some(""));
}

#[test]
fn entry_order_does_not_matter() {
    let manifest = [
        record(1, 2, &[("FIRST_PAGE", 1.0)]),
        record(2, 2, &[("PAGE", 1.0)]),
    ]
    .join("\n");

    let manifest_first = run(&[
        ("job/batch.pdf.out", manifest.clone().into_bytes()),
        ("job/batch.pdf/1", ocr_payload(&["first"])),
        ("job/batch.pdf/2", ocr_payload(&["second"])),
    ]);
    let manifest_last = run(&[
        ("job/batch.pdf/2", ocr_payload(&["second"])),
        ("job/batch.pdf/1", ocr_payload(&["first"])),
        ("job/batch.pdf.out", manifest.into_bytes()),
    ]);

    assert_eq!(
        serde_json::to_value(&manifest_first).unwrap(),
        serde_json::to_value(&manifest_last).unwrap()
    );
}

#[test]
fn corrupt_archive_becomes_error_envelope() {
    let cfg = Config::default();
    let pipeline = SplitPipeline::new(&cfg);
    let result = pipeline.run(&job(), Cursor::new(b"not an archive".to_vec()));

    assert_eq!(result.outcome, Outcome::Rejected);
    assert_eq!(result.reason, Some(RejectReason::Error));
    assert!(result.error_message.unwrap().contains("corrupt archive"));
    assert!(result.documents.is_none());
}

#[test]
fn orphan_page_becomes_error_envelope() {
    let manifest = record(1, 1, &[("PAGE", 1.0)]);
    let result = run(&[
        ("job/batch.pdf.out", manifest.into_bytes()),
        ("job/batch.pdf/1", ocr_payload(&["stray"])),
    ]);

    assert_eq!(result.outcome, Outcome::Rejected);
    assert_eq!(result.reason, Some(RejectReason::Error));
    assert!(result.error_message.unwrap().contains("page 1"));
}

#[test]
fn missing_manifest_becomes_error_envelope() {
    let result = run(&[("job/batch.pdf/1", ocr_payload(&["text"]))]);

    assert_eq!(result.outcome, Outcome::Rejected);
    assert_eq!(result.reason, Some(RejectReason::Error));
    assert!(result.error_message.unwrap().contains("manifest"));
}

#[test]
fn malformed_page_payload_becomes_error_envelope() {
    let manifest = record(1, 1, &[("FIRST_PAGE", 1.0)]);
    let result = run(&[
        ("job/batch.pdf.out", manifest.into_bytes()),
        ("job/batch.pdf/1", b"{ not json".to_vec()),
    ]);

    assert_eq!(result.outcome, Outcome::Rejected);
    assert_eq!(result.reason, Some(RejectReason::Error));
    assert!(result.error_message.unwrap().contains("job/batch.pdf/1"));
}
