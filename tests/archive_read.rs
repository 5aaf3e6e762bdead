use doc_stitch::archive::read_entries;
use doc_stitch::error::SegmentError;
use flate2::{write::GzEncoder, Compression};
use std::io::{Cursor, Write};
use tar::{Builder, EntryType, Header};

fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut tar_data = Vec::new();
    {
        let mut builder = Builder::new(&mut tar_data);
        for (name, data) in entries {
            let mut header = Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, *data).unwrap();
        }
        builder.finish().unwrap();
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_data).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn yields_entries_in_encounter_order() {
    let bytes = tar_gz(&[
        ("job/2", b"two"),
        ("job/manifest.out", b"manifest"),
        ("job/1", b"one"),
    ]);

    let mut seen = Vec::new();
    read_entries(Cursor::new(bytes), |entry| {
        seen.push((entry.name, entry.contents));
        Ok(())
    })
    .unwrap();

    assert_eq!(
        seen,
        vec![
            ("job/2".to_string(), b"two".to_vec()),
            ("job/manifest.out".to_string(), b"manifest".to_vec()),
            ("job/1".to_string(), b"one".to_vec()),
        ]
    );
}

#[test]
fn skips_directory_entries() {
    let mut tar_data = Vec::new();
    {
        let mut builder = Builder::new(&mut tar_data);

        let mut dir = Header::new_gnu();
        dir.set_path("job/").unwrap();
        dir.set_entry_type(EntryType::Directory);
        dir.set_size(0);
        dir.set_mode(0o755);
        dir.set_cksum();
        builder.append(&dir, &[][..]).unwrap();

        let data = b"payload";
        let mut file = Header::new_gnu();
        file.set_path("job/1").unwrap();
        file.set_size(data.len() as u64);
        file.set_mode(0o644);
        file.set_cksum();
        builder.append(&file, &data[..]).unwrap();

        builder.finish().unwrap();
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tar_data).unwrap();
    let bytes = encoder.finish().unwrap();

    let mut names = Vec::new();
    read_entries(Cursor::new(bytes), |entry| {
        names.push(entry.name);
        Ok(())
    })
    .unwrap();

    assert_eq!(names, vec!["job/1".to_string()]);
}

#[test]
fn rejects_garbage_stream() {
    let err = read_entries(Cursor::new(b"definitely not a gzip stream".to_vec()), |_| Ok(()))
        .unwrap_err();
    assert!(matches!(err, SegmentError::ArchiveCorrupt(_)));
}

#[test]
fn rejects_truncated_stream() {
    let bytes = tar_gz(&[("job/1", b"payload payload payload payload")]);
    let cut = &bytes[..bytes.len() / 2];

    let err = read_entries(Cursor::new(cut.to_vec()), |_| Ok(())).unwrap_err();
    assert!(matches!(err, SegmentError::ArchiveCorrupt(_)));
}

#[test]
fn visitor_errors_stop_the_pass() {
    let bytes = tar_gz(&[("job/1", b"one"), ("job/2", b"two")]);

    let mut seen = 0;
    let err = read_entries(Cursor::new(bytes), |_| {
        seen += 1;
        Err(SegmentError::Processing("stop".into()))
    })
    .unwrap_err();

    assert_eq!(seen, 1);
    assert!(matches!(err, SegmentError::Processing(_)));
}
