use std::fs::{self, File};
use std::io::{Cursor, Seek, SeekFrom};

use ccml_tools::build::{build_method, build_stores, choose_depth};
use ccml_tools::format::{read_record, RawRecord, StoreHeader, POINTERS_START};
use ccml_tools::search::{bucket_prefixes, bucket_space};
use ccml_tools::source::{AllFilter, RawMethod, StageFilter};
use ccml_tools::{Classifier, DeviceCharset, Method, StoreWriter};

fn raw(title: &str, stage: u8, lead_head: &str, notation: &str) -> RawMethod {
    RawMethod {
        title: title.to_string(),
        notation: notation.to_string(),
        stage,
        lead_head: lead_head.to_string(),
        number_of_hunts: Some(1),
        classification: None,
    }
}

fn minor_methods(titles: &[&str]) -> Vec<Method> {
    let charset = DeviceCharset::new().unwrap();
    let classifier = Classifier::new(&charset);
    let mut methods: Vec<Method> = titles
        .iter()
        .map(|t| build_method(&charset, &classifier, &raw(t, 6, "135264", "-16-16-16,12")).unwrap())
        .collect();
    methods.sort();
    methods
}

fn write_to_bytes(methods: &[Method], stage: u8, depth: u8) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.ccml");
    let writer = StoreWriter::new(File::create(&path).unwrap(), stage, depth).unwrap();
    let written = writer.write_store(methods).unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(written, bytes.len() as u64);
    bytes
}

struct ParsedStore {
    header: StoreHeader,
    pointers: Vec<u32>,
    records: Vec<(u64, RawRecord)>,
}

fn parse_store(bytes: &[u8]) -> ParsedStore {
    let mut cursor = Cursor::new(bytes);
    let header = StoreHeader::read_from(&mut cursor).unwrap();
    assert_eq!(cursor.position(), POINTERS_START);

    let slots = bucket_space(header.depth) as usize;
    let mut pointers = Vec::with_capacity(slots);
    for _ in 0..slots {
        let mut buf = [0u8; 4];
        std::io::Read::read_exact(&mut cursor, &mut buf).unwrap();
        pointers.push(u32::from_le_bytes(buf));
    }

    let mut records = Vec::new();
    while cursor.position() < bytes.len() as u64 {
        let offset = cursor.position();
        records.push((offset, read_record(&mut cursor).unwrap()));
    }
    ParsedStore {
        header,
        pointers,
        records,
    }
}

#[test]
fn empty_store_points_at_end_of_file() {
    let bytes = write_to_bytes(&[], 6, 0);
    // header, then a single bucket pointer, then nothing
    assert_eq!(bytes.len(), 12);
    let store = parse_store(&bytes);
    assert_eq!(store.header.stage, 6);
    assert_eq!(store.pointers, vec![12]);
    assert!(store.records.is_empty());
}

#[test]
fn depth_zero_single_bucket_points_at_first_record() {
    let methods = minor_methods(&["Beta Minor", "Alpha Minor"]);
    let bytes = write_to_bytes(&methods, 6, 0);
    let store = parse_store(&bytes);
    assert_eq!(store.pointers.len(), 1);
    assert_eq!(store.pointers[0] as u64, store.records[0].0);
}

#[test]
fn rebuild_is_byte_identical() {
    let methods = minor_methods(&["College Minor", "Single Minor", "Kent Minor"]);
    let first = write_to_bytes(&methods, 6, 1);
    let second = write_to_bytes(&methods, 6, 1);
    assert_eq!(first, second);
}

#[test]
fn pointers_are_monotonic_and_bounded() {
    let methods = minor_methods(&[
        "Alpha Minor",
        "Bravo Minor",
        "Mike Minor",
        "Yankee Minor",
    ]);
    let bytes = write_to_bytes(&methods, 6, 1);
    let store = parse_store(&bytes);
    assert_eq!(store.pointers.len(), bucket_space(1) as usize);

    let records_start = POINTERS_START + 4 * bucket_space(1);
    let mut last = 0u32;
    for &p in &store.pointers {
        assert!(p as u64 >= records_start);
        assert!(p as u64 <= bytes.len() as u64);
        assert!(p >= last, "pointer table must be non-decreasing");
        last = p;
    }
    // nothing sorts into the "Z" bucket, so the last pointer is end-of-file
    assert_eq!(*store.pointers.last().unwrap() as u64, bytes.len() as u64);
}

#[test]
fn each_pointer_splits_records_by_bucket_prefix() {
    let titles = [
        "Alpha Minor",
        "Alnwick Minor",
        "Bourne Minor",
        "College Minor",
        "Kent Minor",
        "Oxford Minor",
        "Oswald Minor",
        "Wearmouth Minor",
    ];
    let methods = minor_methods(&titles);
    let bytes = write_to_bytes(&methods, 6, 2);
    let store = parse_store(&bytes);

    let charset = DeviceCharset::new().unwrap();
    let prefixes = bucket_prefixes(store.header.depth);
    assert_eq!(prefixes.len(), store.pointers.len());

    for (prefix, &pointer) in prefixes.iter().zip(&store.pointers) {
        for (offset, record) in &store.records {
            let sort = charset.decode(&record.title).to_uppercase();
            if *offset < pointer as u64 {
                assert!(
                    sort.as_str() <= prefix.as_str(),
                    "{:?} before bucket {:?}",
                    sort,
                    prefix
                );
            } else {
                assert!(
                    sort.as_str() > prefix.as_str(),
                    "{:?} at or after bucket {:?}",
                    sort,
                    prefix
                );
            }
        }
    }
}

#[test]
fn stage_mismatch_aborts_store() {
    let methods = minor_methods(&["Alpha Minor"]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.ccml");
    let writer = StoreWriter::new(File::create(&path).unwrap(), 8, 0).unwrap();
    assert!(writer.write_store(&methods).is_err());
}

#[test]
fn records_survive_the_round_trip() {
    let methods = minor_methods(&["Plain Bob Minor"]);
    let bytes = write_to_bytes(&methods, 6, 0);
    let store = parse_store(&bytes);
    assert_eq!(store.records.len(), 1);

    let record = &store.records[0].1;
    let charset = DeviceCharset::new().unwrap();
    assert_eq!(charset.decode(&record.title), "Plain Bob Minor");
    // 135264 is a five-lead head fixing only the treble
    assert_eq!(record.lead_count, 5);
    assert_eq!(record.hunt_bells, 1);
    assert_eq!(record.words, methods[0].notation);
}

#[test]
fn pipeline_from_xml_to_store() {
    let xml = r#"<?xml version="1.0"?>
<collection>
  <methodSet>
    <properties>
      <stage>6</stage>
      <numberOfHunts>1</numberOfHunts>
    </properties>
    <method>
      <title>Wragby Minor</title>
      <leadHead>135264</leadHead>
      <notation>-16-16-16,12</notation>
    </method>
    <method>
      <title>Abbeville Minor</title>
      <leadHead>135264</leadHead>
      <notation>-16-16-16,16</notation>
    </method>
  </methodSet>
  <methodSet>
    <properties>
      <stage>8</stage>
      <numberOfHunts>1</numberOfHunts>
    </properties>
    <method>
      <title>Plain Bob Major</title>
      <leadHead>13527486</leadHead>
      <notation>-18-18-18-18,12</notation>
    </method>
  </methodSet>
</collection>"#;

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("methods.xml");
    fs::write(&input, xml).unwrap();
    let out_dir = dir.path().join("out");

    let mut filter = AllFilter::new();
    filter.push(Box::new(StageFilter { min: 2, max: 16 }));
    let report = build_stores(&input, &filter, &out_dir).unwrap();

    assert_eq!(report.rejected, 0);
    assert_eq!(report.stages.len(), 2);
    assert_eq!(report.stages[0].stage, 6);
    assert_eq!(report.stages[1].stage, 8);

    let minor = parse_store(&fs::read(out_dir.join("methods-6.ccml")).unwrap());
    assert_eq!(minor.header.stage, 6);
    assert_eq!(minor.header.depth, choose_depth(2));
    assert_eq!(minor.records.len(), 2);

    // records come out in sort-key order, not source order
    let charset = DeviceCharset::new().unwrap();
    assert_eq!(charset.decode(&minor.records[0].1.title), "Abbeville Minor");
    assert_eq!(charset.decode(&minor.records[1].1.title), "Wragby Minor");

    let major = parse_store(&fs::read(out_dir.join("methods-8.ccml")).unwrap());
    assert_eq!(major.header.stage, 8);
    assert_eq!(major.records[0].1.lead_count, 7);
    assert_eq!(major.records[0].1.hunt_bells, 1);
}

#[test]
fn excessive_index_depth_rejected() {
    // depth 7's pointer table alone would pass the u32 offset limit,
    // and depth 14's bucket count saturates u64
    assert!(StoreWriter::new(Cursor::new(Vec::new()), 8, 3).is_ok());
    assert!(StoreWriter::new(Cursor::new(Vec::new()), 8, 7).is_err());
    assert!(StoreWriter::new(Cursor::new(Vec::new()), 8, 14).is_err());
}

#[test]
fn store_files_end_where_the_writer_says() {
    let methods = minor_methods(&["Alpha Minor", "Kent Minor"]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.ccml");
    let mut file = File::create(&path).unwrap();
    let writer = StoreWriter::new(file.try_clone().unwrap(), 6, 1).unwrap();
    let written = writer.write_store(&methods).unwrap();
    let end = file.seek(SeekFrom::End(0)).unwrap();
    assert_eq!(written, end);
}
