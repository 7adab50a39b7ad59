//! Assembles small synthetic DLIS byte streams in-memory and decodes them
//! end-to-end through the public API, in lieu of large binary fixtures
//! (not available in this environment). Covers multi-Logical-File
//! splitting, a multi-dimensional Channel, and Frame Data decode.

use dlis::{ObName, Slot, Value};

fn ident_bytes(s: &str) -> Vec<u8> {
    let mut v = vec![s.len() as u8];
    v.extend(s.as_bytes());
    v
}

/// A `UVARI`/`OBNAME` origin/copy byte for values that fit the 7-bit form.
fn uvari_small(v: u8) -> u8 {
    assert!(v < 0x80);
    v
}

fn obname_bytes(origin: u8, copy: u8, id: &str) -> Vec<u8> {
    let mut v = vec![uvari_small(origin), copy];
    v.extend(ident_bytes(id));
    v
}

/// Wraps `body` into one complete Logical Record Segment (a whole Logical
/// Record in itself: no predecessor, no successor). Appends a single
/// self-describing pad byte when the segment would otherwise be odd-length,
/// mirroring RP66's padding convention (the last pad byte's value equals the
/// pad count).
fn lrs(is_eflr: bool, lr_type: u8, mut body: Vec<u8>) -> Vec<u8> {
    let mut attr = 0u8;
    if is_eflr {
        attr |= 0b1000_0000;
    }
    if (4 + body.len()) % 2 != 0 {
        body.push(1u8);
        attr |= 0b0000_0001;
    }
    let total_len = 4 + body.len();
    assert!(total_len >= 16, "segment too short: {}", total_len);
    let mut out = Vec::new();
    out.extend(&(total_len as u16).to_be_bytes());
    out.push(attr);
    out.push(lr_type);
    out.extend(body);
    out
}

fn vr(segments: &[Vec<u8>]) -> Vec<u8> {
    let payload: Vec<u8> = segments.concat();
    let total = 4 + payload.len();
    let mut out = Vec::new();
    out.extend(&(total as u16).to_be_bytes());
    out.push(0xFF);
    out.push(1);
    out.extend(payload);
    out
}

fn sul_bytes() -> Vec<u8> {
    let mut v = Vec::with_capacity(80);
    v.extend(b"   1");
    v.extend(b"V1.00");
    v.extend(b"RECORD");
    v.extend(b"00000");
    v.extend(b"Synthetic Storage Set".to_string().as_bytes());
    v.resize(80, b' ');
    v
}

/// `Set(FILE-HEADER)[SEQUENCE-NUMBER, ID] -> Object("0"){"7", "MSCT_TEST"}`.
fn file_header_record(sequence_number: &str, id: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.push(0b1111_0000); // Set: type present, no name
    body.extend(ident_bytes("FILE-HEADER"));

    body.push(0b0011_0001); // Attribute: label + value
    body.extend(ident_bytes("SEQUENCE-NUMBER"));
    body.extend(ident_bytes(sequence_number)); // IDENT value (default rep code)

    body.push(0b0011_0001);
    body.extend(ident_bytes("ID"));
    body.extend(ident_bytes(id));

    body.push(0b0111_0000); // Object: name present
    body.extend(obname_bytes(0, 0, "0"));
    body.push(0b0010_0001); // Attribute: value only (label/rep inherited)
    body.extend(ident_bytes(sequence_number));
    body.push(0b0010_0001);
    body.extend(ident_bytes(id));

    lrs(true, 0, body)
}

/// `Set(CHANNEL)[REPRESENTATION-CODE, DIMENSION, UNITS] -> Object(DEPT), Object(ARR)`.
///
/// `DEPT` is a scalar `FSINGL` channel (dimension `[1]`); `ARR` is a
/// 2-element `USHORT` channel (dimension `[2]`), exercising the vector Slot
/// path and the `Π dimension[i]` element count.
fn channel_record() -> Vec<u8> {
    let mut body = Vec::new();
    body.push(0b1111_0000);
    body.extend(ident_bytes("CHANNEL"));

    body.push(0b0011_0100); // Attribute: label + rep-code
    body.extend(ident_bytes("REPRESENTATION-CODE"));
    body.push(15); // USHORT

    body.push(0b0011_0100);
    body.extend(ident_bytes("DIMENSION"));
    body.push(15); // USHORT

    body.push(0b0011_0000); // Attribute: label only (rep defaults to IDENT, unused)
    body.extend(ident_bytes("UNITS"));

    // Object DEPT.
    body.push(0b0111_0000);
    body.extend(obname_bytes(2, 0, "DEPT"));
    body.push(0b0010_0001); // REPRESENTATION-CODE override: value only
    body.push(2); // FSINGL
    body.push(0b0010_1001); // DIMENSION override: count + value
    body.push(1); // count = 1
    body.push(1); // dimension[0] = 1
    body.push(0b0010_0001); // UNITS override: value only
    body.extend(ident_bytes("M"));

    // Object ARR.
    body.push(0b0111_0000);
    body.extend(obname_bytes(2, 0, "ARR"));
    body.push(0b0010_0001);
    body.push(15); // USHORT
    body.push(0b0010_1001);
    body.push(1); // count = 1
    body.push(2); // dimension[0] = 2
    body.push(0b0010_0001);
    body.extend(ident_bytes("CNT"));

    lrs(true, 3, body)
}

/// `Set(FRAME)[CHANNELS] -> Object(FRAME1){[DEPT, ARR]}`.
fn frame_record() -> Vec<u8> {
    let mut body = Vec::new();
    body.push(0b1111_0000);
    body.extend(ident_bytes("FRAME"));

    body.push(0b0011_0100); // Attribute: label + rep-code
    body.extend(ident_bytes("CHANNELS"));
    body.push(23); // OBNAME

    body.push(0b0111_0000);
    body.extend(obname_bytes(2, 0, "FRAME1"));
    body.push(0b0010_1001); // CHANNELS override: count + value
    body.push(2); // count = 2
    body.extend(obname_bytes(2, 0, "DEPT"));
    body.extend(obname_bytes(2, 0, "ARR"));

    lrs(true, 4, body)
}

/// One Frame Data row for `FRAME1`: frame number 5, `DEPT = 1.5`,
/// `ARR = [10, 20]`.
fn frame_data_record() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend(obname_bytes(2, 0, "FRAME1"));
    body.push(uvari_small(5)); // frame number
    body.extend(&1.5f32.to_be_bytes()); // DEPT
    body.push(10);
    body.push(20); // ARR
    lrs(false, 0, body)
}

fn frame1() -> ObName {
    ObName { origin: 2, copy: 0, identifier: "FRAME1".to_string() }
}

fn arr() -> ObName {
    ObName { origin: 2, copy: 0, identifier: "ARR".to_string() }
}

#[test]
fn decodes_a_synthetic_multi_logical_file_stream() {
    let mut file = sul_bytes();
    file.extend(vr(&[
        file_header_record("7", "MSCT_TEST"),
        channel_record(),
        frame_record(),
        frame_data_record(),
        file_header_record("8", "SECOND_FILE"),
    ]));

    let (sul, logical_files) = dlis::parse_bytes(file, false).expect("synthetic stream should decode");

    assert_eq!(sul.sequence_number, 1);
    assert_eq!(sul.dlis_version, "V1.00");
    assert_eq!(logical_files.len(), 2);

    let first = &logical_files[0];
    assert_eq!(first.id(), Some("MSCT_TEST"));
    assert_eq!(first.seq_num(), Some("7"));

    let arr_info = first.channel_info(&arr()).expect("ARR channel should be known");
    assert_eq!(arr_info.dimension, vec![2]);
    assert_eq!(arr_info.elements_per_slot, 2);

    let rows = first.frame_data(&frame1()).expect("FRAME1 should have decoded rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].frame_number, 5);
    match &rows[0].slots[0] {
        Slot::Scalar(Value::FSingl(v)) => assert!((*v - 1.5).abs() < f32::EPSILON),
        other => panic!("expected a scalar DEPT slot, got {:?}", other),
    }
    match &rows[0].slots[1] {
        Slot::Vector(vs) => assert_eq!(vs.as_slice(), [Value::UShort(10), Value::UShort(20)]),
        other => panic!("expected a vector ARR slot, got {:?}", other),
    }

    let second = &logical_files[1];
    assert_eq!(second.seq_num(), Some("8"));
    assert!(second.frame_data(&frame1()).is_none());
}

#[test]
fn eflr_only_defers_frame_data() {
    let mut file = sul_bytes();
    file.extend(vr(&[file_header_record("1", "EFLR_ONLY"), channel_record(), frame_record(), frame_data_record()]));

    let (_sul, mut logical_files) = dlis::parse_bytes(file, true).expect("synthetic stream should decode");
    assert_eq!(logical_files.len(), 1);
    assert!(logical_files[0].frame_data(&frame1()).is_none());

    logical_files[0].load_iflr().unwrap();
    assert_eq!(logical_files[0].frame_data(&frame1()).unwrap().len(), 1);

    // Idempotent: a second call must not duplicate rows.
    logical_files[0].load_iflr().unwrap();
    assert_eq!(logical_files[0].frame_data(&frame1()).unwrap().len(), 1);
}

#[test]
fn dangling_frame_reference_is_dropped_not_fatal() {
    let mut file = sul_bytes();
    // Frame Data references FRAME1 with no FRAME/CHANNEL EFLRs at all.
    file.extend(vr(&[file_header_record("1", "DANGLING"), frame_data_record()]));

    let (_sul, logical_files) = dlis::parse_bytes(file, false).expect("a dangling reference must not abort the file");
    assert_eq!(logical_files.len(), 1);
    assert!(logical_files[0].frame_data(&frame1()).is_none());
}

#[test]
fn rejects_a_truncated_visible_record() {
    let mut file = sul_bytes();
    file.extend(vr(&[file_header_record("1", "X")]));
    file.truncate(file.len() - 3);
    assert!(dlis::parse_bytes(file, false).is_err());
}
