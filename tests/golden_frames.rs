//! Decoding of variable data responses captured from real meters.

use chrono::NaiveDate;
use mbus_master::mbus::frame::LongFrame;
use mbus_master::payload::RecordFunction;
use mbus_master::util::hex::decode_hex;
use mbus_master::{MBusError, MBusRecordValue};

const EXAMPLE_DATA_01_HEX: &str = "6831316808017245585703B40534049E0027B60306F934150315C6004D052E00000000053D00000000055B22F32642055FC7DA0D42FA16";

const EDC_HEX: &str = "68AEAE682801729508121183140204170000008400863B230000008400863CD10100008440863B000000008440863C0000000085005B2B4BAC4185005F20D7AC4185405B0000B84285405F0000B84285003B8400353F85403B0000000095003B95CFB24395403B0000000085002B0000000085402B0000000095002BD39F904695402B00000000046D190F8A1784007C0143F30D000084407C01439D01000084007C01630100000084407C0163010000000F2F16";

const APPLICATION_BUSY_HEX: &str = "68040468080170088116";

const EFE_ENGELMANN_HEX: &str = "68A1A16808007245330824C5140004662700000478917B6F01046D172ECC13041500000000441500000000840115000000000406000000004406000000008401060000000084100600000000C410060000000084110600000000426CBF1C026CDF1C8420060000000084300600000000043B00000000143B19000000042B00000000142B0B000000025B1600025F150004610900000002230C0201FD17000490280B000000EB16";

const ELS_ELSTER_HEX: &str = "686868680800725139494493152F04A17000000C06000000008C1006000000008C2013000000000C13000000003C2BBDEBDDDD3B3BBDEBDD0A5A27020A5E26020A6201000A273007046D090DCD134C06000000004C1300000000CC100600000000CC201300000000426CBF154016";

fn frame(hex: &str) -> LongFrame {
    LongFrame::from_bytes(decode_hex(hex).unwrap())
}

fn assert_real(value: &MBusRecordValue, expected: f32) {
    match value {
        MBusRecordValue::Real(v) => assert!((v - expected).abs() < 0.001, "{v} != {expected}"),
        other => panic!("expected real, got {other:?}"),
    }
}

#[test]
fn test_example_data_01() {
    let decoded = frame(EXAMPLE_DATA_01_HEX).decode().unwrap();
    assert_eq!(decoded.control, 0x08);
    assert_eq!(decoded.address, 0x01);
    assert_eq!(decoded.ci, 0x72);
    assert!(!decoded.has_more_records());

    let header = decoded.header.as_ref().unwrap();
    assert_eq!(header.identification, Some(3575845));
    assert_eq!(header.manufacturer.as_deref(), Some("AMT"));
    assert_eq!(header.version, Some(0x34));
    assert_eq!(header.medium, Some(0x04));
    assert_eq!(header.access_number, 0x9E);
    assert_eq!(header.status, 0x00);
    assert_eq!(header.signature, 0xB627);

    let records = &decoded.records;
    assert_eq!(records.len(), 6);

    assert_eq!(records[0].value, MBusRecordValue::Integer(1389817));
    assert_eq!(records[0].quantity(), "Energy");
    assert_eq!(records[0].normalized_value(), Some(1389817000.0));

    assert_eq!(records[1].value, MBusRecordValue::Integer(5046470));
    assert_eq!(records[1].quantity(), "Volume");
    assert_eq!(records[1].unit(), "m^3");

    assert_real(&records[2].value, 0.0);
    assert_real(&records[3].value, 0.0);
    assert_real(&records[4].value, 41.737);
    assert_eq!(records[4].quantity(), "Flow temperature");
    assert_real(&records[5].value, 35.464);
    assert_eq!(records[5].quantity(), "Return temperature");
}

#[test]
fn test_edc() {
    let decoded = frame(EDC_HEX).decode().unwrap();
    let header = decoded.header.as_ref().unwrap();
    assert_eq!(header.identification, Some(11120895));
    assert_eq!(header.manufacturer.as_deref(), Some("EDC"));

    let records = &decoded.records;
    assert_eq!(records.len(), 21);

    // energy with orthogonal VIFE
    assert_eq!(records[0].drh.dib.dife, vec![0x00]);
    assert_eq!(records[0].drh.vib.vife, vec![0x3B]);
    assert_eq!(records[0].value, MBusRecordValue::Integer(35));

    assert_real(&records[4].value, 21.5367);

    assert_eq!(
        records[16].value,
        MBusRecordValue::DateTime(
            NaiveDate::from_ymd_opt(2012, 7, 10)
                .unwrap()
                .and_hms_opt(15, 25, 0)
                .unwrap()
        )
    );

    // plain text units
    assert_eq!(records[17].unit(), "C");
    assert_eq!(records[17].value, MBusRecordValue::Integer(3571));
    assert_eq!(records[19].unit(), "c");

    let last = &records[20];
    assert_eq!(last.function, RecordFunction::ManufacturerSpecific);
    assert!(last.data.is_empty());
    assert!(!decoded.has_more_records());
}

#[test]
fn test_application_busy_error() {
    let result = frame(APPLICATION_BUSY_HEX).decode();
    assert!(matches!(result, Err(MBusError::UnsupportedCi(0x70))));
}

#[test]
fn test_efe_engelmann() {
    let decoded = frame(EFE_ENGELMANN_HEX).decode().unwrap();
    let header = decoded.header.as_ref().unwrap();
    assert_eq!(header.identification, Some(24083345));
    assert_eq!(header.manufacturer.as_deref(), Some("EFE"));
    assert_eq!(header.status, 0x27);

    let records = &decoded.records;
    assert_eq!(records.len(), 25);

    assert_eq!(records[0].quantity(), "Fabrication No");
    assert_eq!(records[0].value, MBusRecordValue::Integer(24083345));

    assert_eq!(
        records[1].value,
        MBusRecordValue::DateTime(
            NaiveDate::from_ymd_opt(2014, 3, 12)
                .unwrap()
                .and_hms_opt(14, 23, 0)
                .unwrap()
        )
    );

    assert_eq!(records[4].storage_number, 2);
    assert_eq!(records[8].tariff, 1);
    assert_eq!(records[9].storage_number, 1);
    assert_eq!(records[9].tariff, 1);

    assert_eq!(
        records[11].value,
        MBusRecordValue::Date(NaiveDate::from_ymd_opt(2013, 12, 31).unwrap())
    );
    assert_eq!(records[11].storage_number, 1);
    assert_eq!(
        records[12].value,
        MBusRecordValue::Date(NaiveDate::from_ymd_opt(2014, 12, 31).unwrap())
    );

    assert_eq!(records[16].function, RecordFunction::Maximum);
    assert_eq!(records[23].quantity(), "Error flags");
}

#[test]
fn test_els_elster() {
    let decoded = frame(ELS_ELSTER_HEX).decode().unwrap();
    let header = decoded.header.as_ref().unwrap();
    assert_eq!(header.identification, Some(44493951));
    assert_eq!(header.manufacturer.as_deref(), Some("ELS"));

    let records = &decoded.records;
    assert_eq!(records.len(), 16);
    assert_eq!(records[0].value, MBusRecordValue::Bcd(0));

    // error-state values with hex digits stay raw
    assert_eq!(records[4].function, RecordFunction::DuringError);
    assert_eq!(records[4].value, MBusRecordValue::Bytes(vec![0xBD, 0xEB, 0xDD, 0xDD]));

    assert_eq!(records[6].value, MBusRecordValue::Bcd(227));
    assert_eq!(records[9].value, MBusRecordValue::Bcd(730));

    assert_eq!(
        records[15].value,
        MBusRecordValue::Date(NaiveDate::from_ymd_opt(2013, 5, 31).unwrap())
    );
}

#[test]
fn test_decoded_frame_serializes() {
    let decoded = frame(EXAMPLE_DATA_01_HEX).decode().unwrap();
    let json = serde_json::to_value(&decoded).unwrap();
    assert_eq!(json["header"]["manufacturer"], "AMT");
    assert_eq!(json["records"][0]["value"]["Integer"], 1389817);
    assert_eq!(json["more_records_follow"], false);
}
