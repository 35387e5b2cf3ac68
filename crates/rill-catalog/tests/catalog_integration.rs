//! End-to-end catalog scenarios: bootstrap from an init data file, record
//! round-trips through table descriptors, catalog DDL, and the volatile
//! substrate's update semantics.

use std::io::Write;

use rill_catalog::db::Database;
use rill_catalog::idxtyps::IdxType;
use rill_catalog::initfile::init_file_contents;
use rill_catalog::systables::initoids::{
    TAB_TABLE, TYP_INT2, TYP_INT4, TYP_INT8, TYP_VARCHAR,
};
use rill_catalog::BootstrapCatCache;
use rill_common::config::DbConfig;
use rill_common::types::Datum;
use rill_common::RillError;
use rill_storage::{CatalogStore, Record, VolatileStore};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("info")
        .try_init();
}

fn test_db() -> Database {
    init_logging();
    Database::open(DbConfig::for_testing(), true).unwrap()
}

#[test]
fn bootstrap_from_init_data_file() {
    init_logging();

    // Write the canonical init data to a real file and create the
    // database from it.
    let bootstrap = BootstrapCatCache::new().unwrap();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(init_file_contents(&bootstrap).as_bytes())
        .unwrap();
    file.flush().unwrap();

    let mut config = DbConfig::for_testing();
    config.init_data_file = Some(file.path().to_path_buf());
    let db = Database::open(config, true).unwrap();
    let cache = db.catcache();

    assert_eq!(cache.find_table_by_name("Table").unwrap(), Some(TAB_TABLE));
    let table = cache.find_table(TAB_TABLE).unwrap().unwrap();
    assert_eq!(table.tabname, "Table");
    let int4 = cache.find_type(TYP_INT4).unwrap().unwrap();
    assert_eq!(int4.typlen, 4);
}

#[test]
fn bootstrap_rejects_corrupt_init_data() {
    init_logging();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"table 1 999999 0\ndata broken\n").unwrap();
    file.flush().unwrap();

    let mut config = DbConfig::for_testing();
    config.init_data_file = Some(file.path().to_path_buf());
    let err = Database::open(config, true).unwrap_err();
    assert!(matches!(err, RillError::InputParse { .. }));
}

#[test]
fn roundtrip_three_field_record_through_table_desc() {
    let db = test_db();
    let tabid = db
        .create_table(
            "samples",
            &[TYP_INT4, TYP_VARCHAR, TYP_INT2],
            &[0, 10, 0],
            &["n", "label", "delta"],
            &[false, true, true],
            &[false, false, false],
        )
        .unwrap();

    let desc = db.catcache().find_table_desc(tabid).unwrap().unwrap();
    let schema = desc.schema();

    let data = [Datum::from_i32(42), Datum::null(), Datum::from_i16(-7)];
    let mut buf = Vec::new();
    let len = schema.write_payload_datums(&data, &mut buf).unwrap();
    assert_eq!(len % 8, 0);

    assert_eq!(schema.get_field(0, &buf).get_i32(), 42);
    assert!(schema.field_is_null(1, &buf));
    assert_eq!(schema.get_field(2, &buf).get_i16(), -7);

    // Dissembling gives back the inputs pointwise.
    let back = schema.dissemble_payload(&buf);
    assert_eq!(back[0].get_i32(), 42);
    assert!(back[1].is_null());
    assert_eq!(back[2].get_i16(), -7);
}

#[test]
fn varlen_fields_keep_declaration_order() {
    let db = test_db();
    let tabid = db
        .create_table(
            "notes",
            &[TYP_VARCHAR, TYP_INT4, TYP_VARCHAR],
            &[32, 0, 8],
            &["head", "n", "tail"],
            &[false, false, false],
            &[false, false, false],
        )
        .unwrap();

    let desc = db.catcache().find_table_desc(tabid).unwrap().unwrap();
    let schema = desc.schema();

    let data = [
        Datum::from_varlen_owned(b"hello".to_vec()),
        Datum::from_i32(123),
        Datum::from_varlen_owned(b"ab".to_vec()),
    ];
    let mut buf = Vec::new();
    schema.write_payload_datums(&data, &mut buf).unwrap();

    assert_eq!(schema.offset_and_length(0, &buf).1, 5);
    assert_eq!(schema.offset_and_length(2, &buf).1, 2);
    assert_eq!(schema.get_field(0, &buf).varlen_bytes(), b"hello");
    assert_eq!(schema.get_field(2, &buf).varlen_bytes(), b"ab");
}

#[test]
fn add_table_and_lookup() {
    let db = test_db();
    let tabid = db
        .create_table(
            "T",
            &[TYP_INT4, TYP_VARCHAR],
            &[0, 16],
            &["a", "b"],
            &[false, true],
            &[false, false],
        )
        .unwrap();

    assert_eq!(db.catcache().find_table_by_name("T").unwrap(), Some(tabid));
    assert_eq!(db.catcache().find_table_by_name("t").unwrap(), Some(tabid));

    let desc = db.catcache().find_table_desc(tabid).unwrap().unwrap();
    assert_eq!(desc.schema().field_name(0), "a");
    assert_eq!(desc.schema().num_fields(), 2);
}

#[test]
fn duplicate_add_table_fails_and_keeps_cache() {
    let db = test_db();
    let tabid = db
        .create_table("T", &[TYP_INT4], &[], &["a"], &[], &[])
        .unwrap();

    let err = db
        .create_table("T", &[TYP_INT8], &[], &["other"], &[], &[])
        .unwrap_err();
    assert!(matches!(err, RillError::AlreadyExists { .. }));

    // The original registration is untouched.
    assert_eq!(db.catcache().find_table_by_name("T").unwrap(), Some(tabid));
    let desc = db.catcache().find_table_desc(tabid).unwrap().unwrap();
    assert_eq!(desc.schema().field_type_id(0), TYP_INT4);
}

#[test]
fn index_over_new_table_resolves_default_operators() {
    let db = test_db();
    let tabid = db
        .create_table(
            "events",
            &[TYP_INT8, TYP_VARCHAR],
            &[0, 64],
            &["id", "tag"],
            &[false, false],
            &[false, false],
        )
        .unwrap();

    let idxid = db
        .create_index("events_by_id", tabid, IdxType::VolatileTree, true, &[0], &[], &[])
        .unwrap();

    let desc = db.catcache().find_index_desc(idxid).unwrap().unwrap();
    assert!(desc.index().idxunique);
    assert_eq!(desc.key_schema().num_fields(), 1);
    assert_eq!(desc.key_schema().field_type_id(0), TYP_INT8);
    assert!(desc.index_column(0).idxcolltfuncid.is_valid());
    assert!(desc.index_column(0).idxcoleqfuncid.is_valid());

    assert_eq!(
        db.catcache().find_all_indexes_of_table(tabid).unwrap(),
        vec![idxid]
    );
}

#[test]
fn volatile_substrate_update_in_place_vs_append() {
    // Insert a 64-byte record, update it with another 64-byte record
    // (in place, same record ID), then with a longer one (slot
    // invalidated, record re-appended under a new slot).
    let mut store = VolatileStore::new();
    let fid = store.create_file(true).unwrap();
    let fh = store.open_file(fid).unwrap();

    let r1 = [1u8; 64];
    let mut rec = Record::new(&r1);
    store.append_record(&fh, &mut rec).unwrap();
    let r1_rid = rec.record_id();

    let mut iter = store.iterate(&fh).unwrap();
    assert!(store.next_record(&mut iter).unwrap());
    let r2 = [2u8; 64];
    let mut rec = Record::new(&r2);
    store.update_current(&mut iter, &mut rec).unwrap();
    assert_eq!(rec.record_id(), r1_rid);

    let mut iter = store.iterate(&fh).unwrap();
    assert!(store.next_record(&mut iter).unwrap());
    let r3 = [3u8; 96];
    let mut rec = Record::new(&r3);
    store.update_current(&mut iter, &mut rec).unwrap();
    assert_ne!(rec.record_id(), r1_rid);

    // A resumed iteration returns the appended replacement.
    let mut iter = store.iterate(&fh).unwrap();
    assert!(store.next_record(&mut iter).unwrap());
    assert_eq!(store.current_record(&iter).unwrap(), &r3);
    assert_eq!(store.current_record_id(&iter), rec.record_id());
    assert!(!store.next_record(&mut iter).unwrap());
}

#[test]
fn catalog_survives_many_user_tables() {
    let db = test_db();
    let mut oids = Vec::new();
    for i in 0..32 {
        let name = format!("load_{i}");
        let tabid = db
            .create_table(
                &name,
                &[TYP_INT4, TYP_VARCHAR],
                &[0, 24],
                &[],
                &[],
                &[],
            )
            .unwrap();
        oids.push((name, tabid));
    }

    for (name, tabid) in &oids {
        assert_eq!(
            db.catcache().find_table_by_name(name).unwrap(),
            Some(*tabid)
        );
        let desc = db.catcache().find_table_desc(*tabid).unwrap().unwrap();
        assert_eq!(desc.schema().num_fields(), 2);
    }
}
