//! Integration tests for tables-hdf5.
//!
//! These run against the real HDF5 library: every test writes into its own
//! temporary directory and reads datasets back through the `hdf5` crate.

use std::cell::Cell;
use std::rc::Rc;

use hdf5::types::FixedAscii;
use hdf5::H5Type;
use tempfile::TempDir;

use tables_core::{Column, Group, GroupOps, OpenMode, SinkHandle, Table, TableError};

use crate::{Hdf5Error, Hdf5Sink};

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

// ── Hierarchical table fixture ────────────────────────────────────────────────

/// The record type matching `hier_columns` below, used for read-back.
#[derive(H5Type, Clone, Debug, PartialEq)]
#[repr(C)]
struct HierRec {
    bool_attr: u8,
    sid: i16,
    hid: i16,
    zeta: f64,
    nsize: u64,
    mname: FixedAscii<32>,
}

struct HierTable {
    table: Table,
    bool_attr: Column,
    sid: Column,
    hid: Column,
    zeta: Column,
    nsize: Column,
    mname: Column,
}

fn hier_table(name: &str) -> HierTable {
    let table = Table::results(name).unwrap();
    let bool_attr = Column::new::<bool>("bool_attr", "%d").unwrap();
    let sid = Column::new::<i16>("sid", "%hd").unwrap();
    let hid = Column::new::<i16>("hid", "%hd").unwrap();
    table.add_all(&[&bool_attr, &sid, &hid]).unwrap();

    let ms = Group::new_in(&table, "measurements").unwrap();
    let zeta = Column::new::<f64>("zeta", "%.10g").unwrap();
    let nsize = Column::new::<u64>("nsize", "%zu").unwrap();
    let mname = Column::string("mname", 31, "%s").unwrap();
    ms.add_all(&[&zeta, &nsize, &mname]).unwrap();

    HierTable {
        table,
        bool_attr,
        sid,
        hid,
        zeta,
        nsize,
        mname,
    }
}

impl HierTable {
    fn fill(&self, i: usize) {
        self.bool_attr.set(((i % 3) == 1) as u8 as f64).unwrap();
        self.sid.set(i as f64).unwrap();
        self.hid.set(i as f64).unwrap();
        self.zeta.set(i as f64 / 2.0).unwrap();
        self.nsize.set((i * 2) as f64).unwrap();
        self.mname.set_str(&format!("this is record {i}")).unwrap();
    }

    fn expected(i: usize) -> HierRec {
        HierRec {
            bool_attr: ((i % 3) == 1) as u8,
            sid: i as i16,
            hid: i as i16,
            zeta: i as f64 / 2.0,
            nsize: (i * 2) as u64,
            mname: FixedAscii::from_ascii(format!("this is record {i}").as_bytes()).unwrap(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn truncate_round_trip() {
    let dir = tmp();
    let path = dir.path().join("hier.h5");
    let fixture = hier_table("h5_truncate_round_trip");

    {
        let sink = SinkHandle::new(Hdf5Sink::create(&path, OpenMode::Truncate).unwrap());
        fixture.table.bind(&sink).unwrap();
        fixture.table.prolog().unwrap();
        for i in 0..10 {
            fixture.fill(i);
            fixture.table.emit_row().unwrap();
        }
        fixture.table.epilog().unwrap();
    }

    let file = hdf5::File::open(&path).unwrap();
    let ds = file.dataset("h5_truncate_round_trip").unwrap();
    assert_eq!(ds.shape(), vec![10]);
    let records = ds.read_raw::<HierRec>().unwrap();
    for (i, rec) in records.iter().enumerate() {
        assert_eq!(*rec, HierTable::expected(i), "record {i}");
    }
}

#[test]
fn truncate_mode_recreates_dataset_per_session() {
    let dir = tmp();
    let path = dir.path().join("sessions.h5");
    let fixture = hier_table("h5_truncate_sessions");

    let sink = SinkHandle::new(Hdf5Sink::create(&path, OpenMode::Truncate).unwrap());
    fixture.table.bind(&sink).unwrap();

    fixture.table.prolog().unwrap();
    for i in 0..5 {
        fixture.fill(i);
        fixture.table.emit_row().unwrap();
    }
    fixture.table.epilog().unwrap();

    // A second session in truncate mode unlinks the old dataset.
    fixture.table.prolog().unwrap();
    for i in 0..2 {
        fixture.fill(i);
        fixture.table.emit_row().unwrap();
    }
    fixture.table.epilog().unwrap();
    drop(sink);

    let file = hdf5::File::open(&path).unwrap();
    let ds = file.dataset("h5_truncate_sessions").unwrap();
    assert_eq!(ds.shape(), vec![2]);
}

#[test]
fn append_mode_extends_existing_dataset() {
    let dir = tmp();
    let path = dir.path().join("append.h5");

    {
        let fixture = hier_table("h5_append_extends");
        let sink = SinkHandle::new(Hdf5Sink::create(&path, OpenMode::Truncate).unwrap());
        fixture.table.bind(&sink).unwrap();
        fixture.table.prolog().unwrap();
        for i in 0..3 {
            fixture.fill(i);
            fixture.table.emit_row().unwrap();
        }
        fixture.table.epilog().unwrap();
    }

    {
        let fixture = hier_table("h5_append_extends");
        let sink = SinkHandle::new(Hdf5Sink::create(&path, OpenMode::Append).unwrap());
        fixture.table.bind(&sink).unwrap();
        fixture.table.prolog().unwrap();
        for i in 3..7 {
            fixture.fill(i);
            fixture.table.emit_row().unwrap();
        }
        fixture.table.epilog().unwrap();
    }

    let file = hdf5::File::open(&path).unwrap();
    let ds = file.dataset("h5_append_extends").unwrap();
    assert_eq!(ds.shape(), vec![7]);
    let records = ds.read_raw::<HierRec>().unwrap();
    for (i, rec) in records.iter().enumerate() {
        assert_eq!(*rec, HierTable::expected(i), "record {i}");
    }
}

#[test]
fn append_type_mismatch_fails_at_prolog() {
    let dir = tmp();
    let path = dir.path().join("mismatch.h5");

    {
        let table = Table::results("h5_mismatch").unwrap();
        let a = Column::new::<i32>("a", "%d").unwrap();
        let b = Column::new::<f64>("b", "%g").unwrap();
        table.add_all(&[&a, &b]).unwrap();

        let sink = SinkHandle::new(Hdf5Sink::create(&path, OpenMode::Truncate).unwrap());
        table.bind(&sink).unwrap();
        table.prolog().unwrap();
        table.emit_row().unwrap();
        table.epilog().unwrap();
    }

    // Same table name, but `b` is now f32: append must refuse it.
    let table = Table::results("h5_mismatch").unwrap();
    let a = Column::new::<i32>("a", "%d").unwrap();
    let b = Column::new::<f32>("b", "%g").unwrap();
    table.add_all(&[&a, &b]).unwrap();

    let sink = SinkHandle::new(Hdf5Sink::create(&path, OpenMode::Append).unwrap());
    table.bind(&sink).unwrap();
    let err = table.prolog().unwrap_err();
    match err {
        TableError::Sink(inner) => {
            let h5 = inner.downcast_ref::<Hdf5Error>().expect("an HDF5 error");
            assert!(matches!(h5, Hdf5Error::TypeMismatch { .. }), "got {h5:?}");
        }
        other => panic!("expected a sink error, got {other:?}"),
    }
}

#[test]
fn computed_time_series_values() {
    let dir = tmp();
    let path = dir.path().join("series.h5");

    #[derive(H5Type, Clone, Debug, PartialEq)]
    #[repr(C)]
    struct Rec {
        time: f64,
    }

    let counter = Rc::new(Cell::new(0u64));
    let src = Rc::clone(&counter);
    let table = Table::time_series("h5_series", "%g", move || {
        let v = src.get();
        src.set(v + 1);
        v as f64
    })
    .unwrap();

    {
        let sink = SinkHandle::new(Hdf5Sink::create(&path, OpenMode::Truncate).unwrap());
        table.bind(&sink).unwrap();
        table.prolog().unwrap();
        for _ in 0..10 {
            table.emit_row().unwrap();
        }
        table.epilog().unwrap();
    }

    let file = hdf5::File::open(&path).unwrap();
    let records = file.dataset("h5_series").unwrap().read_raw::<Rec>().unwrap();
    let times: Vec<f64> = records.iter().map(|r| r.time).collect();
    assert_eq!(times, (0..10).map(f64::from).collect::<Vec<_>>());
}

#[test]
fn sink_in_subgroup() {
    let dir = tmp();
    let path = dir.path().join("grouped.h5");

    let table = Table::results("h5_grouped").unwrap();
    table.add(&Column::new::<i32>("x", "%d").unwrap()).unwrap();

    {
        let file = hdf5::File::create(&path).unwrap();
        let group = file.create_group("runs").unwrap();
        let sink = SinkHandle::new(Hdf5Sink::in_group(group, OpenMode::Truncate));
        table.bind(&sink).unwrap();
        table.prolog().unwrap();
        table.emit_row().unwrap();
        table.epilog().unwrap();
    }

    let file = hdf5::File::open(&path).unwrap();
    let ds = file.group("runs").unwrap().dataset("h5_grouped").unwrap();
    assert_eq!(ds.shape(), vec![1]);
}
