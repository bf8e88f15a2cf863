//! Integration tests for tables-text.

use tables_core::{Column, GroupOps, OpenMode, SinkHandle, Table};

use crate::{TextFormat, TextSink};

fn xy_table(name: &str) -> (Table, Column, Column) {
    let table = Table::results(name).unwrap();
    let x = Column::new::<i32>("x", "%d").unwrap();
    let y = Column::new::<i32>("y", "%d").unwrap();
    table.add_all(&[&x, &y]).unwrap();
    (table, x, y)
}

mod csvtab_tests {
    use super::*;

    #[test]
    fn header_once_then_rows() {
        let (table, x, y) = xy_table("text_header_once");
        let (sink, buffer) = TextSink::memory(TextFormat::CsvTab);
        let sink = SinkHandle::new(sink);
        table.bind(&sink).unwrap();

        table.prolog().unwrap();
        for (vx, vy) in [(1, 2), (3, 4), (5, 6)] {
            x.set(vx as f64).unwrap();
            y.set(vy as f64).unwrap();
            table.emit_row().unwrap();
        }
        table.epilog().unwrap();

        assert_eq!(buffer.text(), "x,y\n1,2\n3,4\n5,6\n");
    }

    #[test]
    fn header_uses_leaf_names_not_paths() {
        let table = Table::results("text_leaf_names").unwrap();
        let grp = tables_core::Group::new_in(&table, "grp").unwrap();
        grp.add(&Column::new::<i32>("inner", "%d").unwrap()).unwrap();

        let (sink, buffer) = TextSink::memory(TextFormat::CsvTab);
        let sink = SinkHandle::new(sink);
        table.bind(&sink).unwrap();
        table.prolog().unwrap();
        table.epilog().unwrap();

        assert_eq!(buffer.text(), "inner\n");
    }

    #[test]
    fn second_session_appends_without_header() {
        let (table, x, y) = xy_table("text_second_session");
        let (sink, buffer) = TextSink::memory(TextFormat::CsvTab);
        let sink = SinkHandle::new(sink);
        table.bind(&sink).unwrap();

        table.prolog().unwrap();
        x.set(1.0).unwrap();
        y.set(2.0).unwrap();
        table.emit_row().unwrap();
        table.epilog().unwrap();

        table.prolog().unwrap();
        x.set(3.0).unwrap();
        y.set(4.0).unwrap();
        table.emit_row().unwrap();
        table.epilog().unwrap();

        assert_eq!(buffer.text(), "x,y\n1,2\n3,4\n");
    }

    #[test]
    fn file_sink_truncate_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");

        {
            let (table, x, y) = xy_table("text_file_truncate");
            let sink = SinkHandle::new(
                TextSink::create(&path, OpenMode::Truncate, TextFormat::CsvTab).unwrap(),
            );
            table.bind(&sink).unwrap();
            table.prolog().unwrap();
            x.set(1.0).unwrap();
            y.set(2.0).unwrap();
            table.emit_row().unwrap();
            table.epilog().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x,y\n1,2\n");

        // Appending to a non-empty seekable file emits no second header.
        {
            let (table, x, y) = xy_table("text_file_append");
            let sink = SinkHandle::new(
                TextSink::create(&path, OpenMode::Append, TextFormat::CsvTab).unwrap(),
            );
            table.bind(&sink).unwrap();
            table.prolog().unwrap();
            x.set(3.0).unwrap();
            y.set(4.0).unwrap();
            table.emit_row().unwrap();
            table.epilog().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x,y\n1,2\n3,4\n");
    }

    #[test]
    fn formats_respect_column_format_strings() {
        let table = Table::results("text_formats").unwrap();
        let z = Column::new::<f64>("zeta", "%.3f").unwrap();
        let s = Column::string("tag", 15, "%s").unwrap();
        table.add_all(&[&z, &s]).unwrap();

        let (sink, buffer) = TextSink::memory(TextFormat::CsvTab);
        let sink = SinkHandle::new(sink);
        table.bind(&sink).unwrap();

        table.prolog().unwrap();
        z.set(2.5).unwrap();
        s.set_str("warm").unwrap();
        table.emit_row().unwrap();
        table.epilog().unwrap();

        assert_eq!(buffer.text(), "zeta,tag\n2.500,warm\n");
    }
}

mod csvrel_tests {
    use super::*;

    #[test]
    fn rows_prefixed_with_table_name() {
        let (table, x, y) = xy_table("text_rel_prefix");
        let (sink, buffer) = TextSink::memory(TextFormat::CsvRel);
        let sink = SinkHandle::new(sink);
        table.bind(&sink).unwrap();

        table.prolog().unwrap();
        x.set(7.0).unwrap();
        y.set(8.0).unwrap();
        table.emit_row().unwrap();
        table.epilog().unwrap();

        assert_eq!(buffer.text(), "text_rel_prefix,7,8\n");
    }

    #[test]
    fn two_tables_share_one_stream() {
        let (t1, a, _) = xy_table("text_rel_t1");
        let t2 = Table::results("text_rel_t2").unwrap();
        let b = Column::new::<i32>("b", "%d").unwrap();
        t2.add(&b).unwrap();

        let (sink, buffer) = TextSink::memory(TextFormat::CsvRel);
        let sink = SinkHandle::new(sink);
        t1.bind(&sink).unwrap();
        t2.bind(&sink).unwrap();

        t1.prolog().unwrap();
        t2.prolog().unwrap();
        a.set(1.0).unwrap();
        t1.emit_row().unwrap();
        b.set(2.0).unwrap();
        t2.emit_row().unwrap();
        t1.epilog().unwrap();
        t2.epilog().unwrap();

        assert_eq!(buffer.text(), "text_rel_t1,1,0\ntext_rel_t2,2\n");
    }
}

mod session_tests {
    use super::*;
    use tables_core::{Sink, TableError};

    #[test]
    fn row_without_session_fails() {
        let (table, _, _) = xy_table("text_no_session");
        let (mut sink, _) = TextSink::memory(TextFormat::CsvTab);
        // Driving the sink directly, outside a prolog, must fail.
        assert!(matches!(
            sink.output_row(&table),
            Err(TableError::Sink(_))
        ));
    }

    #[test]
    fn epilog_closes_the_session() {
        let (table, _, _) = xy_table("text_epilog_closes");
        let (mut sink, _) = TextSink::memory(TextFormat::CsvRel);
        sink.output_prolog(&table).unwrap();
        sink.output_row(&table).unwrap();
        sink.output_epilog(&table).unwrap();
        assert!(matches!(
            sink.output_row(&table),
            Err(TableError::Sink(_))
        ));
    }
}
