//! Integration tests for the facade crate.

use crate::{open_sink, Column, GroupOps, Table, TableError};

mod url_tests {
    use super::*;
    use crate::url::parse_url;

    #[test]
    fn parse_full_url() {
        let parsed = parse_url("file:/tmp/out.csv?open_mode=append,format=csvtab").unwrap();
        assert_eq!(parsed.scheme, "file");
        assert_eq!(parsed.path, "/tmp/out.csv");
        assert_eq!(
            parsed.params,
            vec![
                ("open_mode".to_string(), "append".to_string()),
                ("format".to_string(), "csvtab".to_string()),
            ]
        );
    }

    #[test]
    fn parse_minimal_urls() {
        let parsed = parse_url("stdout:").unwrap();
        assert_eq!(parsed.scheme, "stdout");
        assert_eq!(parsed.path, "");
        assert!(parsed.params.is_empty());

        let parsed = parse_url("hdf5:results.h5").unwrap();
        assert_eq!(parsed.scheme, "hdf5");
        assert_eq!(parsed.path, "results.h5");
    }

    #[test]
    fn malformed_urls_rejected() {
        for url in ["", "nocolon", "9bad:x", "file:x?keynovalue", "file:x?=v"] {
            assert!(
                matches!(parse_url(url), Err(TableError::MalformedUrl(_))),
                "{url} should be malformed"
            );
        }
    }

    #[test]
    fn unknown_sink_type_rejected() {
        assert!(matches!(
            open_sink("carrier:pigeon"),
            Err(TableError::UnknownSinkType(_))
        ));
    }

    #[test]
    fn unknown_enum_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("file:{}?open_mode=sideways", dir.path().join("x.csv").display());
        assert!(matches!(
            open_sink(&url),
            Err(TableError::BadUrlValue { key: "open_mode", .. })
        ));

        let url = format!("file:{}?format=tsv", dir.path().join("x.csv").display());
        assert!(matches!(
            open_sink(&url),
            Err(TableError::BadUrlValue { key: "format", .. })
        ));
    }

    #[test]
    fn unrecognized_keys_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "file:{}?format=csvtab,shiny=yes",
            dir.path().join("x.csv").display()
        );
        open_sink(&url).unwrap();
    }

    #[test]
    fn stdout_is_process_global() {
        let a = open_sink("stdout:").unwrap();
        let b = open_sink("stdout:").unwrap();
        assert!(a.same(&b));
        let e = open_sink("stderr:").unwrap();
        assert!(!a.same(&e));
    }
}

mod factory_tests {
    use super::*;

    #[test]
    fn file_sink_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");

        let table = Table::results("facade_file_sink").unwrap();
        let x = Column::new::<i32>("x", "%d").unwrap();
        let y = Column::new::<f64>("y", "%.1f").unwrap();
        table.add_all(&[&x, &y]).unwrap();

        {
            let sink = open_sink(&format!("file:{}?format=csvtab", path.display())).unwrap();
            table.bind(&sink).unwrap();
            table.prolog().unwrap();
            x.set(1.0).unwrap();
            y.set(2.5).unwrap();
            table.emit_row().unwrap();
            table.epilog().unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x,y\n1,2.5\n");
    }

    #[test]
    fn default_format_is_csvrel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rel.csv");

        let table = Table::results("facade_default_format").unwrap();
        table.add(&Column::new::<i32>("x", "%d").unwrap()).unwrap();

        {
            let sink = open_sink(&format!("file:{}", path.display())).unwrap();
            table.bind(&sink).unwrap();
            table.prolog().unwrap();
            table.emit_row().unwrap();
            table.epilog().unwrap();
        }

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "facade_default_format,0\n"
        );
    }

    #[cfg(feature = "hdf5")]
    #[test]
    fn hdf5_sink_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.h5");

        let table = Table::results("facade_hdf5_sink").unwrap();
        table.add(&Column::new::<i64>("n", "%ld").unwrap()).unwrap();

        {
            let sink = open_sink(&format!("hdf5:{}", path.display())).unwrap();
            table.bind(&sink).unwrap();
            table.prolog().unwrap();
            table.emit_row().unwrap();
            table.emit_row().unwrap();
            table.epilog().unwrap();
        }

        let file = hdf5::File::open(&path).unwrap();
        assert_eq!(file.dataset("facade_hdf5_sink").unwrap().shape(), vec![2]);
    }
}

mod progress_tests {
    use crate::ProgressBar;

    #[test]
    fn fills_to_width_and_terminates_line() {
        let mut out = Vec::new();
        {
            let mut bar = ProgressBar::new(&mut out, 10, "work: ");
            bar.start(100).unwrap();
            for _ in 0..100 {
                bar.tick(1).unwrap();
            }
            bar.finish().unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("work: ["));
        assert_eq!(text.matches('#').count(), 10);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn complete_is_absolute() {
        let mut out = Vec::new();
        {
            let mut bar = ProgressBar::new(&mut out, 4, "");
            bar.start(8).unwrap();
            bar.complete(8).unwrap();
        }
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('#').count(), 4);
    }

    #[test]
    fn zero_total_finishes_immediately() {
        let mut out = Vec::new();
        {
            let mut bar = ProgressBar::new(&mut out, 4, "");
            bar.start(0).unwrap();
            bar.tick(3).unwrap(); // ignored once finished
        }
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('#').count(), 4);
        assert!(text.ends_with('\n'));
    }
}

mod schema_tests {
    use super::*;

    #[test]
    fn schema_survives_the_facade() {
        let table = Table::results("facade_schema").unwrap();
        let grp = crate::Group::new_in(&table, "stats").unwrap();
        grp.add(&Column::new::<f64>("mean", "%g").unwrap()).unwrap();

        let schema = table.generate_schema();
        assert_eq!(schema["columns"][0]["name"], "stats/mean");
        assert_eq!(schema["columns"][0]["path"][0], "stats");
    }
}
