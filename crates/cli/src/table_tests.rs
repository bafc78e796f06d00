// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::color::codes;

fn render_to_string(table: &Table) -> String {
    let mut buf = Vec::new();
    table.render(&mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn empty_table_prints_nothing() {
    let table = Table::new(vec![Column::left("SOURCE"), Column::left("TARGET")], false);
    assert!(table.is_empty());
    assert_eq!(render_to_string(&table), "");
}

#[test]
fn multi_column_left_alignment() {
    let mut table = Table::new(vec![Column::left("SOURCE"), Column::left("TARGET")], false);
    table.row(vec!["id3".into(), "id5".into()]);
    table.row(vec!["release-2024".into(), "id9".into()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 3);
    // Header: "SOURCE" padded to 12 (width of "release-2024"), last col unpadded
    assert_eq!(lines[0], "SOURCE        TARGET");
    assert_eq!(lines[1], "id3           id5");
    assert_eq!(lines[2], "release-2024  id9");
}

#[test]
fn right_alignment() {
    let mut table = Table::new(vec![Column::right("POSITION"), Column::left("TARGET")], false);
    table.row(vec!["0".into(), "id2".into()]);
    table.row(vec!["10".into(), "id1".into()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines[0], "POSITION  TARGET");
    assert_eq!(lines[1], "       0  id2");
    assert_eq!(lines[2], "      10  id1");
}

#[test]
fn missing_cells_render_empty() {
    let mut table = Table::new(vec![Column::left("A"), Column::right("B")], false);
    table.row(vec!["x".into()]);
    let out = render_to_string(&table);
    assert_eq!(out.lines().nth(1), Some("x   "));
}

#[test]
fn color_applied_after_padding() {
    let mut table = Table::new(vec![Column::left("ID"), Column::muted("CREATED")], true);
    table.row(vec!["abc".into(), "2026-01-01".into()]);
    let out = render_to_string(&table);
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(
        lines[0],
        format!(
            "{}ID {}  {}CREATED{}",
            codes::HEADER_START,
            codes::RESET,
            codes::HEADER_START,
            codes::RESET
        )
    );
    assert_eq!(
        lines[1],
        format!("abc  {}2026-01-01{}", codes::MUTED_START, codes::RESET)
    );
}
