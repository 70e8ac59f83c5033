use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

use ingen_compiler::loader::GoPathLoader;
use ingen_compiler::{generate_with, GenerateOptions, GenerateReport};

const HEADER: &str = "// Code generated by ingen. DO NOT EDIT.\n\npackage shapes\n";

fn method(name: &str) -> String {
    format!(
        "\nfunc (v {name}) In(list ...{name}) bool {{\n\tfor _, l := range list {{\n\t\tif v == l {{\n\t\t\treturn true\n\t\t}}\n\t}}\n\treturn false\n}}\n"
    )
}

fn run(files: &[(&str, &str)]) -> (tempfile::TempDir, GenerateReport) {
    let tmp = tempfile::tempdir().unwrap();
    for (name, text) in files {
        fs::write(tmp.path().join(name), text).unwrap();
    }
    let report = generate_in(tmp.path());
    (tmp, report)
}

fn generate_in(dir: &Path) -> GenerateReport {
    let options = GenerateOptions::new(dir.display().to_string());
    generate_with(&options, &GoPathLoader::new(Vec::new())).unwrap()
}

fn written(dir: &Path) -> String {
    fs::read_to_string(dir.join("type_helpers.go")).unwrap()
}

#[test]
fn fixed_size_array_of_numbers_is_emitted() {
    let (tmp, _) = run(&[("grid.go", "package shapes\n\ntype Grid [9]float64\n")]);
    assert_eq!(written(tmp.path()), format!("{HEADER}{}", method("Grid")));
}

#[test]
fn struct_of_numbers_and_strings_is_emitted() {
    let (tmp, _) = run(&[(
        "point.go",
        "package shapes\n\ntype Point struct {\n\tX, Y int\n\tLabel string\n}\n",
    )]);
    assert_eq!(written(tmp.path()), format!("{HEADER}{}", method("Point")));
}

#[test]
fn struct_with_slice_field_is_not_emitted() {
    let (tmp, report) = run(&[(
        "poly.go",
        "package shapes\n\ntype Polygon struct {\n\tName   string\n\tPoints []int\n}\n",
    )]);
    assert_eq!(written(tmp.path()), HEADER);
    assert_eq!(report.collection.skipped[0].name, "Polygon");
}

#[test]
fn named_type_over_comparable_struct_is_emitted() {
    let (tmp, _) = run(&[(
        "named.go",
        "package shapes\n\ntype Point struct {\n\tX, Y int\n}\n\ntype Origin Point\n",
    )]);
    assert_eq!(
        written(tmp.path()),
        format!("{HEADER}{}{}", method("Point"), method("Origin"))
    );
}

#[test]
fn package_without_comparable_types_gets_header_only() {
    let (tmp, report) = run(&[(
        "none.go",
        "package shapes\n\ntype Names []string\ntype Index map[string]int\n\nfunc helper() {}\n",
    )]);
    assert!(report.written);
    assert!(report.collection.types.is_empty());
    assert_eq!(written(tmp.path()), HEADER);
}

#[test]
fn declaration_order_is_preserved_across_files() {
    let (tmp, report) = run(&[
        ("b.go", "package shapes\n\ntype Zed int\ntype Alpha string\n"),
        ("a.go", "package shapes\n\ntype Middle bool\n"),
    ]);
    let names: Vec<_> = report.collection.names();
    assert_eq!(names, ["Middle", "Zed", "Alpha"]);
    assert_eq!(
        written(tmp.path()),
        format!("{HEADER}{}{}{}", method("Middle"), method("Zed"), method("Alpha"))
    );
}

#[test]
fn generator_scripts_and_bom_files_do_not_break_the_package() {
    let (tmp, report) = run(&[
        (
            "gen.go",
            "//go:build ignore\n\npackage main\n\nfunc main() {}\n",
        ),
        ("id.go", "\u{feff}package shapes\n\ntype ID int\n"),
    ]);
    assert_eq!(report.package, "shapes");
    assert_eq!(written(tmp.path()), format!("{HEADER}{}", method("ID")));
}

#[test]
fn regeneration_is_byte_identical() {
    let (tmp, first) = run(&[(
        "mix.go",
        "package shapes\n\ntype ID int\ntype Tags []string\ntype Pair[K comparable, V any] struct {\n\tKey K\n\tValue V\n}\n",
    )]);
    let second = generate_in(tmp.path());
    assert_eq!(first.text, second.text);
    assert_eq!(written(tmp.path()), second.text);
    assert!(second
        .text
        .contains("func (v Pair[K, V]) In(list ...Pair[K, V]) bool {"));
}

#[test]
fn realistic_package() {
    let (tmp, report) = run(&[(
        "model.go",
        r#"package shapes

import (
	"sync"
	"time"
)

// Status of an order.
type Status int

const (
	Pending Status = iota
	Shipped
)

type Money struct {
	Amount   int64
	Currency [3]byte
}

type Order struct {
	ID      string `json:"id"`
	Status  Status
	Total   Money
	Placed  time.Time
	Lines   []Line
}

type Line struct {
	SKU string
	Qty int
}

type Cache struct {
	mu   sync.Mutex
	data map[string]*Order
}

type Handle = *Order

func (o *Order) Add(l Line) {
	o.Lines = append(o.Lines, l)
}
"#,
    )]);
    assert_eq!(report.collection.names(), ["Status", "Money", "Line"]);
    let skipped: Vec<_> = report
        .collection
        .skipped
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(skipped, ["Order", "Cache", "Handle"]);
    assert!(written(tmp.path()).ends_with(&method("Line")));
}
