//! Benchmark for extraction and changelog performance.

use std::fs;
use std::path::Path;

use apiaudit_core::reflect::python::syntax;
use apiaudit_core::{build_change_log, extract, ExtractOptions, PythonSourceReflector};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

const MODULE_SOURCE: &str = r#"
import os
from typing import Optional

MAX_SIZE = 100
DEFAULTS = {"color": "red", "sizes": [1, 2, 3]}

class WidgetError(ValueError):
    pass

class Base(object):
    kind = "base"

    def __init__(self, name, *args, **kwargs):
        self.name = name

    def describe(self, verbose=False):
        return self.name

class Widget(Base):
    """A widget."""

    def resize(self, width, height=None, *, keep_ratio=True):
        pass

    @property
    def area(self):
        return 0

    @classmethod
    def from_dict(cls, data):
        return cls(**data)

def make_widget(name, size=10):
    return Widget(name)
"#;

fn write_package(root: &Path, modules: usize) {
    let package = root.join("bench_pkg");
    fs::create_dir_all(&package).unwrap();
    let mut init = String::from("__all__ = []\n");
    for idx in 0..modules {
        fs::write(package.join(format!("mod_{}.py", idx)), MODULE_SOURCE).unwrap();
        init.push_str(&format!("from .mod_{} import Widget as Widget{}\n", idx, idx));
    }
    fs::write(package.join("__init__.py"), init).unwrap();
}

fn bench_parse_module(c: &mut Criterion) {
    c.bench_function("parse_python_module", |b| {
        b.iter(|| black_box(syntax::parse(black_box(MODULE_SOURCE)).unwrap()))
    });
}

fn bench_extract_package(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    write_package(dir.path(), 50);
    let options = ExtractOptions::default();

    c.bench_function("extract_package_50_modules", |b| {
        b.iter(|| {
            let reflector = PythonSourceReflector::new(vec![dir.path().to_path_buf()]);
            black_box(extract::extract_package(&reflector, "bench_pkg", &options).unwrap())
        })
    });
}

fn bench_changelog(c: &mut Criterion) {
    let old_dir = TempDir::new().unwrap();
    let new_dir = TempDir::new().unwrap();
    write_package(old_dir.path(), 50);
    write_package(new_dir.path(), 50);
    fs::write(
        new_dir.path().join("bench_pkg").join("mod_7.py"),
        MODULE_SOURCE.replace("height=None", "height"),
    )
    .unwrap();

    let options = ExtractOptions::default();
    let extract_value = |root: &Path| {
        let reflector = PythonSourceReflector::new(vec![root.to_path_buf()]);
        let report = extract::extract_package(&reflector, "bench_pkg", &options).unwrap();
        serde_json::to_value(report).unwrap()
    };
    let old = extract_value(old_dir.path());
    let new = extract_value(new_dir.path());

    c.bench_function("changelog_50_modules", |b| {
        b.iter(|| black_box(build_change_log(&old, &new).unwrap()))
    });
}

criterion_group!(benches, bench_parse_module, bench_extract_package, bench_changelog);
criterion_main!(benches);
