use std::io::{Cursor, Write};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sheetsource::{SheetSource, TranslationMap};
use zip::write::SimpleFileOptions;

/// Build an in-memory container with `rows` indirected translation rows.
fn build_container(rows: usize) -> Vec<u8> {
    let mut sst = String::from("<sst>");
    let mut sheet = String::from("<worksheet><sheetData>");
    for i in 0..rows {
        let base = i * 3;
        sst.push_str(&format!(
            "<si><t>en</t></si><si><t>phrase_{}</t></si><si><t>translation_{}</t></si>",
            i, i
        ));
        sheet.push_str(&format!(
            "<row r=\"{r}\"><c r=\"A{r}\" t=\"s\"><v>{}</v></c><c r=\"B{r}\" t=\"s\"><v>{}</v></c><c r=\"C{r}\" t=\"s\"><v>{}</v></c></row>",
            base,
            base + 1,
            base + 2,
            r = i + 1
        ));
    }
    sst.push_str("</sst>");
    sheet.push_str("</sheetData></worksheet>");

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("xl/sharedStrings.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(sst.as_bytes()).unwrap();
    writer
        .start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(sheet.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

fn benchmark_translation_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_translations");
    group.sample_size(10); // Reduce samples for large benchmarks

    for size in [100, 1000, 10000].iter() {
        let bytes = build_container(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut source = SheetSource::from_bytes(&bytes).unwrap();
                let mut map = TranslationMap::new();
                source.export_translations(&mut map).unwrap();
                black_box(map.len())
            });
        });
    }

    group.finish();
}

fn benchmark_delimited_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_delimited");
    group.sample_size(10);

    for size in [100, 1000, 10000].iter() {
        let bytes = build_container(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut source = SheetSource::from_bytes(&bytes).unwrap();
                let mut out = Vec::new();
                source.export_delimited(&mut out, ",", "\n").unwrap();
                black_box(out.len())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_translation_export,
    benchmark_delimited_export
);
criterion_main!(benches);
