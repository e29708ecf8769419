//! Performance benchmarks for vcf-normalize
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use vcf_normalize::vcf::{read_vcf_from, write_vcf_to};
use vcf_normalize::{NormalizeConfig, Pipeline};

const HEADER: &str = "##fileformat=VCFv4.1\n##source=starling\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA12878\n";

/// Synthetic gVCF-like body: a mix of passing, filtered and reference-only rows
fn synthetic_vcf(records: usize) -> String {
    let mut text = String::with_capacity(HEADER.len() + records * 120);
    text.push_str(HEADER);
    for i in 0..records {
        let (alt, filter) = match i % 4 {
            0 => ("G", "PASS"),
            1 => ("T", "LowGQX"),
            2 => (".", "PASS"),
            _ => ("C", "HighDPFRatio"),
        };
        text.push_str(&format!(
            "chr1\t{}\t.\tA\t{}\t50\t{}\tSNVHPOL=4;AF1000G=0.{:06};phyloP=0.241\tGT:GQ:GQX:DP:DPF:AD\t0/1:30:30:{}:0:5,{}\n",
            10_000 + i,
            alt,
            filter,
            i % 1_000_000,
            i % 90 + 10,
            i % 40
        ));
    }
    text
}

/// Benchmark parsing only
fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_vcf");
    for size in [1_000usize, 10_000, 100_000] {
        let text = synthetic_vcf(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| {
                let doc = read_vcf_from(Cursor::new(black_box(text.as_str()))).unwrap();
                black_box(doc)
            })
        });
    }
    group.finish();
}

/// Benchmark the four stages on a parsed document
fn bench_pipeline(c: &mut Criterion) {
    let pipeline = Pipeline::new(NormalizeConfig::default()).unwrap();
    let mut group = c.benchmark_group("pipeline");
    for size in [1_000usize, 10_000, 100_000] {
        let doc = read_vcf_from(Cursor::new(synthetic_vcf(size))).unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| {
                let result = pipeline.run(black_box(doc.clone())).unwrap();
                black_box(result)
            })
        });
    }
    group.finish();
}

/// Benchmark read + normalize + write into memory
fn bench_end_to_end(c: &mut Criterion) {
    let pipeline = Pipeline::new(NormalizeConfig::default()).unwrap();
    let text = synthetic_vcf(10_000);

    c.bench_function("end_to_end_10k", |b| {
        b.iter(|| {
            let doc = read_vcf_from(Cursor::new(black_box(text.as_str()))).unwrap();
            let (doc, _) = pipeline.run(doc).unwrap();
            let mut out = Vec::with_capacity(text.len());
            write_vcf_to(&doc, &mut out).unwrap();
            black_box(out)
        })
    });
}

criterion_group!(benches, bench_read, bench_pipeline, bench_end_to_end);
criterion_main!(benches);
