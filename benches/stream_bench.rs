use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::{criterion_group, criterion_main};
use recstream::{StreamReader, StreamWriter};
use tempfile::TempDir;

const RECORDS: u64 = 1 << 16;

/// Sweeps the buffer byte budget over a full sequential pass; larger
/// budgets trade resident memory for fewer file operations per record.
fn forward_scan(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scan.bin");
    let mut writer = StreamWriter::create(&path).unwrap();
    for x in 0..RECORDS {
        writer.write(x).unwrap();
    }
    writer.finish().unwrap();

    let mut group = c.benchmark_group("forward_scan");
    for budget in [1usize << 10, 1 << 14, 1 << 18].iter() {
        group.throughput(Throughput::Bytes(RECORDS * 8));
        group.bench_with_input(BenchmarkId::from_parameter(budget), budget, |b, &budget| {
            b.iter(|| {
                let mut reader = StreamReader::<u64>::with_buffer_bytes(&path, budget).unwrap();
                let mut sum = 0u64;
                while !reader.is_empty().unwrap() {
                    sum = sum.wrapping_add(reader.read().unwrap());
                }
                sum
            });
        });
    }
    group.finish();
}

fn reverse_scan(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reverse.bin");
    let mut writer = StreamWriter::create(&path).unwrap();
    for x in 0..RECORDS {
        writer.write(x).unwrap();
    }
    writer.finish().unwrap();

    let mut group = c.benchmark_group("reverse_scan");
    for budget in [1usize << 10, 1 << 14, 1 << 18].iter() {
        group.throughput(Throughput::Bytes(RECORDS * 8));
        group.bench_with_input(BenchmarkId::from_parameter(budget), budget, |b, &budget| {
            b.iter(|| {
                let mut reader = StreamReader::<u64>::with_buffer_bytes(&path, budget).unwrap();
                reader.seek_to_end(RECORDS).unwrap();
                let mut sum = 0u64;
                while !reader.is_empty_reverse().unwrap() {
                    sum = sum.wrapping_add(reader.read_reverse(false).unwrap());
                }
                sum
            });
        });
    }
    group.finish();
}

criterion_group!(benches, forward_scan, reverse_scan);
criterion_main!(benches);
