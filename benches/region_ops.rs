use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mapped_region::{Advice, MappedRegion, PageSize, SyncMode};
use memmap2::MmapOptions;
use std::fs::OpenOptions;
use std::hint::black_box;
use tempfile::tempdir;

/// 测试参数
const REGION_SIZE: usize = 64 * 1024 * 1024; // 64MB
const RANGE_SIZES: [usize; 3] = [4 * 1024, 1024 * 1024, 16 * 1024 * 1024];

fn bench_region_ops(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench_region.bin");
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .unwrap();
    file.set_len(REGION_SIZE as u64).unwrap();

    // 从非页对齐的偏移映射，使每个请求都需要扩展
    let offset = 100;
    let region = MappedRegion::from_mmap_raw(
        MmapOptions::new()
            .offset(offset)
            .len(REGION_SIZE - PageSize::system().get())
            .map_raw(&file)
            .unwrap(),
    );

    let mut group = c.benchmark_group("region_ops");

    for size in RANGE_SIZES {
        let mut resident = vec![0u8; region.pages_touched(0, size)];

        group.bench_with_input(BenchmarkId::new("incore", size), &size, |b, &size| {
            b.iter(|| region.incore(black_box(0), black_box(size), &mut resident).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("advise", size), &size, |b, &size| {
            b.iter(|| region.advise(black_box(0), black_box(size), Advice::WillNeed));
        });

        group.bench_with_input(BenchmarkId::new("sync_async", size), &size, |b, &size| {
            b.iter(|| region.sync(black_box(0), black_box(size), SyncMode::ASYNC));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_region_ops);
criterion_main!(benches);
