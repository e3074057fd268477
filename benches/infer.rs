use std::io::Write;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use datawagon::config::InferenceSettings;
use datawagon::inference::SchemaInferer;
use datawagon::storage::MemoryBlobStore;
use flate2::{Compression, write::GzEncoder};

fn generate_report(rows: usize) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    writeln!(
        encoder,
        "Asset ID,Partner Revenue,Views,Is Claimed,Report Date,Updated At"
    )
    .expect("header");
    for i in 0..rows {
        let day = (i % 28) + 1;
        let hour = i % 24;
        writeln!(
            encoder,
            "A{i:06},{i}.{:02},{},{},2024-01-{day:02},2024-01-{day:02} {hour:02}:15:00",
            i % 100,
            i * 7,
            i % 2 == 0
        )
        .expect("row");
    }
    encoder.finish().expect("finish gzip")
}

fn bench_infer(c: &mut Criterion) {
    let store = MemoryBlobStore::new().with_object("reports/2024-01.csv.gz", generate_report(5_000));
    let mut group = c.benchmark_group("infer");

    for sample_size in [100usize, 1_000] {
        let settings = InferenceSettings {
            sample_size,
            ..InferenceSettings::default()
        };
        let inferer = SchemaInferer::new(&store, settings).expect("valid settings");
        group.bench_function(format!("sample_{sample_size}"), |b| {
            b.iter_batched(
                || (),
                |_| {
                    inferer.infer("reports").expect("schema inferred");
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_infer);
criterion_main!(benches);
