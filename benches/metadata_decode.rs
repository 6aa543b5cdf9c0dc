use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kafka_lag::protocol::messages::{
    MetadataPool, MetadataResponse, MetadataResponseBroker, MetadataResponsePartition,
    MetadataResponseTopic,
};
use kafka_lag::protocol::traits::{ReadType, WriteType};

/// Encoded metadata of a cluster with `topics` topics of 12 partitions on 6 brokers.
fn metadata(topics: usize) -> Vec<u8> {
    let brokers = (0..6)
        .map(|node_id| MetadataResponseBroker {
            node_id,
            host: format!("broker-{node_id}.kafka.svc.cluster.local"),
            port: 9092,
        })
        .collect();
    let topics = (0..topics)
        .map(|t| MetadataResponseTopic {
            error: None,
            name: format!("events.topic-{t:05}"),
            partitions: (0..12)
                .map(|p| MetadataResponsePartition {
                    error: None,
                    partition_index: p,
                    leader_id: p % 6,
                    replica_nodes: vec![p % 6, (p + 1) % 6, (p + 2) % 6],
                    isr_nodes: vec![p % 6, (p + 1) % 6],
                })
                .collect(),
        })
        .collect();

    let mut buf = vec![];
    MetadataResponse { brokers, topics }
        .write(&mut buf)
        .unwrap();
    buf
}

fn metadata_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("metadata_decode");

    for topics in [100, 2_000] {
        let data = metadata(topics);
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_with_input(BenchmarkId::new("fresh", topics), &data, |b, data| {
            b.iter(|| {
                let mut reader = Cursor::new(data.as_slice());
                black_box(MetadataResponse::read(&mut reader, data.len()).unwrap())
            })
        });

        let pool = MetadataPool::new(topics);
        group.bench_with_input(BenchmarkId::new("pooled", topics), &data, |b, data| {
            b.iter(|| {
                let mut reader = Cursor::new(data.as_slice());
                let (response, _) =
                    MetadataResponse::read_pooled(&mut reader, data.len(), &pool).unwrap();
                black_box(&response);
                response.free(&pool);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, metadata_decode);
criterion_main!(benches);
