use criterion::{BatchSize, Criterion, Throughput};
use libw5500::network::application::mqtt::packet::{decode_publish, split_frame};
use libw5500::network::application::mqtt::{
    PacketIdAllocator, QoS, encode_connect, encode_publish_with,
};
use std::hint::black_box;

const TOPIC: &str = "libw5500/bench-topic";

pub fn bench_connect(c: &mut Criterion) {
    let mut group = c.benchmark_group("connect");
    let mut buf = [0u8; 256];
    group.bench_function("encode_connect", |b| {
        b.iter(|| {
            encode_connect(
                &mut buf,
                black_box("libw5500-bench"),
                black_box("user"),
                black_box("secret"),
            )
            .expect("Failed to encode")
        })
    });
    group.finish();
}

pub fn bench_publish_qos0(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_qos0");
    let ids = PacketIdAllocator::new();
    let payload = b"hello from publish";
    let mut buf = [0u8; 256];
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("publish_qos0", |b| {
        b.iter(|| {
            encode_publish_with(&ids, &mut buf, TOPIC, black_box(payload), false, QoS::AtMostOnce, false)
                .expect("Failed to encode")
        })
    });
    group.finish();
}

pub fn bench_publish_qos1(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_qos1");
    let ids = PacketIdAllocator::new();
    let payload = [0x5Au8; 1024];
    let mut buf = [0u8; 1100];
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("publish_qos1_1k", |b| {
        b.iter(|| {
            encode_publish_with(&ids, &mut buf, TOPIC, black_box(&payload), false, QoS::AtLeastOnce, false)
                .expect("Failed to encode")
        })
    });
    group.finish();
}

pub fn bench_split_inbound(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound");
    let ids = PacketIdAllocator::new();
    let mut stream = Vec::new();
    let mut buf = [0u8; 128];
    for _ in 0..50 {
        let len = encode_publish_with(&ids, &mut buf, TOPIC, b"23.5", false, QoS::AtMostOnce, false)
            .expect("Failed to encode");
        stream.extend_from_slice(&buf[..len]);
    }
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("split_and_decode_50", |b| {
        b.iter_batched_ref(
            || stream.clone(),
            |bytes| {
                let mut rest = &bytes[..];
                let mut count = 0;
                while let Ok((header, body, used)) = split_frame(rest) {
                    let publish = decode_publish(header, body).expect("Failed to decode");
                    count += publish.payload.len();
                    rest = &rest[used..];
                }
                count
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}
