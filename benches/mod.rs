use criterion::{criterion_group, criterion_main};

mod network;
mod queue;

criterion_group!(
    benches,
    queue::bench_enqueue_dequeue,
    queue::bench_submit_full,
    network::http::bench_parse_header_block,
    network::http::bench_transport_round_trip
);
criterion_main!(benches);
