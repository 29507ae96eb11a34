use criterion::{BatchSize, Criterion, Throughput};
use libiot_postqueue::config::Config;
use libiot_postqueue::network::error::Error;
use libiot_postqueue::queue::{BoundedQueue, RequestRecord};
use libiot_postqueue::transport::{PostRequest, Reply, Transport};
use libiot_postqueue::worker::PostWorker;
use std::time::Duration;

const BODY: &str = r#"{"sensor":"t1","value":22.4,"ts":1718000000}"#;

pub fn bench_enqueue_dequeue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");
    group.throughput(Throughput::Elements(10));
    group.bench_function("enqueue_dequeue_10", |b| {
        let queue = BoundedQueue::with_capacity(10).unwrap();
        b.iter(|| {
            for _ in 0..10 {
                queue
                    .try_enqueue(RequestRecord::new("http://h/ingest", BODY, false, None))
                    .unwrap();
            }
            while queue.try_dequeue(Duration::ZERO).is_some() {}
        })
    });
    group.finish();
}

/// Never answers, so the worker stays parked on its first record.
struct Stalled;

impl Transport for Stalled {
    fn post(&mut self, _request: &PostRequest<'_>) -> Result<Reply, Error> {
        std::thread::sleep(Duration::from_millis(50));
        Ok(Reply::new(200, b""))
    }
}

pub fn bench_submit_full(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit");
    group.bench_function("rejected_when_full", |b| {
        b.iter_batched_ref(
            || {
                let worker = PostWorker::with_config(
                    Stalled,
                    Config {
                        queue_capacity: 1,
                        ..Config::default()
                    },
                );
                worker.start();
                while !worker.is_full() {
                    worker.submit("http://h/ingest", BODY, false, None);
                }
                worker
            },
            |worker| worker.submit("http://h/ingest", BODY, false, None),
            BatchSize::PerIteration,
        )
    });
    group.finish();
}
