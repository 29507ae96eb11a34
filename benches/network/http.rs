use criterion::{Criterion, Throughput};
use libiot_postqueue::network::application::http::client::Header;
use libiot_postqueue::network::application::http::headers;
use libiot_postqueue::network::error::Error;
use libiot_postqueue::network::{Close, Connection, Dial, Dialer, Read, Write};
use libiot_postqueue::transport::{HttpTransport, PostRequest, Transport};
use std::hint::black_box;
use std::time::Duration;

const BLOCK: &str = "X-Device-Id: 0042\nX-Fw: 1.3.0\nAuthorization: Bearer abcdef0123456789\n\
                     X-Trace: 7f3a9c\nmalformed-line\nX-Region: eu-west";

pub fn bench_parse_header_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("headers");
    group.throughput(Throughput::Bytes(BLOCK.len() as u64));
    group.bench_function("parse_block", |b| {
        b.iter(|| headers::parse_block(black_box(BLOCK)))
    });
    group.finish();
}

const RESPONSE: &[u8] = b"HTTP/1.1 201 Created\r\nContent-Type: application/json\r\n\
                          Content-Length: 16\r\n\r\n{\"stored\":true}\n";

struct Canned {
    read_pos: usize,
}

impl Read for Canned {
    type Error = Error;
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(RESPONSE.len() - self.read_pos);
        buf[..n].copy_from_slice(&RESPONSE[self.read_pos..self.read_pos + n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl Write for Canned {
    type Error = Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for Canned {
    type Error = Error;
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for Canned {}

struct CannedDialer;

impl Dialer for CannedDialer {
    type Connection = Canned;
    fn dial(&mut self, _dial: &Dial<'_>) -> Result<Self::Connection, Error> {
        Ok(Canned { read_pos: 0 })
    }
}

pub fn bench_transport_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("transport");
    let body = r#"{"sensor":"t1","value":22.4}"#;
    group.throughput(Throughput::Bytes(body.len() as u64));

    let mut headers = headers::parse_block("X-Device-Id: 0042\nX-Fw: 1.3.0");
    headers
        .insert(0, Header::new("Content-Type", "application/json").unwrap())
        .unwrap();
    let mut transport = HttpTransport::new(CannedDialer);

    group.bench_function("post_canned_reply", |b| {
        b.iter(|| {
            let reply = transport
                .post(&PostRequest {
                    target: "http://gateway.local:8080/api/readings",
                    body,
                    headers: &headers,
                    secure: false,
                    verify_tls: true,
                    timeout: Duration::from_secs(5),
                    max_redirects: 0,
                })
                .expect("canned post failed");
            black_box(reply.status)
        })
    });
    group.finish();
}
