use crate::network::application::http::client::{Header, Headers};
use crate::network::application::http::headers;
use crate::queue::RequestRecord;
use crate::transport::{PostRequest, Reply, Transport};

use super::policy::ExecutionPolicy;

/// Result of executing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Status in `[200, 300)`.
    pub success: bool,
    /// HTTP status, or a negative transport code.
    pub code: i32,
    /// Present whenever the server answered, whatever the status.
    pub reply: Option<Reply>,
}

impl Outcome {
    /// The reply body as text, `""` for transport failures.
    pub fn body_text(&self) -> &str {
        self.reply.as_ref().map_or("", Reply::body_text)
    }
}

/// Builds the header list for a record: `Content-Type: application/json` first,
/// then the record's own block.
pub fn request_headers(record: &RequestRecord) -> Headers {
    let mut out = Headers::new();
    if let Some(content_type) = Header::new("Content-Type", "application/json") {
        let _ = out.push(content_type);
    }
    if let Some(block) = record.headers() {
        headers::append_block(block, &mut out);
    }
    out
}

/// Runs one record through the transport under `policy`.
pub fn execute<T: Transport + ?Sized>(
    transport: &mut T,
    record: &RequestRecord,
    policy: &ExecutionPolicy,
) -> Outcome {
    let headers = request_headers(record);
    let request = PostRequest {
        target: record.target(),
        body: record.body(),
        headers: &headers,
        secure: record.use_tls(),
        verify_tls: policy.verify_tls,
        timeout: policy.timeout,
        max_redirects: policy.max_redirects,
    };

    match transport.post(&request) {
        Ok(reply) => Outcome {
            success: reply.is_success(),
            code: i32::from(reply.status),
            reply: Some(reply),
        },
        Err(e) => {
            warn!("post to {} failed: {:?}", record.target(), e);
            Outcome {
                success: false,
                code: e.code(),
                reply: None,
            }
        }
    }
}
