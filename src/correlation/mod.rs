//! Correlation Context
//!
//! Every edge request gets a fresh 64-bit id. It travels as RPC metadata
//! (`correlation_id`), is recovered by the core interceptor, and is threaded
//! explicitly through [`CallContext`] down to the audit row insert.
//!
//! ```text
//! edge: IdGenerator::next_id ──▶ X-Correlation-ID header
//!                            └─▶ metadata "correlation_id"
//! core: interceptor ──▶ Request extension ──▶ CallContext ──▶ transfers.correlation_id
//! ```

pub mod idgen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::Instant;
use tonic::metadata::{Ascii, MetadataMap, MetadataValue};

use crate::error::LedgerResult;

pub use idgen::{IdGenerator, SnowflakeGenerator};

/// RPC metadata key carrying the id from edge to core
pub const CORRELATION_METADATA_KEY: &str = "correlation_id";

/// HTTP response header echoing the id back to the caller
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Process-unique trace id. Zero and negative values mean "untraced".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(i64);

impl CorrelationId {
    pub fn new(raw: i64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid correlation id: {:?}", s))?;
        CorrelationId::new(raw).ok_or_else(|| format!("correlation id must be positive: {}", raw))
    }
}

/// Write the id into outgoing RPC metadata
pub fn attach_to_metadata(metadata: &mut MetadataMap, id: CorrelationId) {
    if let Ok(value) = id.to_string().parse::<MetadataValue<Ascii>>() {
        metadata.insert(CORRELATION_METADATA_KEY, value);
    }
}

/// Recover the id from incoming RPC metadata. Malformed values are ignored.
pub fn from_metadata(metadata: &MetadataMap) -> Option<CorrelationId> {
    metadata
        .get(CORRELATION_METADATA_KEY)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

/// Per-call context threaded through every store and cache operation.
///
/// Copied by value, never shared: one context lives for one edge → core call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallContext {
    correlation_id: Option<CorrelationId>,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new(correlation_id: Option<CorrelationId>) -> Self {
        Self {
            correlation_id,
            deadline: None,
        }
    }

    /// Untraced context without a deadline (startup jobs, tests)
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.correlation_id
    }

    /// Value persisted in `transfers.correlation_id` (0 when untraced)
    pub fn correlation_value(&self) -> i64 {
        self.correlation_id.map(|c| c.get()).unwrap_or(0)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Run `fut` under this context's deadline.
    ///
    /// On expiry the future is dropped, which rolls back any transaction it
    /// holds, and `SystemError("deadline exceeded")` is returned.
    pub async fn run<T, F>(&self, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = LedgerResult<T>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut).await?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;

    #[test]
    fn test_correlation_id_rejects_non_positive() {
        assert!(CorrelationId::new(0).is_none());
        assert!(CorrelationId::new(-3).is_none());
        assert_eq!(CorrelationId::new(42).map(|c| c.get()), Some(42));
    }

    #[test]
    fn test_parse() {
        assert_eq!("12345".parse::<CorrelationId>().unwrap().get(), 12345);
        assert!("abc".parse::<CorrelationId>().is_err());
        assert!("0".parse::<CorrelationId>().is_err());
    }

    #[test]
    fn test_metadata_roundtrip() {
        let mut md = MetadataMap::new();
        let id = CorrelationId::new(1_234_567_890_123).unwrap();
        attach_to_metadata(&mut md, id);
        assert_eq!(
            md.get(CORRELATION_METADATA_KEY).unwrap().to_str().unwrap(),
            "1234567890123"
        );
        assert_eq!(from_metadata(&md), Some(id));
    }

    #[test]
    fn test_malformed_metadata_is_untraced() {
        let mut md = MetadataMap::new();
        md.insert(CORRELATION_METADATA_KEY, MetadataValue::from_static("not-a-number"));
        assert_eq!(from_metadata(&md), None);
        assert_eq!(from_metadata(&MetadataMap::new()), None);
    }

    #[test]
    fn test_context_correlation_value() {
        assert_eq!(CallContext::background().correlation_value(), 0);
        let ctx = CallContext::new(CorrelationId::new(9));
        assert_eq!(ctx.correlation_value(), 9);
    }

    #[tokio::test]
    async fn test_run_without_deadline() {
        let ctx = CallContext::background();
        let out = ctx.run(async { Ok::<_, LedgerError>(7) }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_run_deadline_exceeded() {
        let ctx = CallContext::background().with_timeout(Duration::from_millis(10));
        let out: LedgerResult<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;
        assert_eq!(out, Err(LedgerError::system("deadline exceeded")));
    }
}
