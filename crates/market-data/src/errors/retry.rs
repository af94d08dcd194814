/// Classification for retry policy.
///
/// Used to determine how the coordinator should respond to errors raised
/// while fetching a symbol.
///
/// # Behavior Summary
///
/// | Class | Retried? | Surfaces To Caller? |
/// |-------|----------|---------------------|
/// | `Never` | No | Yes, aborts the batch call |
/// | `WithBackoff` | Yes, up to the retry budget | No, becomes the quote's `error` field |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - malformed caller input or a terminal failure.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Retry with exponential backoff.
    ///
    /// Used for upstream failures: timeouts, non-success statuses,
    /// transport errors and undecodable payloads. After the retry budget
    /// is exhausted the failure is recorded on the per-symbol quote
    /// instead of failing the batch.
    WithBackoff,
}
