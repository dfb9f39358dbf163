//! Metrics and observability utilities
//!
//! Prometheus metrics with standardized naming for the answer pipeline.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all Kochi metrics
pub const METRICS_PREFIX: &str = "kochi";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_answers_total", METRICS_PREFIX),
        Unit::Count,
        "Total answer requests handled"
    );

    describe_histogram!(
        format!("{}_answer_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end answer latency in seconds"
    );

    describe_counter!(
        format!("{}_guardrail_triggers_total", METRICS_PREFIX),
        Unit::Count,
        "Queries short-circuited by the hallucination guardrail"
    );

    describe_counter!(
        format!("{}_grounding_retries_total", METRICS_PREFIX),
        Unit::Count,
        "Wider-context retries after a failed grounding critique"
    );

    describe_counter!(
        format!("{}_llm_invocations_total", METRICS_PREFIX),
        Unit::Count,
        "Language model invocations by stage"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retrieval fusion latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Record a completed answer request
pub fn record_answer(duration_secs: f64, mode: &str, intent: &str) {
    counter!(
        format!("{}_answers_total", METRICS_PREFIX),
        "mode" => mode.to_string(),
        "intent" => intent.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_answer_duration_seconds", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .record(duration_secs);
}

/// Record a guardrail short-circuit
pub fn record_guardrail_trigger(term: &str) {
    counter!(
        format!("{}_guardrail_triggers_total", METRICS_PREFIX),
        "term" => term.to_string()
    )
    .increment(1);
}

/// Record a wider-context retry
pub fn record_grounding_retry(mode: &str) {
    counter!(
        format!("{}_grounding_retries_total", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .increment(1);
}

/// Record one model invocation
pub fn record_llm_invocation(stage: &str) {
    counter!(
        format!("{}_llm_invocations_total", METRICS_PREFIX),
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Record retrieval latency
pub fn record_retrieval(duration_secs: f64, result_count: usize) {
    histogram!(format!("{}_retrieval_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    tracing::debug!(
        duration_secs,
        result_count,
        "Retrieval fusion completed"
    );
}
