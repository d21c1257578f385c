use crate::{
    AggregateSummary, BenchError, LatencyStats, MeasurementRecord, Result, TokenStats, TtftStats,
    TrialMetrics,
};

/// Reduce a non-empty set of records into an [`AggregateSummary`].
///
/// Latency, TTFT and token means cover successful records only. Response length
/// and success rate cover every record, with failures contributing a length of
/// zero. Tokens-per-second is averaged over the records that define it.
pub fn summarize(records: &[MeasurementRecord]) -> Result<AggregateSummary> {
    let first = records.first().ok_or(BenchError::NoResults)?;
    let total = records.len() as f64;

    let successful: Vec<&TrialMetrics> = records.iter().filter_map(|r| r.metrics()).collect();

    let mut latencies: Vec<f64> = successful.iter().map(|m| m.latency_ms).collect();
    sort_ascending(&mut latencies);

    let mut ttfts: Vec<f64> = successful.iter().filter_map(|m| m.ttft_ms).collect();
    sort_ascending(&mut ttfts);

    let tps: Vec<f64> = successful.iter().filter_map(|m| m.tokens_per_second).collect();

    let latency_mean = mean(&latencies);
    let latency = LatencyStats {
        min: latencies.first().copied().unwrap_or(0.0),
        max: latencies.last().copied().unwrap_or(0.0),
        mean: latency_mean,
        median: median(&latencies),
        p95: percentile(&latencies, 95.0),
        std_dev: std_dev(&latencies, latency_mean),
    };

    let ttft = match ttfts.is_empty() {
        true => None,
        false => Some(TtftStats {
            min: ttfts[0],
            max: ttfts[ttfts.len() - 1],
            mean: mean(&ttfts),
            median: median(&ttfts),
        }),
    };

    let token_mean = |f: fn(&TrialMetrics) -> Option<u32>| -> f64 {
        let values: Vec<f64> = successful
            .iter()
            .map(|m| f(m).unwrap_or(0) as f64)
            .collect();
        mean(&values)
    };

    let tokens = TokenStats {
        avg_prompt: token_mean(|m| m.prompt_tokens),
        avg_completion: token_mean(|m| m.completion_tokens),
        avg_total: token_mean(|m| m.total_tokens),
        avg_tokens_per_second: mean(&tps),
    };

    let length_sum: usize = records.iter().map(|r| r.response_length()).sum();

    Ok(AggregateSummary {
        provider: first.provider.clone(),
        model: first.model.clone(),
        iterations: records.len() as u32,
        latency,
        ttft,
        tokens,
        avg_response_length: length_sum as f64 / total,
        success_rate: successful.len() as f64 / total,
    })
}

fn sort_ascending(values: &mut [f64]) {
    values.sort_by(|a, b| a.total_cmp(b));
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    match values.is_empty() {
        true => 0.0,
        false => values.iter().sum::<f64>() / values.len() as f64,
    }
}

/// Median of an ascending slice, 0.0 when empty.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Nearest-rank percentile of an ascending slice, 0.0 when empty.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as isize - 1;
    let idx = rank.clamp(0, sorted.len() as isize - 1) as usize;
    sorted[idx]
}

/// Population standard deviation around `mean`.
pub fn std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
