//! Structured log events for key operations.

/// Log a tile write.
pub fn tile_written(tile_id: &str, version: u64, bytes: usize) {
    tracing::info!(
        event = "tile_written",
        tile_id = %tile_id,
        version = version,
        bytes = bytes,
        "tile written"
    );
}

/// Log a container flush or compaction.
pub fn container_rewritten(path: &str, tile_count: usize, reclaimed_bytes: u64) {
    tracing::info!(
        event = "container_rewritten",
        path = %path,
        tile_count = tile_count,
        reclaimed_bytes = reclaimed_bytes,
        "container rewritten"
    );
}

/// Log replay of appended bodies at open.
pub fn tail_replayed(path: &str, frames: usize, truncated_bytes: u64) {
    tracing::info!(
        event = "tail_replayed",
        path = %path,
        frames = frames,
        truncated_bytes = truncated_bytes,
        "appended tail replayed"
    );
}

/// Log a mark change.
pub fn mark_advanced(tile_id: &str, from: &str, to: &str) {
    tracing::info!(
        event = "mark_advanced",
        tile_id = %tile_id,
        from = %from,
        to = %to,
        "verification mark advanced"
    );
}

/// Log a degraded judge path (lane downgrade, exhausted attempts).
pub fn judge_degraded(request_id: &str, reason: &str) {
    tracing::warn!(
        event = "judge_degraded",
        request_id = %request_id,
        reason = %reason,
        "judge degraded"
    );
}

/// Log the terminal state of a judge request.
pub fn judge_finished(request_id: &str, verdict: &str, attempts: u32, confidence: f64) {
    tracing::info!(
        event = "judge_finished",
        request_id = %request_id,
        verdict = %verdict,
        attempts = attempts,
        confidence = confidence,
        "judge request finished"
    );
}
