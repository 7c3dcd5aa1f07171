//! Export counters on the `metrics` facade.

/// Exports started, labeled by origin.
pub const EXPORTS_STARTED: &str = "pandora_exports_started_total";

/// Exports that ended in an error, labeled by origin and error code.
pub const EXPORTS_FAILED: &str = "pandora_exports_failed_total";

/// Archive entries (or document pages) written, labeled by origin.
pub const ENTRIES_WRITTEN: &str = "pandora_export_entries_total";

/// Register metric descriptions with the installed recorder, if any.
pub fn describe_metrics() {
    ::metrics::describe_counter!(EXPORTS_STARTED, "Export requests that began streaming");
    ::metrics::describe_counter!(EXPORTS_FAILED, "Export requests that ended in an error");
    ::metrics::describe_counter!(ENTRIES_WRITTEN, "Archive entries or document pages written");
}

/// Count one export start.
pub fn record_export_started(origin: &'static str) {
    ::metrics::counter!(EXPORTS_STARTED, "origin" => origin).increment(1);
}

/// Count one export failure.
pub fn record_export_failed(origin: &'static str, code: &'static str) {
    ::metrics::counter!(EXPORTS_FAILED, "origin" => origin, "code" => code).increment(1);
}

/// Count entries written by a finished or aborted export.
pub fn record_entries_written(origin: &'static str, entries: u64) {
    ::metrics::counter!(ENTRIES_WRITTEN, "origin" => origin).increment(entries);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorders_are_optional() {
        // With no recorder installed these must be no-ops, not panics.
        describe_metrics();
        record_export_started("local");
        record_export_failed("remote", "REMOTE_UNAVAILABLE");
        record_entries_written("generated", 3);
    }
}
