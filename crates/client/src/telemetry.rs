//! Counter shorthands for the `metrics` feature.

use gatelink_metrics::{counter, labels};

pub(crate) fn record_outcome(metric: &'static str, outcome: &'static str) {
    counter!(metric, labels::OUTCOME => outcome).increment(1);
}

pub(crate) fn record(metric: &'static str) {
    counter!(metric).increment(1);
}
