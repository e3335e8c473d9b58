//! Report formatting. The core hands over plain data; layout lives here.

use anyhow::Result;
use fanfetch_core::RunReport;
use serde_json::json;

pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("results ***********************\n");
    out.push_str(&format!(
        "elapsed time {:.3}s\n",
        report.elapsed.as_secs_f64()
    ));
    out.push_str("*****status code count*****\n");
    for (key, count) in report.histogram.iter() {
        out.push_str(&format!("response code {} = {}\n", key, count));
    }
    for fault in &report.faults {
        let batch = fault
            .batch
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "worker {} {} faulted: {}\n",
            fault.worker, batch, fault.message
        ));
    }
    out.push_str("*************************\n");
    out
}

pub fn render_json(report: &RunReport) -> Result<String> {
    let faults: Vec<_> = report
        .faults
        .iter()
        .map(|f| {
            json!({
                "worker": f.worker,
                "batch": f.batch.map(|b| b.to_string()),
                "message": f.message,
            })
        })
        .collect();
    let value = json!({
        "elapsed_secs": report.elapsed.as_secs_f64(),
        "backend": report.backend,
        "batches": report.batches,
        "workers_started": report.workers_started,
        "total": report.histogram.total(),
        "failures": report.histogram.failures(),
        "histogram": report.histogram,
        "faults": faults,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Mirrors the report into the log file.
pub fn log(report: &RunReport) {
    tracing::info!("elapsed time {:?}", report.elapsed);
    for (key, count) in report.histogram.iter() {
        tracing::info!("response code {} = {}", key, count);
    }
}
