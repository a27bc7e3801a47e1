// src/utils/log.rs

//! Presentation helpers for pipeline progress output.
//!
//! Everything goes through the `log` facade at `info` level, so output
//! formatting and filtering stay with whatever logger the binary installs.

/// Width of banner and separator lines
const RULE_WIDTH: usize = 60;

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {}/{}] {}", step_num, total, message);
}

/// Log a separator line
pub fn separator() {
    log::info!("{}", "─".repeat(RULE_WIDTH));
}

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(RULE_WIDTH);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {}", message);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
    separator();
}

/// Format a percentage with one decimal place.
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}
