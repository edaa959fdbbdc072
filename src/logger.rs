//! Terminal logging of routed requests with configurable verbosity.
//!
//! Supports three verbosity levels:
//! - Minimal: One-liner nginx-style
//! - Compact: Two lines, request and outcome
//! - Verbose: Full block including every provider attempt

use crate::config::LogVerbosity;
use crate::error::GatewayError;
use crate::router::{AttemptRecord, Completion};
use std::io::Write;

const SEPARATOR: &str = "────────────────────────────────────────";

/// One routed request, as seen by the HTTP layer.
pub struct RouteLog<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub model: &'a str,
    pub total_ms: u64,
    pub outcome: Result<&'a Completion, &'a GatewayError>,
}

impl RouteLog<'_> {
    fn status(&self) -> u16 {
        match self.outcome {
            Ok(_) => 200,
            Err(e) => e.status_code().as_u16(),
        }
    }
}

/// Format duration in human-readable form.
fn format_duration(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

fn failed_count(attempts: &[AttemptRecord]) -> usize {
    attempts.iter().filter(|a| !a.succeeded()).count()
}

/// Format a routed request for terminal output.
pub fn format_route(log: &RouteLog<'_>, verbosity: &LogVerbosity) -> String {
    match verbosity {
        LogVerbosity::Minimal => format_minimal(log),
        LogVerbosity::Compact => format_compact(log),
        LogVerbosity::Verbose => format_verbose(log),
    }
}

fn format_minimal(log: &RouteLog<'_>) -> String {
    let via = match log.outcome {
        Ok(c) => format!(" via {} ({} attempts)", c.provider, c.attempts.len()),
        Err(_) => String::new(),
    };

    format!(
        "{} {} {} {} {}{}",
        log.method,
        log.path,
        log.status(),
        format_duration(log.total_ms),
        log.model,
        via
    )
}

fn format_compact(log: &RouteLog<'_>) -> String {
    let request_line = format!("→ {} {} [{}]", log.method, log.path, log.model);
    let duration = format_duration(log.total_ms);

    let response_line = match log.outcome {
        Ok(c) => {
            let failed = failed_count(&c.attempts);
            let fallback = if failed > 0 {
                format!(" after {} failed", failed)
            } else {
                String::new()
            };
            let tokens = c
                .usage
                .map(|u| format!(", {} tokens", u.total_tokens))
                .unwrap_or_default();
            format!(
                "← {} OK ({}, via {}{}{})",
                log.status(),
                duration,
                c.provider,
                fallback,
                tokens
            )
        }
        Err(e) => format!("← {} ERROR ({}): {}", log.status(), duration, e),
    };

    format!("{}\n{}", request_line, response_line)
}

fn format_verbose(log: &RouteLog<'_>) -> String {
    let status = log.status();
    let status_text = if (200..300).contains(&status) { "OK" } else { "ERROR" };

    let mut out = format!(
        "{SEPARATOR}\n\
         {method} {path}\n\
         Model: {model}\n\
         Status: {status} {status_text}\n\
         Timing: {duration} total",
        method = log.method,
        path = log.path,
        model = log.model,
        duration = format_duration(log.total_ms),
    );

    match log.outcome {
        Ok(c) => {
            out.push_str(&format!("\nProvider: {}", c.provider));
            if let Some(reason) = &c.finish_reason {
                out.push_str(&format!("\nFinish: {}", reason));
            }
            if let Some(u) = c.usage {
                out.push_str(&format!(
                    "\nTokens: {} prompt, {} completion",
                    u.prompt_tokens, u.completion_tokens
                ));
            }
            out.push_str("\nAttempts:");
            for (i, attempt) in c.attempts.iter().enumerate() {
                let result = attempt.error.as_deref().unwrap_or("ok");
                out.push_str(&format!(
                    "\n  {}. {} {} {}",
                    i + 1,
                    attempt.provider,
                    format_duration(attempt.elapsed_ms),
                    result
                ));
            }
        }
        Err(e) => out.push_str(&format!("\nError: {}", e)),
    }

    out.push('\n');
    out.push_str(SEPARATOR);
    out
}

/// Log a routed request to the given writer.
pub fn log_route<W: Write>(
    writer: &mut W,
    log: &RouteLog<'_>,
    verbosity: &LogVerbosity,
) -> std::io::Result<()> {
    writeln!(writer, "{}", format_route(log, verbosity))
}
