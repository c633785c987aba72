//! Rendering of result envelopes.

use std::fmt;

use anyhow::Result;
use evento_core::forms::{FieldErrors, FormError};
use evento_core::types::{ApiError, ApiResult, Envelope, Event, NOT_LOGGED_IN_MESSAGE};
use serde::Serialize;

/// Marker error for failures that were already printed.
///
/// `main` exits non-zero without printing it again.
#[derive(Debug)]
pub struct ReportedError;

impl fmt::Display for ReportedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request failed")
    }
}

impl std::error::Error for ReportedError {}

/// Output mode selected on the command line.
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Prints a call result: the envelope in JSON mode, otherwise `human` on
    /// success and the banner on failure.
    pub fn emit<T: Serialize>(&self, result: ApiResult<T>, human: impl FnOnce(&T)) -> Result<()> {
        self.emit_with_fields(result.map_err(|e| (e, FieldErrors::default())), human)
    }

    /// Like [`Output::emit`], also printing per-field messages of a form.
    pub fn emit_form<T: Serialize>(
        &self,
        result: Result<T, FormError>,
        human: impl FnOnce(&T),
    ) -> Result<()> {
        self.emit_with_fields(result.map_err(|e| (e.error, e.fields)), human)
    }

    fn emit_with_fields<T: Serialize>(
        &self,
        result: Result<T, (ApiError, FieldErrors)>,
        human: impl FnOnce(&T),
    ) -> Result<()> {
        if self.json {
            let envelope = Envelope::from(result.map_err(|(error, _)| error));
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            return if envelope.success() {
                Ok(())
            } else {
                Err(ReportedError.into())
            };
        }

        match result {
            Ok(payload) => {
                human(&payload);
                Ok(())
            }
            Err((error, fields)) => {
                print_error(&error, &fields);
                Err(ReportedError.into())
            }
        }
    }
}

fn print_error(error: &ApiError, fields: &FieldErrors) {
    eprintln!("Error: {}", error.message);
    for (field, message) in fields.iter() {
        eprintln!("  {field}: {message}");
    }
    if error.is_auth() && error.message == NOT_LOGGED_IN_MESSAGE {
        eprintln!("Run `evento signin` first.");
    }
}

/// One-line summary of an event.
pub fn event_line(event: &Event) -> String {
    let time = event.time.as_deref().unwrap_or("Unspecified time");
    let mut line = format!("#{:<4} {}  ({time}", event.id, event.title);
    if let Some(location) = event.location.as_deref() {
        line.push_str(" @ ");
        line.push_str(location);
    }
    line.push(')');
    if let Some(count) = event.attendee_count {
        line.push_str(&format!("  [{count} attending]"));
    }
    line
}

pub fn print_events<'a>(events: impl IntoIterator<Item = &'a Event>) {
    let mut any = false;
    for event in events {
        any = true;
        println!("{}", event_line(event));
    }
    if !any {
        println!("No events found.");
    }
}
