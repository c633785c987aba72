//! Event listing filter.

use evento_types::Event;

/// Keeps events whose title, description or location contains `query`,
/// ignoring case. A blank query keeps everything; order is preserved.
pub fn filter_events<'a>(events: &'a [Event], query: &str) -> Vec<&'a Event> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return events.iter().collect();
    }

    events.iter().filter(|e| event_matches(e, &needle)).collect()
}

fn event_matches(event: &Event, needle: &str) -> bool {
    [
        Some(event.title.as_str()),
        event.description.as_deref(),
        event.location.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|text| text.to_lowercase().contains(needle))
}
