//! Event command handlers.

use anyhow::Result;
use evento_core::forms::NewEventForm;
use evento_core::search::filter_events;
use evento_core::types::EventsPayload;

use crate::cli::Client;
use crate::cli::output::{Output, event_line, print_events};

pub async fn list(client: &Client, out: &Output, filter: Option<&str>) -> Result<()> {
    let result = client.get_events().await.map(|payload| match filter {
        Some(query) => EventsPayload {
            events: filter_events(&payload.events, query)
                .into_iter()
                .cloned()
                .collect(),
        },
        None => payload,
    });

    out.emit(result, |payload| print_events(&payload.events))
}

pub async fn show(client: &Client, out: &Output, id: u64) -> Result<()> {
    out.emit(client.get_event(id).await, |payload| {
        let event = &payload.event;
        println!("{}", event_line(event));
        if let Some(description) = event.description.as_deref() {
            println!();
            println!("{description}");
        }
        if let Some(image) = event.image.as_deref() {
            println!();
            println!("Image: {image}");
        }
    })
}

pub async fn mine(client: &Client, out: &Output) -> Result<()> {
    out.emit(client.get_user_events().await, |payload| {
        print_events(&payload.events);
    })
}

pub async fn attendees(client: &Client, out: &Output, id: u64) -> Result<()> {
    out.emit(client.get_attendees(id).await, |payload| {
        if payload.attendees.is_empty() {
            println!("Nobody is attending yet.");
        }
        for user in &payload.attendees {
            println!("{}", user.display_name());
        }
    })
}

pub async fn attend(client: &Client, out: &Output, id: u64, is_attending: bool) -> Result<()> {
    out.emit(client.update_is_attending(id, is_attending).await, |_| {
        if is_attending {
            println!("You are attending event #{id}.");
        } else {
            println!("You left event #{id}.");
        }
    })
}

pub async fn create(client: &Client, out: &Output, form: &NewEventForm) -> Result<()> {
    out.emit_form(form.submit(client).await, |payload| {
        println!("Created {}", event_line(&payload.event));
    })
}
