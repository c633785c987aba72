//! Account and session command handlers.

use anyhow::Result;
use evento_core::forms::RegistrationForm;
use evento_core::session::SessionStore;
use evento_core::types::{Empty, SigninPayload, User};

use crate::cli::Client;
use crate::cli::output::Output;

pub async fn register(client: &Client, out: &Output, form: &RegistrationForm) -> Result<()> {
    out.emit_form(form.submit(client).await, |payload| {
        println!("Registered and signed in as {}.", signed_in_name(payload));
    })
}

pub async fn signin(client: &Client, out: &Output, email: &str, password: &str) -> Result<()> {
    out.emit(client.signin(email, password).await, |payload| {
        println!("Signed in as {}.", signed_in_name(payload));
    })
}

pub fn signout(client: &Client, out: &Output) -> Result<()> {
    client.session().reset()?;
    out.emit(Ok(Empty {}), |_| println!("Signed out."))
}

pub async fn status(client: &Client, out: &Output) -> Result<()> {
    let result = client.get_authentication_status().await;
    let user = client.session().user();

    out.emit(result, |status| match user {
        Some(user) if status.is_authenticated => {
            println!("Signed in as {}.", user.display_name());
        }
        _ => println!("Not signed in."),
    })
}

fn signed_in_name(payload: &SigninPayload) -> String {
    payload
        .user_info()
        .as_ref()
        .map_or_else(|| "unknown user".to_string(), User::display_name)
}
