//! Category listing.

use anyhow::Result;

use crate::cli::Client;
use crate::cli::output::Output;

pub async fn list(client: &Client, out: &Output) -> Result<()> {
    out.emit(client.get_categories().await, |payload| {
        if payload.categories.is_empty() {
            println!("No categories found.");
        }
        for category in &payload.categories {
            println!("#{:<4} {}", category.id, category.name);
        }
    })
}
