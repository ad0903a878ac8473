//! `chatify seed-user`: stand-in for the external account service.

use anyhow::Result;
use console::style;

use chatify_core::repository::UserRepository;
use chatify_types::error::RepositoryError;
use chatify_types::user::NewUser;

use crate::state::AppState;

pub async fn seed_user(state: &AppState, user: NewUser, json: bool) -> Result<()> {
    let created = match state.store.create_user(&user).await {
        Ok(created) => created,
        Err(RepositoryError::Conflict(msg)) => {
            anyhow::bail!("{msg}");
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&created)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Created user {} ({} {})",
        style("✓").green(),
        style(created.full_name()).bold(),
        created.country_code,
        created.contact_no
    );
    println!("  {}", style(format!("id: {}", created.id)).dim());
    println!();
    Ok(())
}
