//! `chatify init-db`

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Report where the (now migrated) database lives.
pub fn init_db(state: &AppState, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({
            "database_url": state.database_url,
            "data_dir": state.data_dir.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Database ready at {}",
        style("✓").green(),
        style(&state.database_url).cyan()
    );
    println!();
    Ok(())
}
