//! Initialize command.

use console::style;

use crate::config::Settings;

/// Write the default config file.
pub fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let path = settings.config_path();
    if path.exists() {
        println!(
            "{} Config already exists at {}",
            style("!").yellow(),
            path.display()
        );
        return Ok(());
    }

    let written = settings.write_config()?;
    println!(
        "{} Wrote default config to {}",
        style("✓").green(),
        written.display()
    );
    println!(
        "  {} Set DATAPULSE_API_BASE or edit api_base to point at your backend",
        style("→").dim()
    );
    Ok(())
}
