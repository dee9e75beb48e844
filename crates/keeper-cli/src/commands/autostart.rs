use keeper_cloud::auto_start_stopped;

use super::{compute_client, load_config};

pub async fn auto_start() -> anyhow::Result<()> {
    let config = load_config()?;
    let client = compute_client(&config)?;

    let report = auto_start_stopped(&client, config.autostart.page_size).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(error) = report.error {
        anyhow::bail!("auto-start check failed: {error}");
    }
    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} of {} stopped instance(s) failed to start",
            report.failed.len(),
            report.total_stopped
        );
    }
    Ok(())
}
