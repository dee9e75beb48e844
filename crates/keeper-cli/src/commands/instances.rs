use keeper_cloud::list_all;
use keeper_core::instance::summarize;

use super::{compute_client, load_config};

pub async fn instances(page_size: u32, summary: bool) -> anyhow::Result<()> {
    if page_size == 0 {
        anyhow::bail!("--page-size must be greater than zero");
    }
    let config = load_config()?;
    let client = compute_client(&config)?;

    let instances = list_all(&client, page_size).await?;

    if summary {
        let summaries = summarize(&instances, chrono::Utc::now());
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("{:<24} {:<12} NAME", "ID", "STATUS");
    for instance in &instances {
        println!(
            "{:<24} {:<12} {}",
            instance.id,
            instance.status(),
            instance.display_name()
        );
    }
    println!("\n{} instance(s) in folder {}", instances.len(), client.folder_id());
    Ok(())
}
