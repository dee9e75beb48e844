use std::path::Path;

use super::env_url_secret;

pub async fn doctor() -> anyhow::Result<()> {
    let report = keeper_cloud::doctor(Path::new("."), env_url_secret()).await;

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed, see above for details");
    }

    Ok(())
}
