use anyhow::Context;
use carrier_deposit::{build_record, DepositClient, DepositConfig};
use std::path::Path;

pub fn run(config_path: &Path, publish: bool) -> anyhow::Result<()> {
    let cfg = DepositConfig::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let client = DepositClient::new(&cfg.archive_url, &cfg.access_token, &cfg.user_agent)?;
    let record = build_record(&cfg);

    let draft = client
        .create_draft(&record)
        .context("failed to create draft record")?;
    println!("Created draft: {}", draft.id);
    println!("Files to upload: {}", cfg.files.len());

    for file in &cfg.files {
        client
            .upload_file(&draft.files_url, file)
            .with_context(|| format!("failed to upload {}", file.display()))?;
        println!("[OK] {}", file.display());
    }

    if publish {
        let record_id = client
            .publish_draft(&draft.id)
            .context("failed to publish draft")?;
        println!("Published: {}/records/{}", client.base_url(), record_id);
    } else {
        println!(
            "Draft ready for review: {}/uploads/{}",
            client.base_url(),
            draft.id
        );
        println!("Run with --publish to publish automatically");
    }
    Ok(())
}
