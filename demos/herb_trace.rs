//! Farm-to-consumer walkthrough over a file-backed ledger

use herb_ledger::utils::FileStore;
use herb_ledger::{HerbRegistry, HerbStatus, LabVerification, LedgerConfig, NewHerb};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };

    let store = FileStore::open(&config.storage.data_dir)?;
    let mut registry = HerbRegistry::open(store, config).await?;
    println!("🌿 Herb Ledger - Traceability Example\n");

    // 1. Farmers register their harvests
    println!("🧑‍🌾 Registering harvests...");
    let (ashwagandha, receipt) = registry
        .submit_herb(
            NewHerb::new("Ashwagandha", "Nagaur, Rajasthan", "FARMER-7")
                .with_description("Sun-dried roots, second harvest"),
        )
        .await?;
    println!(
        "  ✓ {} sealed in block {} ({})",
        ashwagandha.batch_id, receipt.index, receipt.hash
    );

    let (tulsi, receipt) = registry
        .submit_herb(NewHerb::new("Tulsi", "Varanasi, Uttar Pradesh", "FARMER-12"))
        .await?;
    println!(
        "  ✓ {} sealed in block {} ({})",
        tulsi.batch_id, receipt.index, receipt.hash
    );
    println!();

    // 2. Labs record their verdicts
    println!("🧪 Recording lab results...");
    for (batch_id, status) in [
        (&ashwagandha.batch_id, HerbStatus::Verified),
        (&tulsi.batch_id, HerbStatus::Rejected),
    ] {
        let verdict = LabVerification {
            status,
            lab_id: "LAB-BLR-01".to_string(),
            lab_notes: Some("Routine screening".to_string()),
        };
        if let Some(receipt) = registry.record_verification(batch_id, verdict).await? {
            println!("  ✓ {} marked {} in block {}", batch_id, status, receipt.index);
        }
    }
    println!();

    // 3. A consumer scans a label
    println!("🔎 Tracing {}...", ashwagandha.batch_id.to_lowercase());
    if let Some(report) = registry.trace(&ashwagandha.batch_id.to_lowercase()) {
        for step in &report.journey {
            println!("  {}. {} [{:?}] {}", step.step, step.title, step.state, step.description);
        }
    }
    println!();

    // 4. Chain summary
    let status = registry.network_status();
    println!("⛓  {} ({})", status.network, status.consensus);
    println!("  Blocks:     {}", status.info.length);
    println!("  Difficulty: {}", status.info.difficulty);
    println!("  Valid:      {}", status.info.is_valid);
    println!("  Tip:        {}", status.info.latest_block.hash);

    Ok(())
}
