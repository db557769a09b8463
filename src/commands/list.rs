// List command - list reporters a setup may name

use anyhow::Result;

use crate::cli::args::ListArgs;
use crate::multi::ReporterRegistry;

pub fn handle_list(args: &ListArgs) -> Result<()> {
    let registry = ReporterRegistry::new();
    let names = registry.names();

    if args.is_json() {
        let reporters: Vec<serde_json::Value> = names
            .iter()
            .map(|(name, origin)| {
                serde_json::json!({
                    "name": name,
                    "origin": origin.as_str(),
                })
            })
            .collect();

        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "reporters": reporters }))?
        );
    } else {
        for (name, origin) in &names {
            println!("{} ({})", name, origin.as_str());
        }
    }

    Ok(())
}
