//! `woof producers`: show the registered producers

use super::error::discovery;
use super::output::new_table;
use woof::discovery::{AmbiguityPolicy, ProducerRegistry};

pub fn run(json: bool) -> anyhow::Result<()> {
    let registry = ProducerRegistry::builtin().map_err(discovery)?;

    if json {
        let producers: Vec<serde_json::Value> = registry
            .iter()
            .map(|producer| {
                let sources: Vec<serde_json::Value> = producer
                    .data_sources
                    .iter()
                    .map(|source| {
                        serde_json::json!({
                            "name": source.name,
                            "display_name": source.display_name,
                            "data_type": source.data_type,
                            "pattern": source.pattern.as_str(),
                            "first_by_path": source.ambiguity == AmbiguityPolicy::FirstByPath,
                        })
                    })
                    .collect();
                serde_json::json!({
                    "id": producer.id,
                    "title": producer.title,
                    "threshold": producer.threshold,
                    "fingerprint": producer
                        .fingerprint
                        .iter()
                        .map(|(pattern, weight)| serde_json::json!({ "pattern": pattern.as_str(), "weight": weight }))
                        .collect::<Vec<_>>(),
                    "data_sources": sources,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&producers)?);
        return Ok(());
    }

    for producer in registry.iter() {
        println!(
            "{} ({}), fingerprint threshold {} over {} probes",
            producer.title,
            producer.id,
            producer.threshold,
            producer.fingerprint.len()
        );
        let mut table = new_table(&["Data source", "Column", "Type", "Pattern"]);
        for source in &producer.data_sources {
            let pattern = match source.ambiguity {
                AmbiguityPolicy::Strict => source.pattern.to_string(),
                AmbiguityPolicy::FirstByPath => format!("{} (first by path)", source.pattern),
            };
            table.add_row(vec![
                source.name.to_string(),
                source.display_name.to_string(),
                source.data_type.to_string(),
                pattern,
            ]);
        }
        println!("{}", table);
        println!();
    }
    Ok(())
}
