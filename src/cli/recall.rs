use anyhow::Result;

use crate::config::TabulaConfig;
use crate::protocol::Operation;
use crate::tools::recall_decisions::RecallDecisionsParams;

/// Search the decision log and print matches, newest first.
pub fn recall(config: TabulaConfig, keyword: Option<String>, limit: Option<usize>) -> Result<()> {
    let had_keyword = keyword.clone();
    let response = super::run_operation(
        config,
        Operation::RecallDecisions(RecallDecisionsParams { keyword, limit }),
    )?;

    let decisions = response.as_array().cloned().unwrap_or_default();
    if decisions.is_empty() {
        match had_keyword {
            Some(kw) => println!("No decisions found matching '{kw}'."),
            None => println!("No decisions stored yet."),
        }
        return Ok(());
    }

    for d in &decisions {
        let created = d["created_at"].as_str().unwrap_or("");
        let date = created.get(..10).unwrap_or(created);
        println!("#{} ({})", d["id"], date);
        println!("  Decision:  {}", d["decision"].as_str().unwrap_or(""));
        println!("  Rationale: {}", d["rationale"].as_str().unwrap_or(""));
        if let Some(ctx) = d["context"].as_str().filter(|s| !s.is_empty()) {
            println!("  Context:   {ctx}");
        }
        if let Some(alt) = d["alternatives"].as_str().filter(|s| !s.is_empty()) {
            println!("  Considered: {alt}");
        }
        println!();
    }

    println!("{} decision(s).", decisions.len());
    Ok(())
}
