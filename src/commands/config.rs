//! Configuration display command.

#![allow(clippy::print_stdout)]

use crate::config::Config;
use crate::llm::ProviderRegistry;
use crate::Result;

/// Prints the resolved configuration.
pub fn cmd_config(config: &Config) -> Result<i32> {
    println!("Provider:          {}", config.provider);
    println!(
        "Registered:        {}",
        ProviderRegistry::with_builtins().names().join(", ")
    );
    println!("Data root:         {}", config.data_root.display());
    println!("Artifacts:         {}", config.artifacts_dir.display());
    println!(
        "NLP model:         {}",
        config
            .nlp_model_dir
            .as_ref()
            .map_or_else(|| "(unset - legacy mode)".to_string(), |p| p.display().to_string())
    );
    println!("Hybrid pipeline:   {}", config.hybrid_pipeline);
    println!("Enhance context:   {}", config.enhance_context);
    println!(
        "Prompts dir:       {}",
        config
            .prompts_dir
            .as_ref()
            .map_or_else(|| "(embedded)".to_string(), |p| p.display().to_string())
    );
    println!("Cache enabled:     {}", config.cache.enabled);
    println!("Cache TTL:         {} s", config.cache.ttl_secs);
    println!("LLM timeout:       {} s", config.llm.timeout_secs);
    println!("LLM max retries:   {}", config.llm.max_retries);
    println!("LLM temperature:   {}", config.llm.temperature);
    Ok(0)
}
