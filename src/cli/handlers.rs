use std::path::Path;
use std::sync::Arc;

use crate::config::TriggerConfig;
use crate::embeddings::{FastembedEncoder, TextEncoder};
use crate::error::{ClipwatchError, Result};
use crate::store::{Polarity, PromptStore};

/// Open the store in load-only mode (no embedding runtime).
fn open_store(path: &Path) -> Result<PromptStore> {
    let store = PromptStore::new(None);
    store.load(path)?;
    Ok(store)
}

/// Open the store with the local embedding runtime attached. Falls back to
/// load-only mode with a warning when the model cannot be initialized.
fn open_store_with_encoder(path: &Path) -> Result<PromptStore> {
    let encoder: Option<Arc<dyn TextEncoder>> = match FastembedEncoder::new() {
        Ok(encoder) => Some(Arc::new(encoder)),
        Err(e) => {
            eprintln!("Warning: embedding runtime unavailable: {}", e);
            None
        }
    };
    let store = PromptStore::new(encoder);
    store.load(path)?;
    Ok(store)
}

pub fn handle_init(store_path: &Path) -> Result<()> {
    let store = PromptStore::new(None);
    store.load(store_path)?;
    store.save(store_path)?;
    println!("Initialized empty store at {}", store_path.display());
    Ok(())
}

pub fn handle_add(
    store_path: &Path,
    text: String,
    negative: bool,
    ensemble: Option<String>,
    json: bool,
) -> Result<()> {
    let store = open_store_with_encoder(store_path)?;
    let polarity = if negative {
        Polarity::Negative
    } else {
        Polarity::Positive
    };
    let prompt = store.add(&text, polarity, ensemble)?;
    store.save(store_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        println!(
            "Added \"{}\" ({} prompts)",
            prompt.text,
            store.snapshot().prompts.len()
        );
    }
    Ok(())
}

pub fn handle_remove(store_path: &Path, text: String) -> Result<()> {
    let store = open_store(store_path)?;
    if !store.remove(&text) {
        return Err(ClipwatchError::PromptNotFound(text));
    }
    store.save(store_path)?;
    println!("Removed \"{}\"", text.trim());
    Ok(())
}

pub fn handle_list(store_path: &Path, json: bool) -> Result<()> {
    let store = open_store(store_path)?;
    let snap = store.snapshot();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "threshold": snap.threshold,
                "text_prefix": snap.text_prefix,
                "prompts": snap.prompts,
            })
        );
        return Ok(());
    }

    println!("threshold:   {}", snap.threshold);
    println!("text_prefix: \"{}\"", snap.text_prefix);
    if snap.prompts.is_empty() {
        println!("No prompts.");
        return Ok(());
    }
    for prompt in &snap.prompts {
        let polarity = if prompt.polarity.is_negative() {
            " [negative]"
        } else {
            ""
        };
        let ensemble = prompt
            .ensemble_key
            .as_deref()
            .map(|k| format!(" [ensemble: {}]", k))
            .unwrap_or_default();
        println!("  {}{}{}", prompt.text, polarity, ensemble);
    }
    Ok(())
}

pub fn handle_set_threshold(store_path: &Path, value: f32) -> Result<()> {
    let store = open_store(store_path)?;
    store.set_threshold(value);
    store.save(store_path)?;
    println!("threshold = {}", store.snapshot().threshold);
    Ok(())
}

pub fn handle_set_prefix(store_path: &Path, prefix: String) -> Result<()> {
    let store = open_store(store_path)?;
    store.set_text_prefix(&prefix);
    store.save(store_path)?;
    println!("text_prefix = \"{}\"", prefix);
    Ok(())
}

pub fn handle_triggers_init(path: &Path) -> Result<()> {
    let config = TriggerConfig::example();
    config.save(path)?;
    println!(
        "Wrote example trigger table with {} labels to {}",
        config.triggers.len(),
        path.display()
    );
    Ok(())
}

pub fn handle_triggers_show(path: &Path, json: bool) -> Result<()> {
    let config = TriggerConfig::load(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut labels: Vec<_> = config.triggers.iter().collect();
    labels.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (label, rule) in labels {
        println!(
            "  {} -> after {} frames: {:?}",
            label, rule.run_length, rule.action
        );
    }
    Ok(())
}
