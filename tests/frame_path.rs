//! End-to-end flow: embeddings in, debounced actions out.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clipwatch::{
    Action, ActionDispatcher, DebounceEngine, DispatchQueue, Matcher, Polarity, Prompt,
    PromptStore, Result, StoreSnapshot, TriggerConfig, TriggerEvent, TriggerRule,
};

#[derive(Default)]
struct Recording {
    seen: Mutex<Vec<(u64, String)>>,
}

impl ActionDispatcher for Recording {
    fn dispatch(&self, event: &TriggerEvent) -> Result<()> {
        self.seen
            .lock()
            .unwrap()
            .push((event.entity, event.label.clone()));
        Ok(())
    }
}

fn store_with(prompts: Vec<Prompt>, threshold: f32) -> Arc<PromptStore> {
    let store = PromptStore::new(None);
    store.replace(StoreSnapshot {
        prompts,
        threshold,
        text_prefix: String::new(),
    });
    Arc::new(store)
}

fn prompt(text: &str, vector: Vec<f32>, polarity: Polarity) -> Prompt {
    Prompt {
        text: text.to_string(),
        vector,
        polarity,
        ensemble_key: None,
    }
}

#[tokio::test]
async fn test_sustained_match_fires_one_action() {
    let store = store_with(
        vec![
            prompt("crying baby", vec![1.0, 0.0], Polarity::Positive),
            prompt("empty crib", vec![0.0, 1.0], Polarity::Negative),
        ],
        0.5,
    );
    let matcher = Matcher::new(store);

    let mut config = TriggerConfig::default();
    config.triggers.insert(
        "crying baby".to_string(),
        TriggerRule {
            run_length: 4,
            action: Action::Sound {
                path: PathBuf::from("lullaby.mp3"),
            },
        },
    );
    let mut engine = DebounceEngine::new(config);

    let recording = Arc::new(Recording::default());
    let queue = DispatchQueue::spawn(Arc::clone(&recording) as Arc<dyn ActionDispatcher>);

    // Ten frames of the same detection, with one noise frame in the middle.
    let frames: Vec<&[f32]> = vec![
        &[0.9, 0.1],
        &[0.9, 0.1],
        &[0.1, 0.9], // negative wins this frame
        &[0.9, 0.1],
        &[0.9, 0.1],
        &[0.9, 0.1],
        &[0.9, 0.1],
        &[0.9, 0.1],
        &[0.9, 0.1],
        &[0.9, 0.1],
    ];
    for embedding in frames {
        let best = matcher.match_embedding(embedding);
        let label = best.first().map(|m| m.label.as_str());
        if let Some(event) = engine.observe(42, label) {
            queue.send(event);
        }
    }
    queue.close().await;

    // The noise frame reset the first run; the second run fired exactly once.
    assert_eq!(
        *recording.seen.lock().unwrap(),
        vec![(42, "crying baby".to_string())]
    );
}

#[tokio::test]
async fn test_live_prompt_edit_stops_further_triggers() {
    let store = store_with(
        vec![prompt("cat", vec![1.0, 0.0], Polarity::Positive)],
        0.5,
    );
    let matcher = Matcher::new(Arc::clone(&store));

    let mut config = TriggerConfig::default();
    config.triggers.insert(
        "cat".to_string(),
        TriggerRule {
            run_length: 2,
            action: Action::Log,
        },
    );
    let mut engine = DebounceEngine::new(config);

    let recording = Arc::new(Recording::default());
    let queue = DispatchQueue::spawn(Arc::clone(&recording) as Arc<dyn ActionDispatcher>);

    let embedding = [1.0, 0.0];
    for _ in 0..3 {
        let best = matcher.match_embedding(&embedding);
        if let Some(event) = engine.observe(1, best.first().map(|m| m.label.as_str())) {
            queue.send(event);
        }
    }

    // Editor removes the prompt mid-stream; the same embedding no longer
    // matches and the latch resets without firing again.
    assert!(store.remove("cat"));
    for _ in 0..5 {
        let best = matcher.match_embedding(&embedding);
        if let Some(event) = engine.observe(1, best.first().map(|m| m.label.as_str())) {
            queue.send(event);
        }
    }
    queue.close().await;

    assert_eq!(recording.seen.lock().unwrap().len(), 1);
}
