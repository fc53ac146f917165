use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use super::processor::VisionProcessor;

/// Shared handle to a processor. `process_*` take `&mut self`, hence the `Mutex`.
pub type SharedProcessor = Arc<Mutex<dyn VisionProcessor>>;

/// Named processors; the caller picks which one a frame goes to.
pub struct ProcessorRegistry {
    processors: HashMap<String, SharedProcessor>,
    default_name: Option<String>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a processor under its own name. The first one becomes the default.
    pub fn register<P: VisionProcessor + 'static>(&mut self, processor: P) -> SharedProcessor {
        let name = processor.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        let shared: SharedProcessor = Arc::new(Mutex::new(processor));
        if let Some(previous) = self.processors.insert(name.clone(), shared.clone()) {
            log::warn!("processor '{}' replaced; stopping previous instance", name);
            stop_processor(&name, &previous);
        }
        shared
    }

    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.processors.contains_key(name) {
            return Err(anyhow!("processor '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<SharedProcessor> {
        self.processors.get(name).cloned()
    }

    pub fn default_processor(&self) -> Option<SharedProcessor> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.processors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Stop every registered processor. Safe to call more than once.
    pub fn stop_all(&self) {
        for (name, processor) in &self.processors {
            stop_processor(name, processor);
        }
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn stop_processor(name: &str, processor: &SharedProcessor) {
    let mut guard = processor.lock().unwrap_or_else(|poisoned| {
        log::warn!("processor '{}' lock poisoned; stopping anyway", name);
        poisoned.into_inner()
    });
    guard.stop();
}
