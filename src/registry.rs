use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, info};

use crate::error::RegistryError;
use crate::handover::OutputHandle;

/// Path-addressed table of published orchestrator outputs.
///
/// Orchestrators register under their node path (for example
/// `/project1/player1`); audio taps find them by full path or by sibling name.
pub struct NodeRegistry {
    nodes: Mutex<HashMap<String, OutputHandle>>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
        }
    }

    /// Publish `handle` under `path`. Re-registering the same handle is a no-op.
    pub fn register(&self, path: &str, handle: OutputHandle) -> Result<(), RegistryError> {
        if path.trim().is_empty() {
            return Err(RegistryError::InvalidPath {
                path: path.to_string(),
            });
        }

        let mut nodes = self.nodes.lock().unwrap();
        if let Some(existing) = nodes.get(path) {
            if existing.same_output(&handle) {
                return Ok(());
            }
            return Err(RegistryError::AlreadyRegistered {
                name: path.to_string(),
            });
        }

        nodes.insert(path.to_string(), handle);
        info!("Registered output at {}", path);
        Ok(())
    }

    /// Remove every entry that refers to `handle`
    pub fn unregister(&self, handle: &OutputHandle) {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.retain(|path, existing| {
            let keep = !existing.same_output(handle);
            if !keep {
                debug!("Unregistered output at {}", path);
            }
            keep
        });
    }

    pub fn lookup(&self, path: &str) -> Option<OutputHandle> {
        self.nodes.lock().unwrap().get(path).cloned()
    }

    /// Find `target` as a full path first, then as a sibling of `from_path`
    pub fn resolve(&self, target: &str, from_path: &str) -> Option<OutputHandle> {
        if target.is_empty() {
            return None;
        }
        if let Some(handle) = self.lookup(target) {
            return Some(handle);
        }
        let parent = match from_path.rfind('/') {
            Some(idx) => &from_path[..idx],
            None => "",
        };
        self.lookup(&format!("{}/{}", parent, target.trim_start_matches('/')))
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.nodes.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
