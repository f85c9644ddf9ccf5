//! Replays recorded interactions from a cassette.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays interactions from a loaded cassette.
///
/// Interactions are served per port/method pair, either in recorded order
/// ([`next_interaction`](Self::next_interaction)) or by input
/// ([`next_matching`](Self::next_matching)) for ports whose calls are issued
/// concurrently.
pub struct CassetteReplayer {
    /// Per port+method queue of interactions (in order).
    queues: HashMap<PortMethodKey, Vec<Interaction>>,
    /// Per port+method flags marking served interactions.
    served: HashMap<PortMethodKey, Vec<bool>>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push(interaction.clone());
        }
        let served = queues.iter().map(|(k, q)| (k.clone(), vec![false; q.len()])).collect();
        Self { queues, served }
    }

    /// Whether the cassette recorded any interaction at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Whether the cassette recorded any interaction on `port`.
    #[must_use]
    pub fn has_port(&self, port: &str) -> bool {
        self.queues.keys().any(|k| k.port == port)
    }

    fn queue(&self, port: &str, method: &str) -> (PortMethodKey, &Vec<Interaction>) {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };
        let queue = self.queues.get(&key).unwrap_or_else(|| {
            let mut available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            available.sort();
            panic!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            );
        });
        (key, queue)
    }

    fn serve(&mut self, key: &PortMethodKey, index: usize) -> &Interaction {
        if let Some(flags) = self.served.get_mut(key) {
            flags[index] = true;
        }
        &self.queues[key][index]
    }

    /// Return the next unserved interaction for the given port and method.
    ///
    /// # Panics
    ///
    /// Panics if the cassette has no (more) interactions for the given
    /// port/method combination, printing a clear error showing what was
    /// requested versus what interactions remain.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> &Interaction {
        let (key, queue) = self.queue(port, method);
        let flags = &self.served[&key];
        let index = flags.iter().position(|served| !served).unwrap_or_else(|| {
            panic!(
                "Cassette exhausted: all {count} interactions for port={port:?} method={method:?} \
                 have been consumed. Last interaction was seq={last_seq}.",
                count = queue.len(),
                last_seq = queue.last().map_or(0, |i| i.seq),
            )
        });
        self.serve(&key, index)
    }

    /// Return the first unserved interaction for the given port and method
    /// whose recorded input equals `input`.
    ///
    /// # Panics
    ///
    /// Panics if no unserved interaction with that input remains.
    pub fn next_matching(&mut self, port: &str, method: &str, input: &serde_json::Value) -> &Interaction {
        let (key, queue) = self.queue(port, method);
        let flags = &self.served[&key];
        let index = queue
            .iter()
            .zip(flags)
            .position(|(interaction, served)| !served && &interaction.input == input)
            .unwrap_or_else(|| {
                panic!(
                    "Cassette exhausted: no unconsumed interaction for port={port:?} \
                     method={method:?} with input {input}"
                )
            });
        self.serve(&key, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn make_cassette(interactions: Vec<Interaction>) -> Cassette {
        Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions,
        }
    }

    fn interaction(seq: u64, port: &str, method: &str, input: serde_json::Value) -> Interaction {
        Interaction {
            seq,
            port: port.into(),
            method: method.into(),
            input,
            output: json!({"ok": seq}),
        }
    }

    #[test]
    fn replay_monolithic_cassette_in_order() {
        let cassette = make_cassette(vec![
            interaction(0, "llm", "complete", json!({"prompt": "a"})),
            interaction(1, "fs", "read_to_string", json!({"path": "/x"})),
            interaction(2, "llm", "complete", json!({"prompt": "b"})),
        ]);

        let mut replayer = CassetteReplayer::new(&cassette);

        assert_eq!(replayer.next_interaction("llm", "complete").seq, 0);
        assert_eq!(replayer.next_interaction("fs", "read_to_string").seq, 1);
        assert_eq!(replayer.next_interaction("llm", "complete").seq, 2);
    }

    #[test]
    fn matching_serves_by_input_regardless_of_order() {
        let cassette = make_cassette(vec![
            interaction(0, "entities", "entities", json!({"path": "a.rs"})),
            interaction(1, "entities", "entities", json!({"path": "b.rs"})),
            interaction(2, "entities", "entities", json!({"path": "a.rs"})),
        ]);
        let mut replayer = CassetteReplayer::new(&cassette);

        assert_eq!(replayer.next_matching("entities", "entities", &json!({"path": "b.rs"})).seq, 1);
        assert_eq!(replayer.next_matching("entities", "entities", &json!({"path": "a.rs"})).seq, 0);
        assert_eq!(replayer.next_interaction("entities", "entities").seq, 2);
    }

    #[test]
    fn reports_recorded_ports() {
        let replayer = CassetteReplayer::new(&make_cassette(vec![interaction(0, "git", "list_files", json!({}))]));
        assert!(replayer.has_port("git"));
        assert!(!replayer.has_port("llm"));
        assert!(!replayer.is_empty());
        assert!(CassetteReplayer::new(&make_cassette(vec![])).is_empty());
    }

    #[test]
    #[should_panic(expected = "Cassette exhausted")]
    fn exhausted_replayer_panics_with_descriptive_message() {
        let cassette = make_cassette(vec![interaction(0, "llm", "complete", json!({}))]);

        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("llm", "complete");
        let _ = replayer.next_interaction("llm", "complete");
    }

    #[test]
    #[should_panic(expected = "with input")]
    fn unmatched_input_panics() {
        let cassette = make_cassette(vec![interaction(0, "calls", "outgoing_calls", json!({"id": "a"}))]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_matching("calls", "outgoing_calls", &json!({"id": "b"}));
    }

    #[test]
    #[should_panic(expected = "no interactions recorded")]
    fn unknown_port_panics() {
        let cassette = make_cassette(vec![]);
        let mut replayer = CassetteReplayer::new(&cassette);
        let _ = replayer.next_interaction("unknown", "method");
    }
}
