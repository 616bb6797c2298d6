//! Deterministic fake traffic for the interactive viewer

use serde_json::{Value, json};

use scopelog_types::Severity;

/// Namespaces used when none are configured
pub const DEFAULT_NAMESPACES: [&str; 4] = ["net", "ui", "store", "auth"];

const DEBUG_MESSAGES: [&str; 4] = [
    "cache lookup",
    "render pass finished",
    "retrying with backoff",
    "state snapshot taken",
];
const INFO_MESSAGES: [&str; 3] = ["request completed", "session refreshed", "route changed"];
const WARN_MESSAGES: [&str; 2] = ["slow response", "quota nearly exhausted"];
const ERROR_MESSAGES: [&str; 2] = ["request failed", "unexpected payload"];

/// One log call to replay against the engine
#[derive(Clone, Debug, PartialEq)]
pub struct DemoCall {
    pub severity: Severity,
    pub namespace: String,
    pub args: Vec<Value>,
}

/// Round-robin traffic generator, mostly DEBUG with occasional errors
pub struct DemoTraffic {
    namespaces: Vec<String>,
    step: u64,
}

impl DemoTraffic {
    pub fn new(namespaces: &[String]) -> Self {
        Self {
            namespaces: namespaces.to_vec(),
            step: 0,
        }
    }

    /// Next call, or `None` if there are no namespaces to log under
    pub fn next_call(&mut self) -> Option<DemoCall> {
        if self.namespaces.is_empty() {
            return None;
        }
        let step = self.step;
        self.step += 1;

        let index = ((step * 7 + step / 3) % self.namespaces.len() as u64) as usize;
        let namespace = self.namespaces[index].clone();

        let (severity, messages): (Severity, &[&str]) = match step % 10 {
            0..=4 => (Severity::Debug, &DEBUG_MESSAGES[..]),
            5..=7 => (Severity::Info, &INFO_MESSAGES[..]),
            8 => (Severity::Warn, &WARN_MESSAGES[..]),
            _ => (Severity::Error, &ERROR_MESSAGES[..]),
        };
        let message = messages[(step / 10) as usize % messages.len()];

        let args = match severity {
            Severity::Debug => vec![json!(message)],
            Severity::Info => vec![json!(message), json!(step)],
            Severity::Warn => vec![json!(message), json!({ "latency_ms": 200 + step % 900 })],
            Severity::Error => vec![
                json!(message),
                json!({ "seq": step, "retry": step % 3 == 0 }),
            ],
        };

        Some(DemoCall {
            severity,
            namespace,
            args,
        })
    }

    /// One call per namespace and level, in display order
    pub fn sample_calls(namespaces: &[String]) -> Vec<DemoCall> {
        let mut calls = Vec::with_capacity(namespaces.len() * Severity::ALL_LEVELS.len());
        for namespace in namespaces {
            for severity in Severity::ALL_LEVELS {
                calls.push(DemoCall {
                    severity,
                    namespace: namespace.clone(),
                    args: vec![
                        json!(format!("sample {} message", severity.name())),
                        json!({ "namespace": namespace }),
                    ],
                });
            }
        }
        calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespaces() -> Vec<String> {
        DEFAULT_NAMESPACES.iter().map(|ns| ns.to_string()).collect()
    }

    #[test]
    fn test_traffic_is_deterministic() {
        let mut a = DemoTraffic::new(&namespaces());
        let mut b = DemoTraffic::new(&namespaces());
        for _ in 0..50 {
            assert_eq!(a.next_call(), b.next_call());
        }
    }

    #[test]
    fn test_traffic_covers_every_namespace_and_level() {
        let mut traffic = DemoTraffic::new(&namespaces());
        let calls: Vec<DemoCall> = (0..100).filter_map(|_| traffic.next_call()).collect();

        for ns in DEFAULT_NAMESPACES {
            assert!(calls.iter().any(|c| c.namespace == ns));
        }
        for level in Severity::ALL_LEVELS {
            assert!(calls.iter().any(|c| c.severity == level));
        }
    }

    #[test]
    fn test_no_namespaces_no_traffic() {
        assert_eq!(DemoTraffic::new(&[]).next_call(), None);
    }

    #[test]
    fn test_sample_calls_in_display_order() {
        let calls = DemoTraffic::sample_calls(&["net".to_string()]);
        let levels: Vec<Severity> = calls.iter().map(|c| c.severity).collect();
        assert_eq!(levels, Severity::ALL_LEVELS.to_vec());
    }
}
