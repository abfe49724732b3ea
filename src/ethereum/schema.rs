use alloy::{json_abi::JsonAbi, primitives::B256};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use super::types::{Event, Method};

/// Every event and method of a contract ABI, keyed by signature
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractSchema {
    pub events: BTreeMap<String, Event>,
    pub methods: BTreeMap<String, Method>,
}

impl ContractSchema {
    pub fn from_abi(abi: &JsonAbi) -> Self {
        Self::filtered(abi, &[], &[])
    }

    /// Build a schema holding only the named events and methods. An empty
    /// list keeps every entry of that kind.
    pub fn filtered(abi: &JsonAbi, events: &[String], methods: &[String]) -> Self {
        let keep = |wanted: &[String], name: &str| {
            wanted.is_empty() || wanted.iter().any(|w| w == name)
        };

        let events: BTreeMap<String, Event> = abi
            .events()
            .filter(|e| keep(events, &e.name))
            .map(Event::from_abi)
            .map(|e| (e.sig(), e))
            .collect();

        let methods: BTreeMap<String, Method> = abi
            .functions()
            .filter(|f| keep(methods, &f.name))
            .map(Method::from_abi)
            .map(|m| (m.sig(), m))
            .collect();

        info!(
            "Built contract schema with {} events and {} methods",
            events.len(),
            methods.len()
        );

        Self { events, methods }
    }

    pub fn event(&self, sig: &str) -> Option<&Event> {
        self.events.get(sig)
    }

    pub fn event_mut(&mut self, sig: &str) -> Option<&mut Event> {
        self.events.get_mut(sig)
    }

    /// Look up the event a log belongs to by its first topic
    pub fn event_by_topic(&self, topic: B256) -> Option<&Event> {
        self.events
            .values()
            .find(|e| !e.anonymous && e.topic() == topic)
    }

    pub fn method(&self, sig: &str) -> Option<&Method> {
        self.methods.get(sig)
    }

    pub fn method_mut(&mut self, sig: &str) -> Option<&mut Method> {
        self.methods.get_mut(sig)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::types::Log;
    use alloy::primitives::keccak256;

    const TOKEN_ABI: &str = r#"[
        {
            "anonymous": false,
            "inputs": [
                {"indexed": true, "name": "owner", "type": "address"},
                {"indexed": true, "name": "spender", "type": "address"},
                {"indexed": false, "name": "value", "type": "uint256"}
            ],
            "name": "Approval",
            "type": "event"
        },
        {
            "anonymous": false,
            "inputs": [
                {"indexed": true, "name": "from", "type": "address"},
                {"indexed": true, "name": "to", "type": "address"},
                {"indexed": false, "name": "value", "type": "uint256"}
            ],
            "name": "Transfer",
            "type": "event"
        },
        {
            "inputs": [{"name": "owner", "type": "address"}],
            "name": "balanceOf",
            "outputs": [{"name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [
                {"name": "owner", "type": "address"},
                {"name": "id", "type": "uint256"}
            ],
            "name": "balanceOf",
            "outputs": [{"name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]"#;

    fn abi() -> JsonAbi {
        serde_json::from_str(TOKEN_ABI).unwrap()
    }

    #[test]
    fn test_schema_keys_overloads_by_signature() {
        let schema = ContractSchema::from_abi(&abi());

        assert_eq!(schema.events.len(), 2);
        assert_eq!(schema.methods.len(), 2);
        assert!(schema.method("balanceOf(address)").is_some());
        assert!(schema.method("balanceOf(address,uint256)").is_some());
        assert!(schema.event("Transfer(address,address,uint256)").is_some());
    }

    #[test]
    fn test_filtered_schema() {
        let schema = ContractSchema::filtered(&abi(), &["Transfer".to_string()], &[]);

        assert_eq!(schema.events.len(), 1);
        assert!(schema.event("Approval(address,address,uint256)").is_none());
        assert_eq!(schema.methods.len(), 2);

        let none = ContractSchema::filtered(&abi(), &["Missing".to_string()], &["x".to_string()]);
        assert!(none.is_empty());
    }

    #[test]
    fn test_schema_is_deterministic() {
        assert_eq!(ContractSchema::from_abi(&abi()), ContractSchema::from_abi(&abi()));
    }

    #[test]
    fn test_event_by_topic() {
        let schema = ContractSchema::from_abi(&abi());
        let topic = keccak256("Approval(address,address,uint256)");

        assert_eq!(schema.event_by_topic(topic).unwrap().name, "Approval");
        assert!(schema.event_by_topic(B256::ZERO).is_none());
    }

    #[test]
    fn test_event_by_topic_skips_anonymous_events() {
        let abi: JsonAbi = serde_json::from_str(
            r#"[{
                "anonymous": true,
                "inputs": [{"indexed": false, "name": "value", "type": "uint256"}],
                "name": "Ping",
                "type": "event"
            }]"#,
        )
        .unwrap();
        let schema = ContractSchema::from_abi(&abi);
        let event = schema.event("Ping(uint256)").unwrap();

        assert!(event.anonymous);
        assert!(schema.event_by_topic(event.topic()).is_none());
    }

    #[test]
    fn test_logs_recorded_through_schema() {
        let mut schema = ContractSchema::from_abi(&abi());
        let sig = "Transfer(address,address,uint256)";

        schema
            .event_mut(sig)
            .unwrap()
            .record_log(1, Log::new(1, 500, "0x01").with_value("value", "10"));

        assert_eq!(schema.event(sig).unwrap().logs[&1].block, 500);
    }
}
