//! Configuration surface (spec §6): the field modulus default, per-party
//! connection info, and the protocol-wide agreement every party loads
//! before a run starts.

use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::field::DEFAULT_MODULUS;

/// Connection info for one party, loadable from a JSON file the way
/// `mpc_client` expects (`--config party.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyConfig {
    pub client_id: String,
    pub broker_host: String,
    pub broker_port: u16,
    #[serde(default = "default_modulus")]
    pub modulus: i64,
}

fn default_modulus() -> i64 {
    DEFAULT_MODULUS
}

/// What every party agrees on before a run starts: the expression tree,
/// byte-identical everywhere per I1, and the participant id list. The
/// constructor sorts the id list once so every party derives the same
/// leader (I2) regardless of the order ids were supplied in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSpec {
    pub expr: Expression,
    pub participant_ids: Vec<String>,
}

impl ProtocolSpec {
    pub fn new(expr: Expression, mut participant_ids: Vec<String>) -> Self {
        participant_ids.sort();
        Self {
            expr,
            participant_ids,
        }
    }

    /// The lexicographically smallest participant id, or `None` if the
    /// spec names no participants at all.
    pub fn leader(&self) -> Option<&str> {
        self.participant_ids.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_is_lexicographically_smallest_regardless_of_input_order() {
        let spec = ProtocolSpec::new(
            Expression::scalar(1),
            vec!["bob".into(), "alice".into(), "carol".into()],
        );
        assert_eq!(spec.leader(), Some("alice"));
        assert_eq!(spec.participant_ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn config_without_modulus_field_gets_the_design_default() {
        let json = r#"{"client_id":"alice","broker_host":"127.0.0.1","broker_port":8080}"#;
        let config: PartyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.modulus, DEFAULT_MODULUS);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = PartyConfig {
            client_id: "alice".to_string(),
            broker_host: "127.0.0.1".to_string(),
            broker_port: 8080,
            modulus: 2003,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: PartyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.client_id, config.client_id);
        assert_eq!(back.modulus, config.modulus);
    }
}
