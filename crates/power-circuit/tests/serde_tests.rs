// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![cfg(feature = "serde")]
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use power_circuit::{CircuitConfig, GraphCircuit, PowerCircuit};

#[test]
fn config_fields_default_when_omitted() {
    let config: CircuitConfig = serde_json::from_str(r#"{ "node_capacity": 128 }"#).unwrap();
    assert_eq!(config.node_capacity, 128);
    assert_eq!(config.check_invariants, CircuitConfig::default().check_invariants);

    let config: CircuitConfig = serde_json::from_str(r#"{ "check_invariants": false }"#).unwrap();
    assert_eq!(config, CircuitConfig::unchecked());
}

#[test]
fn stats_serialize_with_field_names() {
    let mut pc = GraphCircuit::with_config(CircuitConfig::checked());
    let _m = pc.create_marking(4);
    let value = serde_json::to_value(pc.stats()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "nodes": 3, "reduced_nodes": 3, "markings": 1, "edges": 2 })
    );
}
