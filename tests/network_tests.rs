//! Arena invariants and connect/disconnect round-trip (spec.md §8 "Laws").

#![cfg(feature = "test-backend")]

use tensorgraph_contract::backend::{ArrayBackend, NdTensor};
use tensorgraph_contract::{ContractError, Network};

#[test]
fn connect_disconnect_restores_axis_bindings() {
    let mut net = Network::new(ArrayBackend);
    let a = net.add_node(NdTensor::ones(&[3, 3]), None);
    let b = net.add_node(NdTensor::ones(&[3, 3]), None);
    let ea = net.node(a).unwrap().edges()[1];
    let eb = net.node(b).unwrap().edges()[0];

    let edge = net.connect(ea, eb).unwrap();
    assert!(net.edge(edge).unwrap().touches(a));
    assert!(net.edge(edge).unwrap().touches(b));

    let (back_to_a, back_to_b) = net.disconnect(edge, a);
    assert!(net.edge(back_to_a).unwrap().is_dangling());
    assert!(net.edge(back_to_b).unwrap().is_dangling());
    assert_eq!(net.node(a).unwrap().edges()[1], back_to_a);
    assert_eq!(net.node(b).unwrap().edges()[0], back_to_b);

    // Reconnecting restores a live standard edge between the same axes.
    let restored = net.connect(back_to_a, back_to_b).unwrap();
    assert_eq!(net.node(a).unwrap().edges()[1], restored);
    assert_eq!(net.node(b).unwrap().edges()[0], restored);
}

#[test]
fn every_live_edge_endpoint_agrees_on_dimension() {
    let mut net = Network::new(ArrayBackend);
    let a = net.add_node(NdTensor::ones(&[2, 4]), None);
    let b = net.add_node(NdTensor::ones(&[4, 5]), None);
    net.connect(net.node(a).unwrap().edges()[1], net.node(b).unwrap().edges()[0]).unwrap();

    for &id in net.node_order() {
        let node = net.node(id).unwrap();
        for (axis, &edge_id) in node.edges().iter().enumerate() {
            let edge = net.edge(edge_id).unwrap();
            assert_eq!(edge.axis_on(id), Some(axis));
            assert_eq!(edge.dimension, node.as_tensor().unwrap().shape()[axis]);
        }
    }
}

#[test]
fn connect_rejects_mismatched_dimensions() {
    let mut net = Network::new(ArrayBackend);
    let a = net.add_node(NdTensor::ones(&[3]), None);
    let b = net.add_node(NdTensor::ones(&[4]), None);
    let err = net.connect(net.node(a).unwrap().edges()[0], net.node(b).unwrap().edges()[0]).unwrap_err();
    assert!(matches!(err, ContractError::DimensionMismatch { left: 3, right: 4, .. }));
}

#[test]
fn remove_node_dangles_its_neighbors() {
    let mut net = Network::new(ArrayBackend);
    let a = net.add_node(NdTensor::ones(&[2]), None);
    let b = net.add_node(NdTensor::ones(&[2]), None);
    net.connect(net.node(a).unwrap().edges()[0], net.node(b).unwrap().edges()[0]).unwrap();

    net.remove_node(a);
    assert!(net.node(a).is_none());
    let leftover = net.node(b).unwrap().edges()[0];
    assert!(net.edge(leftover).unwrap().is_dangling());
}
