//! The six concrete scenarios of spec.md §8.

#![cfg(feature = "test-backend")]

use ahash::{AHashMap, AHashSet};
use ndarray::IxDyn;

use tensorgraph_contract::backend::{ArrayBackend, NdTensor};
use tensorgraph_contract::{contract, custom, ContractError, ContractOptions, Index, Network, Optimizer};

#[test]
fn ring_of_four_rank_three_tensors_contracts_to_d_pow_six() {
    let mut net = Network::new(ArrayBackend);
    let d = 3;
    let xn = net.add_node(NdTensor::ones(&[d, d, d]), None); // xn(b,c,a)
    let yn = net.add_node(NdTensor::ones(&[d, d, d]), None); // yn(c,d,g)
    let zn = net.add_node(NdTensor::ones(&[d, d, d]), None); // zn(d,b,f)
    let wn = net.add_node(NdTensor::ones(&[d, d, d]), None); // wn(a,f,g)

    let x = net.node(xn).unwrap().edges().to_vec();
    let y = net.node(yn).unwrap().edges().to_vec();
    let z = net.node(zn).unwrap().edges().to_vec();
    let w = net.node(wn).unwrap().edges().to_vec();

    net.connect(x[1], y[0]).unwrap(); // c
    net.connect(y[1], z[0]).unwrap(); // d
    net.connect(z[1], x[0]).unwrap(); // b
    net.connect(z[2], w[1]).unwrap(); // f
    net.connect(x[2], w[0]).unwrap(); // a
    net.connect(y[2], w[2]).unwrap(); // g

    let result = contract(&mut net, "optimal", &ContractOptions::default()).unwrap();
    let tensor = net.node(result).unwrap().as_tensor().unwrap().tensor();
    assert!(tensor.shape().is_empty());
    assert_eq!(tensor.array()[IxDyn(&[])], (d as f64).powi(6));
}

#[test]
fn single_node_self_loop_traces_to_a_vector() {
    let mut net = Network::new(ArrayBackend);
    let n = net.add_node(NdTensor::ones(&[2, 2, 2]), None);
    let axes = net.node(n).unwrap().edges().to_vec();
    net.connect(axes[0], axes[1]).unwrap();

    let result = contract(&mut net, "greedy", &ContractOptions::default()).unwrap();
    let tensor = net.node(result).unwrap().as_tensor().unwrap().tensor();
    assert_eq!(tensor.shape(), &[2]);
    assert!(tensor.array().iter().all(|&v| v == 2.0));
}

#[test]
fn disconnected_pairs_are_rejected() {
    let mut net = Network::new(ArrayBackend);
    let a = net.add_node(NdTensor::ones(&[2, 2]), None);
    let b = net.add_node(NdTensor::ones(&[2, 2]), None);
    let c = net.add_node(NdTensor::ones(&[2, 2]), None);
    let d = net.add_node(NdTensor::ones(&[2, 2]), None);
    net.connect(net.node(a).unwrap().edges()[0], net.node(b).unwrap().edges()[0]).unwrap();
    net.connect(net.node(c).unwrap().edges()[0], net.node(d).unwrap().edges()[0]).unwrap();

    let err = contract(&mut net, "auto", &ContractOptions::default()).unwrap_err();
    assert!(matches!(err, ContractError::DisconnectedNetwork { components: 2 }));
}

#[test]
fn rank_two_copy_node_acts_as_a_diagonal() {
    let mut net = Network::new(ArrayBackend);
    let x = net.add_node(NdTensor::ones(&[3, 3]), None);
    let y = net.add_node(NdTensor::ones(&[3, 3, 3]), None);
    let c = net.add_copy_node(2, 3);

    net.connect(net.node(x).unwrap().edges()[0], net.node(y).unwrap().edges()[1]).unwrap();
    let cx = net.node(c).unwrap().edges().to_vec();
    net.connect(net.node(x).unwrap().edges()[1], cx[0]).unwrap();
    net.connect(net.node(y).unwrap().edges()[2], cx[1]).unwrap();

    let result = contract(&mut net, "optimal", &ContractOptions::default()).unwrap();
    let tensor = net.node(result).unwrap().as_tensor().unwrap().tensor();
    assert_eq!(tensor.shape(), &[3]);
    assert!(tensor.array().iter().all(|&v| v == 9.0));
}

#[test]
fn copy_node_with_dangling_exposure_survives_as_a_new_axis() {
    let mut net = Network::new(ArrayBackend);
    let x = net.add_node(NdTensor::ones(&[3, 3]), None);
    let y = net.add_node(NdTensor::ones(&[3, 3, 3]), None);
    let c = net.add_copy_node(3, 3);

    net.connect(net.node(x).unwrap().edges()[0], net.node(y).unwrap().edges()[1]).unwrap();
    let cx = net.node(c).unwrap().edges().to_vec();
    net.connect(net.node(x).unwrap().edges()[1], cx[0]).unwrap();
    net.connect(net.node(y).unwrap().edges()[2], cx[1]).unwrap();
    let dangling_copy_axis = cx[2];
    let dangling_y_axis = net.node(y).unwrap().edges()[0];

    let options = ContractOptions {
        memory_limit: None,
        output_edge_order: Some(vec![dangling_y_axis, dangling_copy_axis]),
    };
    let result = contract(&mut net, "optimal", &options).unwrap();
    let tensor = net.node(result).unwrap().as_tensor().unwrap().tensor();
    assert_eq!(tensor.shape(), &[3, 3]);
    assert!(tensor.array().iter().all(|&v| v == 3.0));
}

#[test]
fn caller_supplied_optimizer_drives_the_merge() {
    struct Trivial;
    impl Optimizer for Trivial {
        fn optimize(
            &self,
            input_sets: &[AHashSet<Index>],
            _output_set: &AHashSet<Index>,
            _size_dict: &AHashMap<Index, usize>,
            _memory_limit: Option<usize>,
        ) -> Result<Vec<(usize, usize)>, ContractError> {
            assert_eq!(input_sets.len(), 2);
            Ok(vec![(0, 1)])
        }
    }

    let mut net = Network::new(ArrayBackend);
    let a = net.add_node(NdTensor::ones(&[2]), None);
    let b = net.add_node(NdTensor::ones(&[2, 5]), None);
    net.connect(net.node(a).unwrap().edges()[0], net.node(b).unwrap().edges()[0]).unwrap();

    let result = custom(&mut net, &Trivial, &ContractOptions::default()).unwrap();
    let tensor = net.node(result).unwrap().as_tensor().unwrap().tensor();
    assert_eq!(tensor.shape(), &[5]);
    assert!(tensor.array().iter().all(|&v| v == 2.0));
}
