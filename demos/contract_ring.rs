// # Contracting a ring of tensors
//
// This example builds the four-tensor ring from the contraction core's
// own test suite and walks through contracting it by hand, without
// picking a named algorithm, to show what the core's primitives look
// like from the outside.
//
// The network: four rank-3 tensors `xn(b,c,a)`, `yn(c,d,g)`, `zn(d,b,f)`,
// `wn(a,f,g)` of shape (D,D,D), wired edge-to-edge into a ring. Every
// axis is eventually summed over, so the result is the scalar D^6.

use tensorgraph_contract::backend::{ArrayBackend, NdTensor};
use tensorgraph_contract::{contract, ContractOptions, Network};

fn main() {
    // `Network::new` takes ownership of a `Backend`, here the
    // `ndarray`-based reference backend that ships behind the
    // `test-backend` feature. A production caller would supply their own.
    let mut net = Network::new(ArrayBackend);

    let d = 3;
    let xn = net.add_node(NdTensor::ones(&[d, d, d]), None);
    let yn = net.add_node(NdTensor::ones(&[d, d, d]), None);
    let zn = net.add_node(NdTensor::ones(&[d, d, d]), None);
    let wn = net.add_node(NdTensor::ones(&[d, d, d]), None);

    // `add_node` allocates one dangling edge per axis; we wire the ring
    // by connecting pairs of those edges. Every `connect` call checks
    // that the two dimensions agree before fusing them.
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

    // `contract` picks the named algorithm, runs the trace pre-pass and
    // connectivity check, then executes the returned path pair by pair.
    // "auto" is a reasonable default for small networks like this one.
    let result = contract(&mut net, "auto", &ContractOptions::default()).expect("contraction failed");

    let tensor = net.node(result).unwrap().as_tensor().unwrap().tensor();
    println!("result shape: {:?}", tensor.shape());
    println!("result value: {:?}", tensor.array());

    assert!(tensor.shape().is_empty());
    assert_eq!(tensor.array()[ndarray::IxDyn(&[])], (d as f64).powi(6));
}
