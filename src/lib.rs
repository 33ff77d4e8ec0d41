//! A contraction core for tensor networks: a mutable hyper-edge graph of
//! tensors (`Network`) plus a path-driven contractor (`contract`/`custom`)
//! that reduces it to a single tensor via pairwise array contractions.
//!
//! The crate is backend-agnostic: it never touches tensor elements
//! itself, only shapes and an opaque [`Backend`]/[`Tensor`] pair the
//! caller supplies. A reference `ndarray`-based backend is available
//! behind the `test-backend` feature for testing and benchmarking.
//!
//! ```text
//! let mut net = Network::new(my_backend);
//! let a = net.add_node(tensor_a, None);
//! let b = net.add_node(tensor_b, None);
//! net.connect(net.node(a).unwrap().edges()[0], net.node(b).unwrap().edges()[0])?;
//! let result = contract(&mut net, "auto", &ContractOptions::default())?;
//! ```

pub mod algorithms;
pub mod backend;
pub mod contract;
pub mod driver;
pub mod edge;
pub mod einsum;
pub mod error;
pub mod ids;
pub mod network;
pub mod node;
pub mod optimizer;
pub mod registry;
pub mod tensor;

pub use driver::{contract, custom};
pub use edge::{Edge, EdgeKind, Endpoint};
pub use error::ContractError;
pub use ids::{EdgeId, NodeId};
pub use network::Network;
pub use node::{CopyNode, Node, NodeEntry};
pub use optimizer::{Index, Optimizer};
pub use registry::ContractOptions;
pub use tensor::{Backend, Tensor};

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::{AHashMap, AHashSet};

    #[derive(Clone, Debug, PartialEq)]
    struct VecTensor {
        shape: Vec<usize>,
    }
    impl Tensor for VecTensor {
        fn shape(&self) -> &[usize] {
            &self.shape
        }
    }

    struct ShapeOnlyBackend;
    impl Backend for ShapeOnlyBackend {
        type Tensor = VecTensor;

        fn einsum(&self, expr: &str, a: &VecTensor, b: &VecTensor) -> Result<VecTensor, ContractError> {
            let (lhs, rhs_out) = expr.split_once("->").unwrap();
            let (left, right) = lhs.split_once(',').unwrap();
            let mut dims: AHashMap<char, usize> = AHashMap::default();
            for (c, d) in left.chars().zip(a.shape.iter()) {
                dims.insert(c, *d);
            }
            for (c, d) in right.chars().zip(b.shape.iter()) {
                dims.insert(c, *d);
            }
            Ok(VecTensor {
                shape: rhs_out.chars().map(|c| dims[&c]).collect(),
            })
        }

        fn trace(&self, expr: &str, a: &VecTensor) -> Result<VecTensor, ContractError> {
            let (lhs, out) = expr.split_once("->").unwrap();
            let mut dims: AHashMap<char, usize> = AHashMap::default();
            for (c, d) in lhs.chars().zip(a.shape.iter()) {
                dims.insert(c, *d);
            }
            Ok(VecTensor {
                shape: out.chars().map(|c| dims[&c]).collect(),
            })
        }

        fn copy_tensor(&self, rank: usize, dimension: usize) -> Result<VecTensor, ContractError> {
            Ok(VecTensor {
                shape: vec![dimension; rank],
            })
        }
    }

    #[test]
    fn ring_of_four_contracts_to_scalar() {
        let mut net = Network::new(ShapeOnlyBackend);
        let d = 3;
        let xn = net.add_node(VecTensor { shape: vec![d, d, d] }, None);
        let yn = net.add_node(VecTensor { shape: vec![d, d, d] }, None);
        let zn = net.add_node(VecTensor { shape: vec![d, d, d] }, None);
        let wn = net.add_node(VecTensor { shape: vec![d, d, d] }, None);

        // xn(b,c,a), yn(c,d,g), zn(d,b,f), wn(a,f,g)
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

        let final_id = contract(&mut net, "auto", &ContractOptions::default()).unwrap();
        let node = net.node(final_id).unwrap().as_tensor().unwrap();
        assert!(node.shape().is_empty());
        assert_eq!(net.get_final_node(), Some(final_id));
    }

    #[test]
    fn disconnected_network_is_rejected() {
        let mut net = Network::new(ShapeOnlyBackend);
        let a = net.add_node(VecTensor { shape: vec![2, 2] }, None);
        let b = net.add_node(VecTensor { shape: vec![2, 2] }, None);
        let c = net.add_node(VecTensor { shape: vec![2, 2] }, None);
        let d = net.add_node(VecTensor { shape: vec![2, 2] }, None);

        net.connect(net.node(a).unwrap().edges()[0], net.node(b).unwrap().edges()[0]).unwrap();
        net.connect(net.node(c).unwrap().edges()[0], net.node(d).unwrap().edges()[0]).unwrap();

        let err = contract(&mut net, "auto", &ContractOptions::default()).unwrap_err();
        assert!(matches!(err, ContractError::DisconnectedNetwork { components: 2 }));
    }

    #[test]
    fn unknown_algorithm_name_is_rejected() {
        let mut net = Network::new(ShapeOnlyBackend);
        net.add_node(VecTensor { shape: vec![2] }, None);
        let err = contract(&mut net, "bogus", &ContractOptions::default()).unwrap_err();
        assert!(matches!(err, ContractError::UnknownAlgorithm(name) if name == "bogus"));
    }

    #[test]
    fn custom_optimizer_drives_a_pair_merge() {
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

        let mut net = Network::new(ShapeOnlyBackend);
        let a = net.add_node(VecTensor { shape: vec![2] }, None);
        let b = net.add_node(VecTensor { shape: vec![2, 5] }, None);
        net.connect(net.node(a).unwrap().edges()[0], net.node(b).unwrap().edges()[0]).unwrap();

        let final_id = custom(&mut net, &Trivial, &ContractOptions::default()).unwrap();
        let node = net.node(final_id).unwrap().as_tensor().unwrap();
        assert_eq!(node.shape(), &[5]);
    }
}
