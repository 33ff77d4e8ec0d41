#![allow(unused)]
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use tensorgraph_contract::backend::{ArrayBackend, NdTensor};
use tensorgraph_contract::{contract, ContractOptions, Network};

/// A ring of `size` rank-3 tensors, each connected to its two neighbors,
/// with one dangling axis apiece. Contractible by every built-in
/// algorithm without hitting `DisconnectedNetwork`. The shared dimension
/// is randomized per ring to avoid a constant-folded benchmark.
fn random_ring(size: usize) -> Network<ArrayBackend> {
    let dim = rand::thread_rng().gen_range(2..=4);
    let mut net = Network::new(ArrayBackend);

    let nodes: Vec<_> = (0..size)
        .map(|_| net.add_node(NdTensor::ones(&[dim, dim, dim]), None))
        .collect();

    for i in 0..size {
        let next = (i + 1) % size;
        let from_axis = net.node(nodes[i]).unwrap().edges()[1];
        let to_axis = net.node(nodes[next]).unwrap().edges()[0];
        net.connect(from_axis, to_axis).unwrap();
    }

    net
}

fn bench_algorithms(c: &mut Criterion) {
    static B: usize = 4;

    let mut group = c.benchmark_group("Ring contraction");
    for (i, size) in [B, 2 * B, 3 * B].iter().enumerate() {
        group.throughput(Throughput::Elements(*size as u64));

        for algorithm in ["greedy", "branch", "optimal"] {
            group.bench_with_input(BenchmarkId::new(algorithm, size), &i, |b, _| {
                b.iter_batched(
                    || random_ring(*size),
                    |mut net| {
                        let _ = contract(&mut net, algorithm, &ContractOptions::default()).unwrap();
                    },
                    criterion::BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_algorithms);
criterion_main!(benches);
