use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use wfc_core::{
    Boundaries, BoundaryMode, ConstraintPropagator, CpuConstraintPropagator, Solver, WaveGrid,
    WfcConfig,
};
use wfc_rules::{compile, AdjacencyRules, Markers, NeighborDecl, RuleSet, Symmetry, TileDef, TileSet};

// Oriented pieces that always admit a solution: every pair stacks vertically
// and every base orientation may sit next to every other.
fn setup_rules() -> (TileSet, AdjacencyRules) {
    let tiles = vec![
        TileDef::new("flat", Symmetry::X),
        TileDef::new("edge", Symmetry::T),
        TileDef::new("corner", Symmetry::L),
    ];
    let names = ["flat", "edge", "corner"];
    let mut neighbors = Vec::new();
    for left in names {
        for right in names {
            neighbors.push(NeighborDecl::horizontal(left, right));
            neighbors.push(NeighborDecl::vertical(left, right));
        }
    }
    compile(&RuleSet::new(tiles, neighbors), &Markers::default())
        .expect("benchmark rules must compile")
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("WFC solve");
    let (tileset, rules) = setup_rules();

    for size in [(8, 8, 2), (16, 16, 4)].iter() {
        let (width, height, depth) = *size;
        group.throughput(Throughput::Elements((width * height * depth) as u64));
        group.bench_with_input(
            BenchmarkId::new("CPU", format!("{width}x{height}x{depth}")),
            size,
            |b, &dims| {
                b.iter(|| {
                    let config = WfcConfig::builder()
                        .boundaries(Boundaries::uniform(BoundaryMode::Periodic))
                        .build();
                    let solver = Solver::new(&tileset, &rules, dims, config)
                        .expect("valid benchmark setup");
                    let mut rng = StdRng::seed_from_u64(7);
                    black_box(solver.solve_with(&mut rng).ok());
                });
            },
        );
    }
    group.finish();
}

fn bench_propagate(c: &mut Criterion) {
    let (tileset, rules) = setup_rules();
    let propagator = CpuConstraintPropagator::new(Boundaries::uniform(BoundaryMode::Periodic));

    c.bench_function("propagate single collapse 16x16x4", |b| {
        b.iter(|| {
            let mut wave = WaveGrid::new(16, 16, 4, tileset.num_actions())
                .expect("valid benchmark wave");
            wave.collapse(0, wfc_rules::ActionId(1));
            black_box(propagator.propagate_to_fixpoint(&mut wave, &rules));
        });
    });
}

criterion_group!(benches, bench_solve, bench_propagate);
criterion_main!(benches);
