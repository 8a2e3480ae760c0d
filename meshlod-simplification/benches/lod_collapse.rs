//! Benchmarks for adjacency construction, edge collapse and level generation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshlod_core::{Point3f, SourceMesh};
use meshlod_simplification::{
    CollapseCost, Edge, IndexBufferOutput, LodCollapser, LodConfig, LodData, LodLevel,
    MeshLodGenerator, VertexId,
};

/// Edge length cost
struct EdgeLengthCost;

impl CollapseCost for EdgeLengthCost {
    fn compute_edge_collapse_cost(&mut self, data: &LodData, src: VertexId, edge: &Edge) -> f32 {
        (data.vertex(src).position - data.vertex(edge.dst).position).norm()
    }
}

fn generate_grid_mesh(size: usize) -> SourceMesh {
    let mut vertices = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let fx = x as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let fy = y as f32 / (size - 1) as f32 * std::f32::consts::PI;
            vertices.push(Point3f::new(x as f32, y as f32, (fx.sin() * fy.sin()) * 2.0));
        }
    }
    let mut faces = Vec::with_capacity((size - 1) * (size - 1) * 2);
    for y in 0..(size - 1) {
        for x in 0..(size - 1) {
            let tl = (y * size + x) as u32;
            let tr = tl + 1;
            let bl = tl + size as u32;
            let br = bl + 1;
            faces.push([tl, bl, tr]);
            faces.push([tr, bl, br]);
        }
    }
    SourceMesh::from_vertices_and_faces(vertices, &faces)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("lod_data");

    for size in [20, 40, 80] {
        let mesh = generate_grid_mesh(size);
        group.bench_with_input(BenchmarkId::new("from_mesh", mesh.triangle_count()), &mesh, |b, mesh| {
            b.iter(|| {
                let mut data = LodData::from_mesh(black_box(mesh), false).unwrap();
                EdgeLengthCost.init_collapse_costs(&mut data);
                black_box(data);
            });
        });
    }

    group.finish();
}

fn bench_collapse(c: &mut Criterion) {
    let ratios = [0.3, 0.5, 0.9];
    let mut group = c.benchmark_group("collapse");
    group.sample_size(20);

    for size in [20, 40] {
        let mesh = generate_grid_mesh(size);
        let mut data = LodData::from_mesh(&mesh, false).unwrap();
        EdgeLengthCost.init_collapse_costs(&mut data);
        let vertex_count = data.queued_vertex_count();

        for ratio in ratios {
            let limit = vertex_count - (vertex_count as f32 * ratio) as usize;
            group.bench_with_input(
                BenchmarkId::new(
                    format!("{}v", vertex_count),
                    format!("r{}", (ratio * 100.0) as u32),
                ),
                &limit,
                |b, &limit| {
                    b.iter_batched(
                        || data.clone(),
                        |mut data| {
                            let mut output = IndexBufferOutput::new();
                            LodCollapser::new().collapse(
                                &mut data,
                                &mut EdgeLengthCost,
                                &mut output,
                                limit,
                                f32::INFINITY,
                            );
                            black_box(data)
                        },
                        criterion::BatchSize::LargeInput,
                    );
                },
            );
        }
    }

    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let mesh = generate_grid_mesh(40);
    let config = LodConfig::new()
        .with_level(LodLevel::proportional(100.0, 0.25))
        .with_level(LodLevel::proportional(50.0, 0.5))
        .with_level(LodLevel::proportional(25.0, 0.75));
    let generator = MeshLodGenerator::new();

    let mut group = c.benchmark_group("generate");
    group.sample_size(10);
    group.bench_function("grid_40_three_levels", |b| {
        b.iter(|| {
            let mut output = IndexBufferOutput::new();
            let outcomes = generator
                .generate_lod_levels(black_box(&mesh), &config, &mut EdgeLengthCost, &mut output)
                .unwrap();
            black_box((outcomes, output));
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_collapse, bench_generate);
criterion_main!(benches);
