use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{imageops, GrayImage, Luma};
use rand::{rngs::StdRng, Rng, SeedableRng};
use vision::{best_score, find_matches, Region, Template};

const SAMPLE_SIZE: usize = 20;

fn noise(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    GrayImage::from_fn(width, height, |_, _| Luma([rng.gen_range(20..250)]))
}

fn bench_find_matches(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching/find_matches");
    group.sample_size(SAMPLE_SIZE);

    let capture = noise(480, 540, 1);
    for size in [16u32, 24, 48] {
        let patch = imageops::crop_imm(&capture, 200, 300, size, size).to_image();
        let template = Template::new(&patch);

        group.bench_with_input(BenchmarkId::from_parameter(size), &template, |b, template| {
            b.iter(|| {
                find_matches(
                    black_box(&capture),
                    template,
                    Region::of(&capture),
                    0.8,
                    0.3,
                )
            })
        });
    }
    group.finish();
}

fn bench_cell_scores(c: &mut Criterion) {
    let board = noise(240, 264, 2);
    let templates: Vec<Template> = (0..14)
        .map(|i| Template::new(&noise(16, 16, 10 + i)))
        .collect();

    c.bench_function("matching/board_cells", |b| {
        b.iter(|| {
            let mut hits = 0;
            for row in 0..10 {
                for col in 0..9 {
                    let window = Region::new(12 + 24 * col, 12 + 24 * row, 24, 24);
                    hits += templates
                        .iter()
                        .filter(|t| {
                            best_score(black_box(&board), t, window).is_some_and(|s| s >= 0.8)
                        })
                        .count();
                }
            }
            hits
        })
    });
}

criterion_group!(benches, bench_find_matches, bench_cell_scores);
criterion_main!(benches);
