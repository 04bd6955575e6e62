use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use menux_core::{DisplayMetrics, ItemList, MenuKind, MenuLayout, Point, RenderRequest};
use menux_render::{Scene, SkiaRenderer, load_font};
use menux_timing::HighPrecisionTimer;
use pprof::criterion::{Output, PProfProfiler};
use std::time::Duration;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

fn request(kind: MenuKind) -> RenderRequest {
    RenderRequest {
        layout: MenuLayout::new(kind, DisplayMetrics::new(WIDTH, HEIGHT)),
        items: ItemList::from_slashed("Apple/Piano/Cloud/Hammer/Violet/Bridge/Pepper/Rocket"),
        current: Some(3),
        origin: Point::new(640.0, 360.0),
    }
}

fn harness() -> (SkiaRenderer, Vec<u8>) {
    let renderer = SkiaRenderer::new(WIDTH, HEIGHT, load_font(None)).expect("renderer");
    (renderer, vec![0u8; (WIDTH * HEIGHT * 4) as usize])
}

pub fn bench_menu_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("menu_frame");
    group
        .sample_size(50)
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(2));

    for kind in MenuKind::ALL {
        let req = request(kind);
        group.bench_function(kind.as_str(), |b| {
            let (mut renderer, mut fb) = harness();
            let timer = HighPrecisionTimer::new();
            let scene = Scene {
                prompt: Some("Select \"Hammer\" from the menu"),
                progress: Some((12, 108)),
                menu: Some(&req),
                banner: None,
            };
            b.iter(|| {
                let stats = renderer.render_frame(black_box(&scene), &mut fb, &timer);
                let _ = black_box(stats);
            });
        });
    }

    group.bench_function("first_frame", |b| {
        b.iter_batched(
            harness,
            |(mut renderer, mut fb)| {
                let stats =
                    renderer.render_frame(&Scene::default(), &mut fb, &HighPrecisionTimer::new());
                let _ = black_box(stats);
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
        .confidence_level(0.95)
        .noise_threshold(0.02);
    targets = bench_menu_frames
}

criterion_main!(benches);
