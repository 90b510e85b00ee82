use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quakemap::data::generate_simple_world;
use quakemap::feed::{EarthquakeFeature, PlateBoundaryFeature};
use quakemap::layers::{BaseStyle, MapSession, Overlay};
use quakemap::map::{MapRenderer, Viewport};
use quakemap::render::{render_earthquake, render_plate_boundary};
use quakemap::style::{choose_color, marker_size, ColorBy};

fn synthetic_quakes(count: usize) -> Vec<EarthquakeFeature> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            EarthquakeFeature {
                magnitude: (t * 0.37) % 9.5,
                color_value: (t * 0.37) % 9.5,
                place: format!("{i} km N of Somewhere"),
                time_millis: 1_700_000_000_000 + i as i64 * 60_000,
                lon: (t * 7.3) % 360.0 - 180.0,
                lat: (t * 3.1) % 160.0 - 80.0,
                depth: Some(t % 700.0),
            }
        })
        .collect()
}

fn synthetic_plates(count: usize) -> Vec<PlateBoundaryFeature> {
    (0..count)
        .map(|i| {
            let lat = (i as f64 * 11.0) % 140.0 - 70.0;
            PlateBoundaryFeature {
                lines: vec![(0..=72)
                    .map(|s| (s as f64 * 5.0 - 180.0, lat + (s as f64).sin() * 4.0))
                    .collect()],
            }
        })
        .collect()
}

fn bench_styling(c: &mut Criterion) {
    c.bench_function("choose_color_and_size", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for i in 0..1000 {
                let value = i as f64 * 0.011;
                acc += marker_size(black_box(value));
                black_box(choose_color(black_box(value)));
            }
            acc
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let mut renderer = MapRenderer::new();
    generate_simple_world(&mut renderer);

    let mut session = MapSession::new(BaseStyle::Dark, ColorBy::Magnitude);
    session.populate(Overlay::Earthquakes, synthetic_quakes(5000).iter().map(render_earthquake));
    session.populate(
        Overlay::TectonicPlates,
        synthetic_plates(60).iter().map(render_plate_boundary),
    );
    session.attach_overlay(Overlay::TectonicPlates);

    let viewport = Viewport::new(0.0, 0.0, 1.0, 400, 200);
    c.bench_function("render_world_with_overlays", |b| {
        b.iter(|| renderer.render(black_box(&session), black_box(&viewport), 200, 50))
    });

    let zoomed = Viewport::new(140.0, 35.0, 6.0, 400, 200);
    c.bench_function("render_zoomed_with_overlays", |b| {
        b.iter(|| renderer.render(black_box(&session), black_box(&zoomed), 200, 50))
    });
}

criterion_group!(benches, bench_styling, bench_render);
criterion_main!(benches);
