use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image_extractor::{Config, ExtractionMode, ExtractionRequest};
use std::time::Duration;
use url::Url;

#[cfg(feature = "integration_benchmarks")]
use image_extractor::ExtractionService;
#[cfg(feature = "integration_benchmarks")]
use tokio::runtime::Runtime;

// Fast settings for all benchmarks
fn configure_fast_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_millis(500));
    group.sample_size(20);
}

fn gallery_html(images: usize) -> String {
    let mut html = String::from("<html><body>");
    for i in 0..images {
        match i % 3 {
            0 => html.push_str(&format!(r#"<img src="/img/{i}.jpg" alt="photo {i}">"#)),
            1 => html.push_str(&format!(r#"<img data-src="lazy/{i}.png">"#)),
            _ => html.push_str(&format!(
                r#"<picture><source srcset="/wide/{i}.webp 1x, /wide/{i}@2x.webp 2x"></picture>"#
            )),
        }
    }
    html.push_str("</body></html>");
    html
}

// === UNIT BENCHMARKS ===

fn benchmark_config_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");
    configure_fast_group(&mut group);

    group.bench_function("creation", |b| {
        b.iter(|| {
            let config = Config::default();
            black_box(config);
        });
    });

    group.bench_function("chrome_args", |b| {
        let config = Config::default();
        b.iter(|| {
            let args = image_extractor::get_chrome_args(&config);
            black_box(args);
        });
    });

    group.finish();
}

fn benchmark_request_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction_request");
    configure_fast_group(&mut group);

    group.bench_function("creation", |b| {
        b.iter(|| {
            let request = ExtractionRequest::new("https://example.com/gallery", ExtractionMode::Auto);
            let _ = black_box(request);
        });
    });

    group.finish();
}

fn benchmark_url_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("url_resolution");
    configure_fast_group(&mut group);

    let base = Url::parse("https://example.com/blog/post/").unwrap();
    let candidates = vec![
        "https://cdn.example.com/a.jpg",
        "/static/b.png",
        "../c.gif",
        "//images.example.com/d.webp",
        "data:image/gif;base64,R0lGODlhAQABAAAAACw=",
    ];

    group.bench_function("resolve", |b| {
        b.iter(|| {
            for raw in &candidates {
                let resolved = image_extractor::resolve_image_url(&base, raw);
                black_box(resolved);
            }
        });
    });

    group.bench_function("validate", |b| {
        b.iter(|| {
            for url in ["https://example.com", "http://example.com/path", "invalid-url"] {
                let result = image_extractor::validate_url(url);
                let _ = black_box(result);
            }
        });
    });

    group.finish();
}

fn benchmark_static_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("static_extraction");
    configure_fast_group(&mut group);

    let base = Url::parse("https://example.com/gallery/").unwrap();
    for size in [10, 100, 1000] {
        let html = gallery_html(size);
        group.bench_function(format!("images_{size}"), |b| {
            b.iter(|| {
                let images = image_extractor::extract_static(&html, &base);
                black_box(images.len());
            });
        });
    }

    group.finish();
}

// === INTEGRATION BENCHMARKS (require Chrome) ===

#[cfg(feature = "integration_benchmarks")]
fn benchmark_dynamic_extraction(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("dynamic_extraction");
    configure_fast_group(&mut group);

    let config = Config {
        navigation_timeout: Duration::from_secs(10),
        ..Default::default()
    };
    let service = ExtractionService::new(config).unwrap();

    group.bench_function("example_com", |b| {
        b.iter(|| {
            rt.block_on(async {
                let result = service.extract_url("https://example.com", true).await;
                black_box(result.is_ok());
            })
        });
    });

    group.finish();
}

// === BENCHMARK GROUPS ===

criterion_group!(
    unit_benches,
    benchmark_config_creation,
    benchmark_request_creation,
    benchmark_url_resolution,
    benchmark_static_extraction,
);

#[cfg(feature = "integration_benchmarks")]
criterion_group!(integration_benches, benchmark_dynamic_extraction);

#[cfg(feature = "integration_benchmarks")]
criterion_main!(unit_benches, integration_benches);

#[cfg(not(feature = "integration_benchmarks"))]
criterion_main!(unit_benches);
