extern crate criterion;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use ntsc_artifacts::{NtscConfig, NtscProcessor, settings::RingingAlgorithm};
#[cfg(not(target_os = "windows"))]
use pprof::criterion::{Output, PProfProfiler};

fn bench_image() -> RgbImage {
    RgbImage::from_fn(640, 480, |x, y| {
        Rgb([
            (x * 255 / 639) as u8,
            (y * 255 / 479) as u8,
            ((x ^ y) & 0xff) as u8,
        ])
    })
}

fn criterion_benchmark(c: &mut Criterion) {
    let img = bench_image();

    c.bench_function("default effect", |b| {
        let mut processor = NtscProcessor::new(NtscConfig::default());
        b.iter(|| black_box(processor.process(&img)));
    });

    c.bench_function("vhs effect", |b| {
        let mut config = NtscConfig::named_preset("vhs");
        config.vhs_head_switching = true;
        config.video_chroma_noise = 200;
        let mut processor = NtscProcessor::new(config);
        b.iter(|| black_box(processor.process(&img)));
    });

    c.bench_function("spectral ringing", |b| {
        let mut config = NtscConfig::default();
        config.ringing = 0.5;
        config.ringing_algorithm = RingingAlgorithm::Spectral;
        config.freq_noise_size = 0.6;
        let mut processor = NtscProcessor::new(config);
        b.iter(|| black_box(processor.process(&img)));
    });
}

criterion_group! {
    name = benches;
    config = {
        #[cfg(not(target_os="windows"))]
        let config =
            Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
        #[cfg(target_os="windows")]
        let config = Criterion::default();

        config
    };
    targets = criterion_benchmark
}
criterion_main!(benches);
