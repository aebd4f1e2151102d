//! Benchmark the per-cycle hot path: decode, compare, header.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use detector_monitor::{
    decode_frame, is_changed, synthesize_header, AcquisitionMetadata, Frame, HeaderFields,
};
use std::io::Cursor;
use tiff::encoder::{colortype, TiffEncoder};

/// Encode a synthetic 32-bit grayscale frame.
fn encoded_frame(width: u32, height: u32, rows_per_strip: u32) -> Vec<u8> {
    let pixels: Vec<u32> = (0..width * height).map(|i| i.wrapping_mul(2654435761) % 65536).collect();
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buffer).expect("encoder");
        let mut image = encoder
            .new_image::<colortype::Gray32>(width, height)
            .expect("image");
        image.rows_per_strip(rows_per_strip).expect("rows per strip");
        image.write_data(&pixels).expect("write");
    }
    buffer.into_inner()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    group.sample_size(20);

    // 1M and 4M pixel modules
    for (width, height) in [(1028, 1062), (2068, 2162)] {
        let encoded = encoded_frame(width, height, 16);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &encoded,
            |b, encoded| b.iter(|| decode_frame(black_box(encoded)).expect("decode")),
        );
    }

    group.finish();
}

fn bench_change_detection(c: &mut Criterion) {
    let previous: Vec<u32> = (0..2068 * 2162).collect();
    let identical = previous.clone();
    let mut last_differs = previous.clone();
    if let Some(last) = last_differs.last_mut() {
        *last += 1;
    }

    c.bench_function("is_changed_identical", |b| {
        b.iter(|| is_changed(black_box(&previous), black_box(&identical)))
    });
    c.bench_function("is_changed_last_pixel", |b| {
        b.iter(|| is_changed(black_box(&previous), black_box(&last_differs)))
    });
}

fn bench_header(c: &mut Criterion) {
    let frame = Frame::new(vec![0; 16], 4, 4).with_resolution(13333.0, 13333.0);
    let metadata = AcquisitionMetadata {
        beam_center_x: 2070.5,
        beam_center_y: 2190.25,
        detector_distance: 0.15,
        incident_energy: 12400.0,
    };
    let fields = HeaderFields::new(&frame, &metadata).expect("fields");

    c.bench_function("synthesize_header", |b| {
        b.iter(|| synthesize_header(black_box(&fields)).expect("header"))
    });
}

criterion_group!(benches, bench_decode, bench_change_detection, bench_header);
criterion_main!(benches);
