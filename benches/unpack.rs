//! Benchmark: parse a DDS and unpack a large Grid payload (array + maps), and
//! a sequence of many small rows.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dapclient::{parse_dds, unpack, END_OF_SEQUENCE, START_OF_SEQUENCE};

const TIME: usize = 12;
const LAT: usize = 180;
const LON: usize = 360;

fn grid_dds() -> String {
    format!(
        "Dataset {{ Grid {{ Array: Float32 sst[time = {t}][lat = {y}][lon = {x}]; Maps: Float64 time[time = {t}]; Float32 lat[lat = {y}]; Float32 lon[lon = {x}]; }} sst; }} oisst;",
        t = TIME,
        y = LAT,
        x = LON
    )
}

fn array_header(out: &mut Vec<u8>, n: usize) {
    out.extend((n as u32).to_be_bytes());
    out.extend((n as u32).to_be_bytes());
}

fn grid_payload() -> Vec<u8> {
    let n = TIME * LAT * LON;
    let mut out = Vec::with_capacity(n * 4 + 4096);
    array_header(&mut out, n);
    for i in 0..n {
        out.extend((i as f32 * 0.01).to_be_bytes());
    }
    array_header(&mut out, TIME);
    for i in 0..TIME {
        out.extend((i as f64).to_be_bytes());
    }
    array_header(&mut out, LAT);
    for i in 0..LAT {
        out.extend((i as f32 - 90.0).to_be_bytes());
    }
    array_header(&mut out, LON);
    for i in 0..LON {
        out.extend((i as f32).to_be_bytes());
    }
    out
}

fn sequence_payload(rows: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..rows {
        out.extend(START_OF_SEQUENCE.to_be_bytes());
        out.extend(4u32.to_be_bytes());
        out.extend(b"buoy");
        out.extend((i as i32).to_be_bytes());
        out.extend((i as f64 * 0.5).to_be_bytes());
    }
    out.extend(END_OF_SEQUENCE.to_be_bytes());
    out
}

fn bench_unpack(c: &mut Criterion) {
    let dds = grid_dds();
    let grid = parse_dds(&dds).expect("grid dds");
    let payload = grid_payload();
    c.bench_function("parse_dds_grid", |b| b.iter(|| parse_dds(black_box(&dds))));
    c.bench_function("unpack_grid", |b| b.iter(|| unpack(&grid, black_box(&payload))));

    let seq = parse_dds("Dataset { Sequence { String station; Int32 id; Float64 depth; } obs; } casts;")
        .expect("sequence dds");
    let rows = sequence_payload(10_000);
    c.bench_function("unpack_sequence", |b| b.iter(|| unpack(&seq, black_box(&rows))));
}

criterion_group!(benches, bench_unpack);
criterion_main!(benches);
