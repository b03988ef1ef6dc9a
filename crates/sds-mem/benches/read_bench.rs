//! Timestep-loop read throughput with one reused buffer, the access
//! pattern the buffered engine is designed around.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use sds_core::{IoBuffer, SdsType};
use sds_mem::{open, MemStore};

fn timestep_loop(c: &mut Criterion) {
    const STEPS: usize = 64;
    const ROWS: usize = 128;
    const COLS: usize = 128;

    let mut store = MemStore::netcdf();
    let t = store.add_dim("t", STEPS, true);
    let y = store.add_dim("y", ROWS, false);
    let x = store.add_dim("x", COLS, false);
    let vals: Vec<f32> = (0..STEPS * ROWS * COLS).map(|i| i as f32).collect();
    store.add_var(
        "field",
        SdsType::F32,
        &[t, y, x],
        bytemuck::cast_slice(&vals).to_vec(),
    );
    let store = store.into_shared();

    let mut ds = open(&store, "bench.nc");
    let vi = ds.var_index("field").unwrap();

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes((STEPS * ROWS * COLS * 4) as u64));
    group.bench_function("timestep_loop_reused_buffer", |b| {
        b.iter(|| {
            let mut buf = IoBuffer::new();
            let mut acc = 0u64;
            for step in 0..STEPS {
                let slab = ds.read_timestep(vi, &mut buf, step);
                acc = acc.wrapping_add(slab[0] as u64);
            }
            acc
        })
    });
    group.finish();
}

criterion_group!(benches, timestep_loop);
criterion_main!(benches);
