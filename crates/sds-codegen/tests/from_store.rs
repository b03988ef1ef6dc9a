//! Generating code from a dataset opened through a live backend.

use sds_core::SdsType;
use sds_mem::{open, MemAtt, MemStore};

#[test]
fn generated_code_reflects_an_opened_file() {
    let mut store = MemStore::netcdf();
    let t = store.add_dim("time", 5, true);
    let x = store.add_dim("x", 8, false);
    store.add_global_att(MemAtt::text("institution", "test lab"));
    let wind: Vec<f32> = vec![0.0; 40];
    store.add_var(
        "u",
        SdsType::F32,
        &[t, x],
        bytemuck::cast_slice(&wind).to_vec(),
    );
    store.add_var(
        "v",
        SdsType::F32,
        &[t, x],
        bytemuck::cast_slice(&wind).to_vec(),
    );
    let mut ds = open(&store.into_shared(), "wind.nc");

    let mut out = Vec::new();
    sds_codegen::generate_f90(&mut ds, true, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("nf90_open(\"wind.nc\""));
    assert!(text.contains("real*4, dimension(8,5) :: u, v"));
    assert!(text.contains("nf90_get_att(ncid, NF90_GLOBAL, \"institution\", institution)"));
}
