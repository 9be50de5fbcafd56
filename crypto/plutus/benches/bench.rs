use criterion::{Criterion, black_box, criterion_group, criterion_main};

use progtoken_plutus::{PlutusData, apply_params};

const ISSUE_CODE: &str = "585701010029800aba2aba1aab9eaab9dab9a4888896600264646644b30013370e900218031baa00289919b87375a6012008906400980418039baa0028a504014600c600e002600c004600c00260066ea801a29344d9590011";

pub fn apply_benchmark(c: &mut Criterion) {
    let code = hex::decode(ISSUE_CODE).expect("Should work");
    let params = vec![
        PlutusData::constr(1, vec![PlutusData::bytes([0x11u8; 28])]),
        PlutusData::constr(1, vec![PlutusData::bytes([0x22u8; 28])]),
    ];
    c.bench_function("apply_params", |b| b.iter(|| apply_params(black_box(&code), black_box(&params)).expect("Should work")));
}

pub fn data_benchmark(c: &mut Criterion) {
    let node = PlutusData::constr(
        0,
        vec![
            PlutusData::bytes([0x0bu8; 28]),
            PlutusData::bytes([0xffu8; 27]),
            PlutusData::constr(1, vec![PlutusData::bytes([0xaau8; 28])]),
            PlutusData::constr(1, vec![PlutusData::bytes([0xdeu8; 28])]),
            PlutusData::Bytes(vec![]),
        ],
    );
    let cbor = node.to_cbor();
    c.bench_function("PlutusData::from_cbor", |b| b.iter(|| PlutusData::from_cbor(black_box(&cbor)).expect("Should work")));
}

criterion_group!(benches, apply_benchmark, data_benchmark);
criterion_main!(benches);
