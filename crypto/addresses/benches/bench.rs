use criterion::{Criterion, black_box, criterion_group, criterion_main};

use progtoken_addresses::{Address, Credential, NetworkId};

pub fn encode_benchmark(c: &mut Criterion) {
    c.bench_function("Address::to_string", |b| {
        let address = Address::base(
            NetworkId::Mainnet,
            Credential::PubKey("9493315cd92eb5d8c4304e67b7e16ae36d61d34502694657811a2c8e".parse().expect("Should work")),
            Credential::PubKey("337b62cfff6403a06a3acbc34f8c46003c69fe79a3628cefa9c47251".parse().expect("Should work")),
        );
        b.iter(|| -> String { black_box(address).to_string() })
    });
}

pub fn decode_benchmark(c: &mut Criterion) {
    c.bench_function("str::parse::<Address>", |b| {
        // cspell:disable-next-line
        let address = "addr1qx2fxv2umyhttkxyxp8x0dlpdt3k6cwng5pxj3jhsydzer3n0d3vllmyqwsx5wktcd8cc3sq835lu7drv2xwl2wywfgse35a3x";
        b.iter(|| -> Address { black_box(address).parse().expect("Should work") })
    });
}

criterion_group!(benches, encode_benchmark, decode_benchmark);
criterion_main!(benches);
