use criterion::{criterion_group, criterion_main, Criterion, black_box};
use cozy_chess::Board;
use valuebot::encoder::encode_position;
use valuebot::network::ValueNet;
use valuebot::search::select_move;

fn bench_encode(c: &mut Criterion) {
    let b = Board::default();
    c.bench_function("encode_startpos", |ben| {
        ben.iter(|| black_box(encode_position(black_box(&b))))
    });
}

fn bench_select(c: &mut Criterion) {
    let b = Board::default();
    let net = ValueNet::seeded(1);
    c.bench_function("select_move_startpos", |ben| {
        ben.iter(|| {
            let sel = select_move(black_box(&b), &net);
            black_box(sel.ok())
        })
    });
}

criterion_group!(benches, bench_encode, bench_select);
criterion_main!(benches);
