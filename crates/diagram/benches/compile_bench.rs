//! Criterion benchmarks for compilation and loss evaluation.
//! Focus sizes: polygon n in {4, 8, 16}.
//! Results land under target/criterion.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use diagram::prelude::*;

fn polygon_program(n: usize) -> Vec<Instruction> {
    let names: Vec<String> = (0..n).map(|i| format!("P{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut prog = vec![Instruction::sample("polygon", &refs)];
    for i in 0..n {
        let (a, b) = (refs[i], refs[(i + 1) % n]);
        prog.push(Instruction::compute_pts(&format!("M{i}"), "midp", &[a, b]));
    }
    prog.push(Instruction::assert(
        "cong",
        &[refs[0], refs[1], refs[1], refs[2]],
    ));
    prog
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for &n in &[4usize, 8, 16] {
        let prog = polygon_program(n);
        group.bench_with_input(BenchmarkId::new("float", n), &prog, |b, prog| {
            b.iter_batched(
                || FloatBackend::seeded(7),
                |be| compile(be, prog, CompileCfg::default()),
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("expr", n), &prog, |b, prog| {
            b.iter_batched(
                || ExprBackend::seeded(7),
                |be| compile(be, prog, CompileCfg::default()),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient");
    for &n in &[4usize, 8, 16] {
        let prog = polygon_program(n);
        let out = compile(ExprBackend::seeded(7), &prog, CompileCfg::default()).unwrap();
        let loss = out.total_loss();
        let n_vars = out.backend.variables().len();
        group.bench_with_input(BenchmarkId::new("eval", n), &loss, |b, loss| {
            b.iter(|| loss.eval())
        });
        group.bench_with_input(BenchmarkId::new("reverse", n), &loss, |b, loss| {
            b.iter(|| loss.gradient(n_vars))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_gradient);
criterion_main!(benches);
