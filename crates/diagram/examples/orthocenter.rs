//! Acute triangle plus orthocenter H, circumcenter O and their midpoint M.
//! Two congruences force an equilateral triangle, so after minimization H, O
//! and M coincide.
//!
//! Usage:
//!   cargo run -p diagram --example orthocenter -- [seed]

use diagram::prelude::*;

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2025u64);

    let prog = [
        Instruction::sample("acuteTri", &["A", "B", "C"]),
        Instruction::compute_pts("H", "orthocenter", &["A", "B", "C"]),
        Instruction::compute_pts("O", "circumcenter", &["A", "B", "C"]),
        Instruction::compute_pts("M", "midp", &["H", "O"]),
        Instruction::assert("cong", &["A", "B", "B", "C"]),
        Instruction::assert("cong", &["B", "C", "C", "A"]),
    ];
    let out = match compile(ExprBackend::seeded(seed), &prog, CompileCfg::default()) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("compile failed: {e}");
            return;
        }
    };
    let loss = out.total_loss();
    let report = minimize(&loss, out.backend.variables(), &OptimCfg::default());
    println!("minimizer: {report:?}");
    for (name, p) in out.resolve() {
        println!("{name}: ({:+.6}, {:+.6})", p.x, p.y);
    }
}
