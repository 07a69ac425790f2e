//! Rayo Quick Start Example
//!
//! This example walks the core features in a single file.
//! Run with: cargo run --example quickstart

use rayo::classify::partition;
use rayo::{indirect, Constraint, Simd};

fn main() {
    println!("=== Rayo Quick Start ===\n");

    // 1. Register arithmetic
    println!("1. Register Arithmetic");
    println!("   -------------------");

    let a = Simd::<f64, 4>::from_slice(&[1.0, 2.0, 3.0, 4.0]);
    let b = Simd::<f64, 4>::from_slice(&[5.0, 6.0, 7.0, 8.0]);

    let sum = a + b;
    println!("   a + b        = {:?}", sum);

    let scaled = 2.5 * a;
    println!("   2.5 * a      = {:?}", scaled);

    // Fused multiply-add: one rounding per lane.
    let fused = Simd::<f64, 4>::broadcast(2.0).mul_add(a, b);
    println!("   2*a + b      = {:?}", fused);

    println!("   reduce_add(a) = {}", a.reduce_add());
    println!();

    // 2. Gather and scatter
    println!("2. Indexed Access");
    println!("   --------------");

    let mut table: Vec<f64> = (0..16).map(|i| i as f64 * 10.0).collect();
    let idx = Simd::<i32, 4>::from_slice(&[3, 1, 8, 14]);

    let picked = indirect::<rayo::Native<f64, 4>, _>(&mut table, idx, Constraint::Independent)
        .load();
    println!("   table[{{3,1,8,14}}] = {:?}", picked);

    indirect(&mut table, idx, Constraint::Independent).store(picked + Simd::<f64, 4>::broadcast(1.0));
    println!("   after store-back:  table[3] = {}", table[3]);
    println!();

    // 3. Duplicate-merging accumulation
    println!("3. Scatter-Add With Duplicates");
    println!("   ---------------------------");

    let mut hist = [0.0f64; 8];
    let dup = Simd::<i32, 4>::from_slice(&[2, 2, 2, 5]);
    let val = Simd::<f64, 4>::from_slice(&[1.0, 2.0, 3.0, 4.0]);

    indirect(&mut hist, dup, Constraint::Monotonic).accumulate(val);
    println!("   hist[2] = {} (merged run), hist[5] = {}", hist[2], hist[5]);
    println!();

    // 4. Classifying index batches
    println!("4. Index Classification");
    println!("   --------------------");

    let indices = [4, 4, 4, 4, 0, 2, 5, 9, 1, 1, 2, 6];
    let part = partition(&indices, 4).expect("width divides the batch");
    println!("   constant groups at    {:?}", part.constant);
    println!("   independent groups at {:?}", part.independent);
    println!("   monotonic groups at   {:?}", part.monotonic);
}
