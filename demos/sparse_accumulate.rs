//! Batched scatter-add through offline classification.
//!
//! Builds a large sorted index with heavy duplicate pressure, partitions it
//! into constraint buckets once, then accumulates squared values bucket by
//! bucket. The result is checked against the plain sequential loop.
//!
//! Run with: cargo run --example sparse_accumulate

use rayo::classify::partition;
use rayo::{indirect, Constraint, Simd};

const N: usize = 4096;
const DESTINATIONS: usize = 512;

/// Minimal-standard generator, explicitly seeded for reproducible output.
struct Minstd(u64);

impl Minstd {
    fn next_u32(&mut self) -> u32 {
        self.0 = self.0 * 48271 % 0x7fff_ffff;
        self.0 as u32
    }
}

fn main() {
    let mut rng = Minstd(42);

    let a: Vec<f64> = (0..N)
        .map(|_| f64::from(rng.next_u32()) / f64::from(u32::MAX))
        .collect();
    let mut index: Vec<i32> = (0..N)
        .map(|_| (rng.next_u32() as usize % DESTINATIONS) as i32)
        .collect();
    index.sort_unstable();

    let part = partition(&index, 4).expect("N is a multiple of the register width");
    println!(
        "classified {} groups: {} constant, {} independent, {} monotonic",
        part.len(),
        part.constant.len(),
        part.independent.len(),
        part.monotonic.len()
    );

    let mut out = vec![0.0f64; DESTINATIONS];
    for c in [
        Constraint::Constant,
        Constraint::Independent,
        Constraint::Monotonic,
    ] {
        for &start in part.offsets(c) {
            let va = Simd::<f64, 4>::from_slice(&a[start..]);
            let vi = Simd::<i32, 4>::from_slice(&index[start..]);
            indirect(&mut out, vi, c).accumulate(va * va);
        }
    }

    let mut reference = vec![0.0f64; DESTINATIONS];
    for i in 0..N {
        reference[index[i] as usize] += a[i] * a[i];
    }

    let worst = out
        .iter()
        .zip(&reference)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f64, f64::max);
    println!("max deviation from sequential loop: {worst:.3e}");

    let total: f64 = out.iter().sum();
    println!("total accumulated mass: {total:.6}");
}
