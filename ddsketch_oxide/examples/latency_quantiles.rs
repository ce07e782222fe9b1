//! Latency monitoring demo: per-shard sketches merged at query time
//!
//! Simulates the pattern DDSketch is designed for: several workers each
//! sketch their own request latencies, and an aggregator merges the shards
//! to answer fleet-wide percentile queries with bounded memory.

use ddsketch_oxide::{DDSketch, Sketch, SketchError};

fn main() -> Result<(), SketchError> {
    println!("=== ddsketch_oxide: fleet latency percentiles ===\n");

    // Each worker keeps a capped sketch: at most 1024 live bins no matter
    // how long the tail grows.
    let mut shards: Vec<DDSketch> = (0..4)
        .map(|_| DDSketch::collapsing_lowest(0.01, 1024))
        .collect::<Result<_, _>>()?;

    // Synthetic latencies in milliseconds: a fast common path plus an
    // occasional slow tail, different per shard.
    for (shard_id, shard) in shards.iter_mut().enumerate() {
        for i in 0..100_000u32 {
            let base = 2.0 + (shard_id as f64) * 0.5;
            let jitter = f64::from(i % 97) * 0.03;
            let tail = if i % 1000 == 0 { 250.0 } else { 0.0 };
            shard.add(base + jitter + tail)?;
        }
    }

    // Aggregate: merge every shard into one sketch.
    let mut fleet = DDSketch::collapsing_lowest(0.01, 1024)?;
    for shard in &shards {
        fleet.merge(shard)?;
    }

    println!("samples ingested: {}", fleet.count());
    println!("live bins:        {}", fleet.bin_count());
    println!("mean latency:     {:.2} ms", fleet.avg()?);
    println!();

    for q in [0.50, 0.90, 0.99, 0.999] {
        println!("p{:<5} = {:>8.2} ms", q * 100.0, fleet.quantile(q)?);
    }
    println!(
        "min = {:.2} ms, max = {:.2} ms",
        fleet.quantile(0.0)?,
        fleet.quantile(1.0)?
    );

    // Ship the aggregate elsewhere: the byte form rebuilds an identical
    // sketch on the other side.
    let bytes = fleet.serialize();
    let restored = DDSketch::deserialize(&bytes)?;
    println!(
        "\nserialized {} bytes; restored p99 = {:.2} ms",
        bytes.len(),
        restored.quantile(0.99)?
    );

    Ok(())
}
