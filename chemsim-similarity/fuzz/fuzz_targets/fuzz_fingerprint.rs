#![no_main]
use libfuzzer_sys::fuzz_target;

use chemsim_similarity::{Fingerprint, FingerprintType, SimilarityEngine, SimilarityMetric};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }
    let fp_type = FingerprintType::ALL[data[0] as usize % FingerprintType::ALL.len()];
    let radius = u32::from(data[1] % 8);
    let payload = &data[2..];
    let num_bits = payload.len() * 8 - usize::from(data[1] >> 5);

    let engine = SimilarityEngine::new();
    let Ok(bits) = Fingerprint::bit_vector(fp_type, payload, num_bits, radius) else {
        return;
    };
    for metric in SimilarityMetric::ALL {
        if let Ok(score) = engine.score(&bits, &bits, metric) {
            assert!((0.0..=1.0).contains(&score));
        }
    }
    if let Ok(counts) = Fingerprint::count_vector(fp_type, payload, num_bits, radius) {
        for metric in SimilarityMetric::ALL {
            let _ = engine.score(&bits, &counts, metric);
            let _ = engine.score(&counts, &counts, metric);
        }
    }
});
