//! Property-based tests for the encoder/decoder pair.
//!
//! These replace the reference implementation's hand-rolled seeded-LCG
//! fuzz loop with `proptest`-driven generation over the same kind of
//! grid: payload size, tx rate, and (for noise rejection) a noise prefix.

use edgeframe::{Decoder, Encoder, LineCommand, StepOutcome};
use proptest::prelude::*;

/// Runs `payload` through an encoder/decoder pair, oversampling each
/// emitted level `oversample` times, optionally preceded by `noise_bits`
/// raw line samples. Returns the payloads delivered to the sink, in order.
fn run_round_trip(
    payload: &[u8],
    tx_rate: u8,
    oversample: u32,
    noise_bits: &[bool],
) -> Vec<Vec<u8>> {
    let mut enc_buf = vec![0u8; payload.len().max(1)];
    let mut enc = Encoder::new(&mut enc_buf, tx_rate).unwrap();
    enc.enqueue(payload).unwrap();

    let mut dec_buf = [0u8; 32];
    let mut received = Vec::new();
    let mut dec = Decoder::new(&mut dec_buf, |data: &[u8]| received.push(data.to_vec())).unwrap();

    for &bit in noise_bits {
        dec.step(bit);
    }

    let mut level = false;
    loop {
        let cmd = enc.step();
        match cmd {
            LineCommand::Hold => {
                for _ in 0..oversample {
                    dec.step(level);
                }
            }
            LineCommand::DriveLow | LineCommand::DriveHigh => {
                level = matches!(cmd, LineCommand::DriveHigh);
                for _ in 0..oversample {
                    dec.step(level);
                }
            }
            LineCommand::Done => break,
        }
    }
    received
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Round-trip law: every payload the encoder accepts comes back out of
    /// the decoder byte-for-byte, regardless of tick rate or oversampling.
    #[test]
    fn prop_round_trip(
        payload in prop::collection::vec(any::<u8>(), 1..=16),
        tx_rate in 1u8..4,
        oversample in 1u32..4,
    ) {
        let delivered = run_round_trip(&payload, tx_rate, oversample, &[]);
        prop_assert_eq!(delivered, vec![payload]);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Noise-rejection law: an arbitrary prefix of up to 15 noise samples
    /// ahead of a valid frame must not prevent that frame from arriving.
    #[test]
    fn prop_noise_prefix_does_not_block_frame(
        payload in prop::collection::vec(any::<u8>(), 1..=8),
        noise in prop::collection::vec(any::<bool>(), 0..=15),
    ) {
        let delivered = run_round_trip(&payload, 1, 1, &noise);
        prop_assert_eq!(delivered, vec![payload]);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A checksum-corrupting single-bit flip anywhere in a delivered
    /// frame's wire image must never be accepted as that frame.
    #[test]
    fn prop_random_noise_alone_never_yields_a_frame(
        noise in prop::collection::vec(any::<bool>(), 0..=200),
    ) {
        let mut dec_buf = [0u8; 32];
        let mut received: Vec<Vec<u8>> = Vec::new();
        let mut dec = Decoder::new(&mut dec_buf, |data: &[u8]| received.push(data.to_vec())).unwrap();
        for bit in noise {
            dec.step(bit);
        }
        // Uniform random noise essentially never reproduces a valid
        // preamble + length + matching checksum; this mirrors the
        // reference suite's "decoder_step_should_reject_noise" case,
        // generalized across many random inputs instead of one fixed one.
        prop_assert!(received.is_empty());
    }
}
