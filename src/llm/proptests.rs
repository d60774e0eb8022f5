//! Property-based tests for provider stream decoding
//!
//! Vendor bodies are split at arbitrary byte offsets (including inside
//! multi-byte characters and inside `\r\n`) and the decoded event sequence
//! must not depend on where the splits fall.

use super::stream::{StreamDecoder, StreamEvent};
use super::testing::{adapter_for, vendor_stream};
use super::Provider;
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_provider() -> impl Strategy<Value = Provider> {
    prop_oneof![Just(Provider::OpenAI), Just(Provider::Anthropic)]
}

/// Deltas with JSON-escaped characters, braces and non-ASCII text
fn arb_deltas() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-zA-Z0-9 ,.!{}\"\\\\\n\u{e9}\u{4e16}\u{1f600}]{1,12}", 0..8)
}

fn arb_newline() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("\n"), Just("\r\n")]
}

fn decode_in_pieces(provider: Provider, body: &[u8], cuts: &[usize]) -> Vec<StreamEvent> {
    let mut decoder = StreamDecoder::new(adapter_for(provider));
    let mut events = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        events.extend(decoder.feed(&body[start..cut]));
        start = cut;
    }
    events.extend(decoder.feed(&body[start..]));
    events.extend(decoder.finish());
    events
}

// ============================================================================
// Chunking invariance
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_chunking_does_not_change_events(
        provider in arb_provider(),
        deltas in arb_deltas(),
        newline in arb_newline(),
        raw_cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..12),
    ) {
        let refs: Vec<&str> = deltas.iter().map(String::as_str).collect();
        let body = vendor_stream(provider, &refs, newline).into_bytes();

        let mut cuts: Vec<usize> = raw_cuts.iter().map(|i| i.index(body.len() + 1)).collect();
        cuts.sort_unstable();

        let whole = decode_in_pieces(provider, &body, &[]);
        let pieces = decode_in_pieces(provider, &body, &cuts);
        prop_assert_eq!(&pieces, &whole);

        let mut expected: Vec<StreamEvent> =
            deltas.iter().cloned().map(StreamEvent::Delta).collect();
        expected.push(StreamEvent::Done);
        prop_assert_eq!(pieces, expected);
    }

    #[test]
    fn prop_byte_at_a_time_matches_whole(
        provider in arb_provider(),
        deltas in arb_deltas(),
    ) {
        let refs: Vec<&str> = deltas.iter().map(String::as_str).collect();
        let body = vendor_stream(provider, &refs, "\n").into_bytes();
        let every_byte: Vec<usize> = (1..body.len()).collect();
        prop_assert_eq!(
            decode_in_pieces(provider, &body, &every_byte),
            decode_in_pieces(provider, &body, &[])
        );
    }
}
