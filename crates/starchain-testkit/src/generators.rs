//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Value};

/// Generate an address. Never contains the challenge delimiter.
pub fn address() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{8,40}".prop_map(String::from)
}

/// Generate a star payload with right ascension, declination and a story.
pub fn star() -> impl Strategy<Value = Value> {
    (0u8..24, 0u8..60, -90i8..=90, 0u8..60, "[ -~]{0,64}").prop_map(
        |(ra_h, ra_m, dec_d, dec_m, story)| {
            json!({
                "ra": format!("{}h {}m", ra_h, ra_m),
                "dec": format!("{}° {}'", dec_d, dec_m),
                "story": story,
            })
        },
    )
}

/// Generate a sequence of `(address, star)` submissions drawn from a small
/// pool of owners, so lookups see repeats.
pub fn submissions(max_len: usize) -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::vec(address(), 1..=3).prop_flat_map(move |owners| {
        let owner = prop::sample::select(owners);
        prop::collection::vec((owner, star()), 0..=max_len)
    })
}
