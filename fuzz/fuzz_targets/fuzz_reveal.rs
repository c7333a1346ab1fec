#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use cyberterm_text::{Reveal, RevealMode};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    text: String,
    skip: bool,
    cancel_after: Option<u8>,
}

fuzz_target!(|input: Input| {
    if input.text.len() > 4096 {
        return;
    }
    let mode = if input.skip {
        RevealMode::Skip
    } else {
        RevealMode::Typewriter
    };
    let mut reveal = Reveal::with_mode(input.text.clone(), Duration::from_millis(1), mode);
    let total = reveal.len();
    let mut previous = String::new();
    let mut emitted = 0usize;

    while let Some(prefix) = reveal.next() {
        assert!(input.text.starts_with(&prefix), "every item is a prefix");
        assert!(prefix.len() > previous.len() || (prefix.is_empty() && emitted == 0));
        previous = prefix;
        emitted += 1;
        if input.cancel_after.is_some_and(|n| emitted == usize::from(n)) {
            reveal.cancel();
        }
    }

    assert!(reveal.next().is_none(), "fused after the end");
    if !reveal.is_cancelled() {
        assert_eq!(emitted, total);
        assert_eq!(previous, input.text);
    }
});
