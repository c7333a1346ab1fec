#![no_main]

use cyberterm_shell::{CommandTable, Interpreter, Outcome, TranscriptEntry};
use libfuzzer_sys::fuzz_target;

const CAPACITY: usize = 16;

fuzz_target!(|data: &[u8]| {
    if data.len() > 16 * 1024 {
        return;
    }
    let text = String::from_utf8_lossy(data);
    let mut interpreter = Interpreter::new(CommandTable::default(), CAPACITY);

    for line in text.split('\n') {
        let before = interpreter.transcript().len();
        let outcome = interpreter.submit(line);

        assert!(interpreter.transcript().len() <= CAPACITY);
        match outcome {
            Outcome::Ignored => {
                assert!(line.trim().is_empty());
                assert_eq!(interpreter.transcript().len(), before);
            }
            Outcome::Cleared => assert!(interpreter.transcript().is_empty()),
            Outcome::Responded(lines) => {
                let mut rows = interpreter.transcript().iter().rev();
                assert_eq!(
                    rows.next().and_then(TranscriptEntry::response_lines),
                    Some(lines.as_slice())
                );
                assert_eq!(
                    rows.next().and_then(TranscriptEntry::command_text),
                    Some(line.trim())
                );
            }
            Outcome::Rejected => panic!("a bare interpreter never rejects input"),
        }
    }
});
