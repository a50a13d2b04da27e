#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use stakemod_checkpoint::CheckpointHistory;
use stakemod_types::BlockHeight;

#[derive(Debug, Arbitrary)]
enum Op {
    Write { block: u16, value: u128 },
    Read { block: u16 },
}

// Arbitrary write/read sequences: writes either succeed in order or are
// rejected, and reads agree with the last accepted write at or before them.
fuzz_target!(|ops: Vec<Op>| {
    let mut history = CheckpointHistory::new();
    let mut accepted: Vec<(u16, u128)> = Vec::new();

    for op in ops {
        match op {
            Op::Write { block, value } => {
                if history.write(value, BlockHeight::new(block as u64)).is_ok() {
                    match accepted.last_mut() {
                        Some(last) if last.0 == block => last.1 = value,
                        _ => accepted.push((block, value)),
                    }
                }
            }
            Op::Read { block } => {
                let expected = accepted
                    .iter()
                    .rev()
                    .find(|(b, _)| *b <= block)
                    .map(|(_, v)| *v)
                    .unwrap_or(0);
                assert_eq!(history.value_at(BlockHeight::new(block as u64)), expected);
            }
        }
    }
    assert_eq!(history.len(), accepted.len());
});
