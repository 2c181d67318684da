//! Assembles variable-size host buffers into fixed-size analysis blocks.

use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::HeapRb;

/// Accumulates incoming samples and hands out complete `block_size` blocks.
///
/// At most one block is handed out per push. When a late host buffer
/// completes several blocks at once, only the newest is analysed and the
/// older ones are dropped.
pub struct BlockAssembler {
    rb: HeapRb<f32>,
    block: Vec<f32>,
}

impl BlockAssembler {
    pub fn new(block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            rb: HeapRb::<f32>::new(block_size * 4),
            block: vec![0.0; block_size],
        }
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }

    /// Pushes `samples` and calls `on_block` with the newest complete block,
    /// if any. Returns the number of complete blocks dropped.
    pub fn push(&mut self, samples: &[f32], mut on_block: impl FnMut(&[f32])) -> usize {
        let block_size = self.block.len();
        let mut ready = false;
        let mut dropped = 0;
        let mut rest = samples;

        while !rest.is_empty() {
            let pushed = self.rb.push_slice(rest);
            rest = &rest[pushed..];

            let complete = self.rb.occupied_len() / block_size;
            if complete == 0 {
                continue;
            }
            // A block popped on an earlier pass is superseded by this one
            if ready {
                dropped += 1;
            }
            self.rb.skip((complete - 1) * block_size);
            dropped += complete - 1;
            self.rb.pop_slice(&mut self.block);
            ready = true;
        }

        if ready {
            on_block(&self.block);
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_buffers_are_joined() {
        let mut assembler = BlockAssembler::new(8);
        let mut blocks: Vec<Vec<f32>> = Vec::new();
        for i in 0..5 {
            let chunk: Vec<f32> = (0..3).map(|j| (i * 3 + j) as f32).collect();
            assembler.push(&chunk, |b| blocks.push(b.to_vec()));
        }
        // 15 samples in, one full block of 8 out
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0], (0..8).map(|v| v as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_exact_block_is_not_dropped() {
        let mut assembler = BlockAssembler::new(4);
        let mut count = 0;
        let dropped = assembler.push(&[1.0; 4], |b| {
            assert_eq!(b.len(), 4);
            count += 1;
        });
        assert_eq!(count, 1);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_backlog_keeps_newest_block() {
        let mut assembler = BlockAssembler::new(2);
        let mut seen = Vec::new();
        let input: Vec<f32> = (0..7).map(|v| v as f32).collect();
        let dropped = assembler.push(&input, |b| seen.push(b.to_vec()));
        assert_eq!(seen, vec![vec![4.0, 5.0]]);
        assert_eq!(dropped, 2);

        // The leftover sample starts the next block
        assembler.push(&[7.0], |b| seen.push(b.to_vec()));
        assert_eq!(seen[1], vec![6.0, 7.0]);
    }

    #[test]
    fn test_buffer_larger_than_ring_keeps_newest_block() {
        let mut assembler = BlockAssembler::new(4);
        let mut seen = Vec::new();
        // Ring holds 16 samples; 42 forces several passes
        let input: Vec<f32> = (0..42).map(|v| v as f32).collect();
        let dropped = assembler.push(&input, |b| seen.push(b.to_vec()));
        assert_eq!(seen, vec![vec![36.0, 37.0, 38.0, 39.0]]);
        assert_eq!(dropped, 9);
    }
}
