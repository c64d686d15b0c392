//! Uniform ring replay buffer.
use super::{BatchBase, GenericTransitionBatch, SimpleReplayBufferConfig};
use crate::{error::DeepqError, ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A fixed-capacity replay buffer with uniform sampling.
///
/// Transitions are written at a ring position; once `capacity` transitions
/// have been stored, each new one overwrites the oldest. Batches are drawn
/// independently and uniformly with replacement from the stored transitions
/// using a seeded RNG, so a run is reproducible given the seed.
///
/// # Type Parameters
///
/// * `O` - The type of observations, must implement [`BatchBase`]
/// * `A` - The type of actions, must implement [`BatchBase`]
pub struct SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,
    i: usize,
    size: usize,
    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,
    rng: StdRng,
}

/// Writes `data` into the ring buffer `buf` starting at `i`.
#[inline]
fn push_ring<T: Copy>(buf: &mut [T], i: usize, data: &[T]) {
    let capacity = buf.len();
    for (j, v) in data.iter().enumerate() {
        buf[(i + j) % capacity] = *v;
    }
}

#[inline]
fn gather<T: Copy>(buf: &[T], ixs: &[usize]) -> Vec<T> {
    ixs.iter().map(|&ix| buf[ix]).collect()
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Returns the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn sample_ixs(&mut self, size: usize) -> Vec<usize> {
        (0..size).map(|_| self.rng.gen_range(0..self.size)).collect()
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len();
        if len > self.capacity {
            return Err(DeepqError::InvalidConfig(format!(
                "cannot push {} transitions into a replay buffer of capacity {}",
                len, self.capacity
            ))
            .into());
        }

        let (obs, act, next_obs, reward, is_terminated, is_truncated) = tr.unpack();
        self.obs.push(self.i, obs)?;
        self.act.push(self.i, act)?;
        self.next_obs.push(self.i, next_obs)?;
        push_ring(&mut self.reward, self.i, &reward);
        push_ring(&mut self.is_terminated, self.i, &is_terminated);
        push_ring(&mut self.is_truncated, self.i, &is_truncated);

        self.i = (self.i + len) % self.capacity;
        self.size = (self.size + len).min(self.capacity);

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;

        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        if self.size == 0 {
            return Err(DeepqError::EmptyReplayBuffer.into());
        }
        let ixs = self.sample_ixs(size);

        Ok(Self::Batch {
            obs: self.obs.sample(&ixs)?,
            act: self.act.sample(&ixs)?,
            next_obs: self.next_obs.sample(&ixs)?,
            reward: gather(&self.reward, &ixs),
            is_terminated: gather(&self.is_terminated, &ixs),
            is_truncated: gather(&self.is_truncated, &ixs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::VecBatch;
    use std::collections::HashSet;

    type ReplayBuffer = SimpleReplayBuffer<VecBatch, VecBatch>;

    /// A transition whose fields all carry the value `v`.
    fn transition(v: usize) -> GenericTransitionBatch<VecBatch, VecBatch> {
        GenericTransitionBatch {
            obs: VecBatch(vec![v as f32]),
            act: VecBatch(vec![v as f32]),
            next_obs: VecBatch(vec![v as f32 + 0.5]),
            reward: vec![v as f32],
            is_terminated: vec![(v % 2) as i8],
            is_truncated: vec![0],
        }
    }

    fn buffer(capacity: usize) -> ReplayBuffer {
        ReplayBuffer::build(&SimpleReplayBufferConfig::default().capacity(capacity))
    }

    #[test]
    fn test_len_grows_until_capacity() -> Result<()> {
        let mut buffer = buffer(5);
        assert!(buffer.is_empty());
        for v in 0..3 {
            buffer.push(transition(v))?;
        }
        assert_eq!(buffer.len(), 3);
        for v in 3..20 {
            buffer.push(transition(v))?;
            assert!(buffer.len() <= buffer.capacity());
        }
        assert_eq!(buffer.len(), 5);
        Ok(())
    }

    #[test]
    fn test_overflow_keeps_most_recent() -> Result<()> {
        for capacity in [1, 3, 7, 16] {
            let mut buffer = buffer(capacity);
            let n = capacity * 3 + 2;
            for v in 0..n {
                buffer.push(transition(v))?;
            }
            assert_eq!(buffer.len(), capacity);

            let stored: HashSet<usize> = buffer.reward.iter().map(|&r| r as usize).collect();
            let expected: HashSet<usize> = (n - capacity..n).collect();
            assert_eq!(stored, expected);
            let stored_obs: HashSet<usize> =
                buffer.obs.0.iter().map(|&o| o as usize).collect();
            assert_eq!(stored_obs, expected);
        }
        Ok(())
    }

    #[test]
    fn test_batch_has_requested_size_and_stored_items() -> Result<()> {
        let mut buffer = buffer(8);
        for v in 0..13 {
            buffer.push(transition(v))?;
        }
        let stored: HashSet<usize> = (5..13).collect();

        for batch_size in [1, 4, 8, 32] {
            let batch = buffer.batch(batch_size)?;
            assert_eq!(batch.len(), batch_size);
            let (obs, act, next_obs, reward, is_terminated, _) = batch.unpack();
            for k in 0..batch_size {
                let v = reward[k] as usize;
                assert!(stored.contains(&v));
                // fields of a sampled transition stay aligned
                assert_eq!(obs.0[k], v as f32);
                assert_eq!(act.0[k], v as f32);
                assert_eq!(next_obs.0[k], v as f32 + 0.5);
                assert_eq!(is_terminated[k], (v % 2) as i8);
            }
        }
        Ok(())
    }

    #[test]
    fn test_batch_from_partially_filled_buffer() -> Result<()> {
        let mut buffer = buffer(100);
        for v in 0..4 {
            buffer.push(transition(v))?;
        }
        let batch = buffer.batch(64)?;
        assert!(batch.reward.iter().all(|&r| r < 4.0));
        Ok(())
    }

    #[test]
    fn test_batch_from_empty_buffer_fails() {
        let mut buffer = buffer(10);
        assert!(buffer.batch(1).is_err());
    }

    #[test]
    fn test_sampling_is_reproducible_with_seed() -> Result<()> {
        let mut b1 = buffer(50);
        let mut b2 = buffer(50);
        for v in 0..50 {
            b1.push(transition(v))?;
            b2.push(transition(v))?;
        }
        assert_eq!(b1.batch(16)?.reward, b2.batch(16)?.reward);
        Ok(())
    }
}
