//! Generic implementation of transition batches.
use crate::TransitionBatch;
use anyhow::Result;

/// Storage for one component of transitions, e.g. observations or actions.
///
/// A replay buffer allocates one [`BatchBase`] per component with its
/// capacity, writes new data at the ring position and gathers samples by index.
///
/// # Examples
///
/// ```ignore
/// struct VecBatch {
///     data: Vec<f32>,
/// }
///
/// impl BatchBase for VecBatch {
///     fn new(capacity: usize) -> Self {
///         Self { data: vec![0.0; capacity] }
///     }
///
///     fn push(&mut self, ix: usize, data: Self) -> Result<()> {
///         for (j, v) in data.data.into_iter().enumerate() {
///             let k = (ix + j) % self.data.len();
///             self.data[k] = v;
///         }
///         Ok(())
///     }
///
///     fn sample(&self, ixs: &[usize]) -> Result<Self> {
///         Ok(Self { data: ixs.iter().map(|&ix| self.data[ix]).collect() })
///     }
/// }
/// ```
pub trait BatchBase: Sized {
    /// Creates a new batch with the specified capacity.
    fn new(capacity: usize) -> Self;

    /// Writes `data` starting at index `ix`, wrapping around at the capacity.
    fn push(&mut self, ix: usize, data: Self) -> Result<()>;

    /// Gathers the samples at the given indices into a new batch.
    fn sample(&self, ixs: &[usize]) -> Result<Self>;
}

/// A batch of transitions.
///
/// It is the item pushed into [`SimpleReplayBuffer`] as well as the batch
/// returned by it.
///
/// [`SimpleReplayBuffer`]: super::SimpleReplayBuffer
pub struct GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Current observations
    pub obs: O,

    /// Selected actions
    pub act: A,

    /// Next state observations
    pub next_obs: O,

    /// Transition rewards
    pub reward: Vec<f32>,

    /// Episode termination flags
    pub is_terminated: Vec<i8>,

    /// Episode truncation flags
    pub is_truncated: Vec<i8>,
}

impl<O, A> TransitionBatch for GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type ObsBatch = O;
    type ActBatch = A;

    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
    ) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
            self.is_truncated,
        )
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Self::ObsBatch {
        &self.obs
    }

    fn act(&self) -> &Self::ActBatch {
        &self.act
    }
}

impl<O, A> GenericTransitionBatch<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    /// Creates a new batch with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: Vec::with_capacity(capacity),
            is_terminated: Vec::with_capacity(capacity),
            is_truncated: Vec::with_capacity(capacity),
        }
    }
}
