/// Context passed to voices during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: Stream time of the first sample in the block, in seconds
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Duration of one sample step in seconds.
    #[inline]
    pub fn dt(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }

    /// Stream time of sample `index` within the block.
    #[inline]
    pub fn sample_time(&self, index: usize) -> f64 {
        self.time + index as f64 * self.dt()
    }

    /// Stream time just past the end of a block of `frames` samples.
    #[inline]
    pub fn block_end(&self, frames: usize) -> f64 {
        self.sample_time(frames)
    }
}
