/// What a node needs to know to render one block.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    /// Audio-clock seconds at the first frame of the block
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            time: 0.0,
        }
    }

    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }
}

/// A mono sound generator the mixer can own as a remix voice.
///
/// Percussion voices implement this: `note_on` (re)starts the hit,
/// `render_block` overwrites `out` with the next samples, and `is_active`
/// turns false once the hit has decayed so the mixer can drop it.
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    fn note_on(&mut self, _ctx: &RenderCtx) {}

    fn is_active(&self) -> bool {
        true
    }
}

impl GraphNode for Box<dyn GraphNode> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        (**self).render_block(out, ctx)
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        (**self).note_on(ctx)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts down a fixed number of samples after each trigger.
    struct Blip {
        remaining: usize,
    }

    impl GraphNode for Blip {
        fn render_block(&mut self, out: &mut [f32], _ctx: &RenderCtx) {
            for sample in out.iter_mut() {
                *sample = if self.remaining > 0 { 1.0 } else { 0.0 };
                self.remaining = self.remaining.saturating_sub(1);
            }
        }

        fn note_on(&mut self, _ctx: &RenderCtx) {
            self.remaining = 3;
        }

        fn is_active(&self) -> bool {
            self.remaining > 0
        }
    }

    #[test]
    fn test_boxed_node_forwards_calls() {
        let ctx = RenderCtx::new(48_000.0).with_time(1.5);
        let mut node: Box<dyn GraphNode> = Box::new(Blip { remaining: 0 });
        assert!(!node.is_active());

        node.note_on(&ctx);
        let mut out = [0.0; 4];
        node.render_block(&mut out, &ctx);

        assert_eq!(out, [1.0, 1.0, 1.0, 0.0]);
        assert!(!node.is_active());
        assert_eq!(ctx.time, 1.5);
    }
}
