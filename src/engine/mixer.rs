/*
Layer mixer
===========

Two layers feed the output:

  background  the whole source, looping from the moment the remix starts
  remix       the sum of every playing slice or percussion voice

  out = clip( master * (bg_gain * background + remix_gain * remix) )

The fader is a single value f in [0, 1]:

  f = 0.0   bg_gain = 0.0, remix_gain = 1.0   (remix only)
  f = 0.5   bg_gain = 0.5, remix_gain = 0.5
  f = 1.0   bg_gain = 1.0, remix_gain = 0.0   (background only)

Gains change immediately; there is no smoothing ramp. The last stage is a
hard clip at +/-1.0 so a pile-up of overlapping release tails can never
push the device past full scale.

Voices render into a preallocated remix bus, one channel per output
channel. Slices write every channel themselves (wrapping the source's
channels); percussion voices are mono and are copied into each channel.
Finished voices are dropped at the end of each render call.
*/

use std::ops::Range;

use crate::dsp::distortion::{clip_block, FULL_SCALE};
use crate::engine::slice::SliceVoice;
use crate::graph::node::{GraphNode, RenderCtx};
use crate::io::{AudioOutput, SourceBuffer};
use crate::MAX_BLOCK_SIZE;

/// A voice on the remix layer.
pub enum RemixVoice {
    Slice(SliceVoice),
    Drum(Box<dyn GraphNode>),
}

impl RemixVoice {
    fn is_active(&self) -> bool {
        match self {
            RemixVoice::Slice(voice) => voice.is_active(),
            RemixVoice::Drum(node) => node.is_active(),
        }
    }
}

#[derive(Debug, Clone)]
struct BackgroundLoop {
    source: SourceBuffer,
    position: usize,
}

pub struct LayerMixer {
    background: Option<BackgroundLoop>,
    voices: Vec<RemixVoice>,

    background_gain: f32,
    remix_gain: f32,
    master_gain: f32,

    // Scratch, sized once
    bus: Vec<Vec<f32>>,
    drum_buf: Vec<f32>,
}

impl LayerMixer {
    pub fn new(channels: usize) -> Self {
        Self {
            background: None,
            voices: Vec::with_capacity(64),
            background_gain: 0.0,
            remix_gain: 1.0,
            master_gain: 1.0,
            bus: vec![vec![0.0; MAX_BLOCK_SIZE]; channels.max(1)],
            drum_buf: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Apply the layer balance. 0.0 is remix only, 1.0 background only.
    pub fn set_fader(&mut self, fader: f32) {
        let fader = fader.clamp(0.0, 1.0);
        self.background_gain = fader;
        self.remix_gain = 1.0 - fader;
    }

    pub fn set_master(&mut self, volume: f32) {
        self.master_gain = volume.clamp(0.0, 1.0);
    }

    pub fn background_gain(&self) -> f32 {
        self.background_gain
    }

    pub fn remix_gain(&self) -> f32 {
        self.remix_gain
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Loop `source` on the background layer from its first frame.
    pub fn start_background(&mut self, source: SourceBuffer) {
        self.background = Some(BackgroundLoop {
            source,
            position: 0,
        });
    }

    pub fn is_background_playing(&self) -> bool {
        self.background.is_some()
    }

    /// Silence both layers.
    pub fn stop(&mut self) {
        self.background = None;
        self.voices.clear();
    }

    pub fn add_slice(&mut self, voice: SliceVoice) {
        self.voices.push(RemixVoice::Slice(voice));
    }

    /// Trigger `node` and add it to the remix layer.
    pub fn add_drum(&mut self, mut node: Box<dyn GraphNode>, ctx: &RenderCtx) {
        node.note_on(ctx);
        self.voices.push(RemixVoice::Drum(node));
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Render `range` of `output`. Ranges longer than [`MAX_BLOCK_SIZE`] are
    /// split internally.
    pub fn render(&mut self, output: &mut AudioOutput, range: Range<usize>, ctx: &RenderCtx) {
        let mut start = range.start;
        while start < range.end {
            let end = (start + MAX_BLOCK_SIZE).min(range.end);
            self.render_chunk(output, start, end - start, ctx);
            start = end;
        }
    }

    fn render_chunk(&mut self, output: &mut AudioOutput, offset: usize, frames: usize, ctx: &RenderCtx) {
        for channel in &mut self.bus {
            channel[..frames].fill(0.0);
        }

        for voice in &mut self.voices {
            match voice {
                RemixVoice::Slice(slice) => slice.render_into(&mut self.bus, 0..frames, ctx.sample_rate),
                RemixVoice::Drum(node) => {
                    let mono = &mut self.drum_buf[..frames];
                    node.render_block(mono, ctx);
                    for channel in &mut self.bus {
                        for (out, &s) in channel[..frames].iter_mut().zip(mono.iter()) {
                            *out += s;
                        }
                    }
                }
            }
        }
        self.voices.retain(RemixVoice::is_active);

        let bus_channels = self.bus.len();
        for (ch, buffer) in output.buffers.iter_mut().enumerate() {
            let Some(dest) = buffer.get_mut(offset..offset + frames) else {
                continue;
            };
            let remix = &self.bus[ch % bus_channels][..frames];

            for (i, (out, &wet)) in dest.iter_mut().zip(remix).enumerate() {
                let dry = match &self.background {
                    Some(bg) => {
                        let samples = bg.source.channel(ch);
                        samples[(bg.position + i) % samples.len()]
                    }
                    None => 0.0,
                };
                let mixed = self.background_gain * dry + self.remix_gain * wet;
                *out = mixed * self.master_gain;
            }
            clip_block(dest, FULL_SCALE);
        }

        if let Some(bg) = &mut self.background {
            bg.position = (bg.position + frames) % bg.source.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::HEADROOM_GAIN;
    use crate::voices::{DrumKind, DrumPatch};

    const SAMPLE_RATE: u32 = 1_000;

    fn constant(value: f32, frames: usize) -> SourceBuffer {
        SourceBuffer::from_mono(vec![value; frames], SAMPLE_RATE).unwrap()
    }

    fn ctx() -> RenderCtx {
        RenderCtx::new(SAMPLE_RATE as f32)
    }

    #[test]
    fn test_fader_gains() {
        let mut mixer = LayerMixer::new(1);
        mixer.set_fader(0.0);
        assert_eq!((mixer.background_gain(), mixer.remix_gain()), (0.0, 1.0));
        mixer.set_fader(1.0);
        assert_eq!((mixer.background_gain(), mixer.remix_gain()), (1.0, 0.0));
        mixer.set_fader(0.25);
        assert_eq!((mixer.background_gain(), mixer.remix_gain()), (0.25, 0.75));
        mixer.set_fader(3.0);
        assert_eq!(mixer.background_gain(), 1.0);
    }

    #[test]
    fn test_background_loops() {
        let source = SourceBuffer::from_mono(vec![0.1, 0.2, 0.3], SAMPLE_RATE).unwrap();
        let mut mixer = LayerMixer::new(1);
        mixer.set_fader(1.0);
        mixer.start_background(source);

        let mut output = AudioOutput::new(1, 7);
        mixer.render(&mut output, 0..7, &ctx());
        assert_eq!(output.buffers[0], vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1]);
    }

    #[test]
    fn test_layers_sum_under_master() {
        let source = constant(0.5, 100);
        let mut mixer = LayerMixer::new(1);
        mixer.set_fader(0.5);
        mixer.set_master(0.5);
        mixer.start_background(source.clone());
        mixer.add_slice(SliceVoice::new(constant(1.0, 100), 0, 10.0, 0.0, 0.0));

        let mut output = AudioOutput::new(1, 4);
        mixer.render(&mut output, 0..4, &ctx());
        let expected = 0.5 * (0.5 * 0.5 + 0.5 * HEADROOM_GAIN);
        assert!(output.buffers[0].iter().all(|&s| (s - expected).abs() < 1e-6));
    }

    #[test]
    fn test_output_is_clipped() {
        let mut mixer = LayerMixer::new(1);
        mixer.set_fader(1.0);
        mixer.start_background(constant(4.0, 10));

        let mut output = AudioOutput::new(1, 4);
        mixer.render(&mut output, 0..4, &ctx());
        assert!(output.buffers[0].iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_finished_voices_are_dropped() {
        let mut mixer = LayerMixer::new(2);
        mixer.add_slice(SliceVoice::new(constant(1.0, 100), 0, 5.0, 0.0, 0.0));
        mixer.add_drum(DrumPatch::new(DrumKind::HiHat).voice(1), &ctx());
        assert_eq!(mixer.active_voices(), 2);

        let mut output = AudioOutput::new(2, 10);
        mixer.render(&mut output, 0..10, &ctx());
        assert_eq!(mixer.active_voices(), 1, "slice finished, hi-hat still ringing");

        mixer.stop();
        assert_eq!(mixer.active_voices(), 0);
        assert!(!mixer.is_background_playing());
    }

    #[test]
    fn test_drum_reaches_every_channel() {
        let mut mixer = LayerMixer::new(2);
        mixer.add_drum(DrumPatch::new(DrumKind::Kick).voice(9), &ctx());

        let mut output = AudioOutput::new(2, 64);
        mixer.render(&mut output, 0..64, &ctx());
        assert_eq!(output.buffers[0], output.buffers[1]);
        assert!(output.buffers[0].iter().any(|&s| s != 0.0));
    }
}
