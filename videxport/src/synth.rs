/*!
    Synthetic frames and samples for exports without a real renderer.
*/

use std::f32::consts::TAU;

/**
    Solid-color RGBA frames that alternate between two colors every
    `period` frames.
*/
#[derive(Clone, Debug)]
pub struct ColorCycle {
    frames: [Vec<u8>; 2],
    period: u64,
}

impl ColorCycle {
    pub fn new(width: u32, height: u32, colors: [[u8; 4]; 2], period: u64) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            frames: colors.map(|rgba| rgba.repeat(pixels)),
            period: period.max(1),
        }
    }

    pub fn frame(&self, index: u64) -> &[u8] {
        &self.frames[((index / self.period) % 2) as usize]
    }
}

/**
    A sine tone rendered as planar native-endian `f32`, one buffer per
    channel.
*/
#[derive(Clone, Debug)]
pub struct Tone {
    frequency: f32,
    amplitude: f32,
    sample_rate: u32,
    channels: usize,
    position: u64,
}

impl Tone {
    pub fn new(frequency: f32, sample_rate: u32, channels: usize) -> Self {
        Self {
            frequency,
            amplitude: 0.25,
            sample_rate,
            channels,
            position: 0,
        }
    }

    /**
        Render the next `samples` samples and advance.
    */
    pub fn next_block(&mut self, samples: usize) -> Vec<Vec<u8>> {
        let block: Vec<u8> = (0..samples as u64)
            .flat_map(|i| {
                let t = (self.position + i) as f32 / self.sample_rate as f32;
                (self.amplitude * (TAU * self.frequency * t).sin()).to_ne_bytes()
            })
            .collect();
        self.position += samples as u64;
        vec![block; self.channels]
    }

    /// Samples rendered so far, per channel.
    pub fn position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_alternate_by_period() {
        let cycle = ColorCycle::new(2, 2, [[255, 0, 0, 255], [0, 0, 255, 255]], 3);
        assert_eq!(cycle.frame(0).len(), 16);
        assert_eq!(&cycle.frame(2)[..4], &[255, 0, 0, 255]);
        assert_eq!(&cycle.frame(3)[..4], &[0, 0, 255, 255]);
        assert_eq!(&cycle.frame(6)[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn tone_blocks_are_planar_f32() {
        let mut tone = Tone::new(1000.0, 48000, 2);
        let block = tone.next_block(480);
        assert_eq!(block.len(), 2);
        assert_eq!(block[0].len(), 480 * 4);
        assert_eq!(block[0], block[1]);
        assert_eq!(tone.position(), 480);

        let first = f32::from_ne_bytes(block[0][..4].try_into().unwrap());
        assert_eq!(first, 0.0);
        let peak = f32::from_ne_bytes(block[0][48..52].try_into().unwrap());
        assert!((peak - 0.25).abs() < 1e-4);
    }

    #[test]
    fn tone_is_continuous_across_blocks() {
        let mut split = Tone::new(440.0, 44100, 1);
        let mut whole = Tone::new(440.0, 44100, 1);
        let mut joined = split.next_block(100).remove(0);
        joined.extend(split.next_block(100).remove(0));
        assert_eq!(joined, whole.next_block(200).remove(0));
    }
}
