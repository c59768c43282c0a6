use std::f32::consts::PI;

use super::planner::{midi_to_hz, CompositionPlan, Timbre};
use super::wav::MAX_PCM_SAMPLES;
use crate::error::SynthesisError;

/// Peak level after normalisation. Leaves headroom below full scale.
pub const NORMALIZE_PEAK: f32 = 0.9;

/// Loudness of the chord pad relative to a full-velocity melody note.
const PAD_LEVEL: f32 = 0.12;

/// Linear attack/release envelope, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub attack: f32,
    pub release: f32,
}

impl Envelope {
    pub const NOTE: Envelope = Envelope {
        attack: 0.01,
        release: 0.04,
    };

    pub const PAD: Envelope = Envelope {
        attack: 0.08,
        release: 0.1,
    };

    /// Gain at sample `i` of a `len`-sample tone. Starts and ends at zero.
    pub fn gain(&self, i: usize, len: usize, sample_rate: u32) -> f32 {
        if len == 0 {
            return 0.0;
        }
        let sr = sample_rate as f32;
        let attack = (self.attack * sr).max(1.0);
        let release = (self.release * sr).max(1.0);
        let t = i as f32;
        let remaining = (len - 1 - i.min(len - 1)) as f32;
        (t / attack).min(remaining / release).clamp(0.0, 1.0)
    }
}

impl Timbre {
    /// Partials as `(frequency multiple, amplitude)`.
    fn partials(self) -> &'static [(f32, f32)] {
        match self {
            Timbre::Flute => &[(1.0, 1.0), (2.0, 0.3), (3.0, 0.12)],
            Timbre::Bell => &[(1.0, 1.0), (2.0, 0.6), (3.0, 0.25), (4.0, 0.15)],
        }
    }

    /// Exponential decay rate applied over the tone, per second.
    fn decay(self) -> f32 {
        match self {
            Timbre::Flute => 0.0,
            Timbre::Bell => 2.5,
        }
    }
}

/// Render a plan to normalised mono samples at `sample_rate`.
///
/// The buffer holds exactly `round(plan.duration_secs() * sample_rate)`
/// samples.
pub fn render_plan(plan: &CompositionPlan, sample_rate: u32) -> Result<Vec<f32>, SynthesisError> {
    let total = (plan.duration_secs() as f64 * sample_rate as f64).round();
    if !total.is_finite() || total > MAX_PCM_SAMPLES as f64 {
        return Err(SynthesisError::BufferTooLarge {
            samples: total as usize,
        });
    }
    let total = total as usize;
    let mut buffer = vec![0.0f32; total];

    let to_samples = |beats: f32| -> usize {
        (beats as f64 * plan.seconds_per_beat as f64 * sample_rate as f64).round() as usize
    };

    for section in &plan.sections {
        for chord in &section.chords {
            let start = to_samples(chord.start_beats);
            let len = to_samples(chord.duration_beats);
            for &midi in &chord.notes {
                add_tone(
                    &mut buffer,
                    start,
                    len,
                    midi_to_hz(midi),
                    &[(1.0, 1.0)],
                    0.0,
                    PAD_LEVEL / chord.notes.len() as f32,
                    Envelope::PAD,
                    sample_rate,
                );
            }
        }

        for note in &section.notes {
            add_tone(
                &mut buffer,
                to_samples(note.start_beats),
                to_samples(note.duration_beats),
                midi_to_hz(note.midi),
                section.timbre.partials(),
                section.timbre.decay(),
                note.velocity,
                Envelope::NOTE,
                sample_rate,
            );
        }
    }

    normalize(&mut buffer, NORMALIZE_PEAK);
    Ok(buffer)
}

/// Mix one enveloped additive tone into `buffer`, clipped to its bounds.
///
/// Partials at or above Nyquist are skipped, so tones stay band-limited.
#[allow(clippy::too_many_arguments)]
fn add_tone(
    buffer: &mut [f32],
    start: usize,
    len: usize,
    frequency: f32,
    partials: &[(f32, f32)],
    decay: f32,
    amplitude: f32,
    envelope: Envelope,
    sample_rate: u32,
) {
    let end = (start + len).min(buffer.len());
    if start >= end {
        return;
    }
    let len = end - start;
    let sr = sample_rate as f32;
    let nyquist = sr / 2.0;

    let audible: Vec<(f32, f32)> = partials
        .iter()
        .filter(|(mult, _)| frequency * mult < nyquist)
        .map(|&(mult, amp)| (2.0 * PI * frequency * mult / sr, amp))
        .collect();
    if audible.is_empty() {
        return;
    }
    let weight: f32 = audible.iter().map(|(_, amp)| amp).sum();

    for (i, out) in buffer[start..end].iter_mut().enumerate() {
        let t = i as f32;
        let raw: f32 = audible
            .iter()
            .map(|&(omega, amp)| amp * (omega * t).sin())
            .sum::<f32>()
            / weight;
        let tail = if decay > 0.0 { (-decay * t / sr).exp() } else { 1.0 };
        *out += raw * amplitude * tail * envelope.gain(i, len, sample_rate);
    }
}

/// Scale `samples` so the loudest one sits at `peak`. Silence is left alone.
pub fn normalize(samples: &mut [f32], peak: f32) {
    let max = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if max <= f32::EPSILON {
        return;
    }
    let scale = peak / max;
    for s in samples.iter_mut() {
        *s *= scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::serenade::planner::{plan_shape, SectionKind, SongShape, MAX_SONG_SECS};

    fn plan(lines: usize) -> CompositionPlan {
        let shape = SongShape {
            sections: vec![(SectionKind::Verse(0), lines), (SectionKind::Refrain, 1)],
        };
        plan_shape(&shape, 100.0, MAX_SONG_SECS)
    }

    #[test]
    fn buffer_length_matches_planned_duration() {
        let plan = plan(2);
        let samples = render_plan(&plan, 22_050).unwrap();
        let expected = (plan.duration_secs() as f64 * 22_050.0).round() as usize;
        assert_eq!(samples.len(), expected);
    }

    #[test]
    fn output_is_normalised_without_clipping() {
        let samples = render_plan(&plan(3), 16_000).unwrap();
        let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - NORMALIZE_PEAK).abs() < 1e-4, "peak {peak}");
    }

    #[test]
    fn song_starts_and_ends_silent() {
        let samples = render_plan(&plan(1), 22_050).unwrap();
        assert!(samples[0].abs() < 1e-6);
        assert!(samples.last().unwrap().abs() < 0.05);
    }

    #[test]
    fn envelope_ramps_in_and_out() {
        let env = Envelope::NOTE;
        assert_eq!(env.gain(0, 1000, 10_000), 0.0);
        assert_eq!(env.gain(999, 1000, 10_000), 0.0);
        assert_eq!(env.gain(500, 1000, 10_000), 1.0);
        assert!(env.gain(50, 1000, 10_000) < 1.0);
    }

    #[test]
    fn partials_above_nyquist_are_dropped() {
        let mut buffer = vec![0.0f32; 100];
        // 5 kHz fundamental at 8 kHz: only a partial below 4 kHz would sound
        add_tone(&mut buffer, 0, 100, 5_000.0, &[(1.0, 1.0)], 0.0, 1.0, Envelope::NOTE, 8_000);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn tones_past_the_end_are_clipped() {
        let mut buffer = vec![0.0f32; 10];
        add_tone(&mut buffer, 8, 100, 440.0, &[(1.0, 1.0)], 0.0, 1.0, Envelope::NOTE, 8_000);
        add_tone(&mut buffer, 20, 5, 440.0, &[(1.0, 1.0)], 0.0, 1.0, Envelope::NOTE, 8_000);
        assert!(buffer[..8].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn normalize_leaves_silence_alone() {
        let mut silent = vec![0.0f32; 8];
        normalize(&mut silent, 0.9);
        assert!(silent.iter().all(|&s| s == 0.0));

        let mut loud = vec![0.5, -2.0, 1.0];
        normalize(&mut loud, 0.9);
        for (got, want) in loud.iter().zip([0.225, -0.9, 0.45]) {
            assert!((got - want).abs() < 1e-6, "{got} vs {want}");
        }
    }
}
