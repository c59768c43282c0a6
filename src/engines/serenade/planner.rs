//! Melodic/rhythmic planning: lyric structure in, note/chord timeline out.
//!
//! The planner never looks at the words themselves, only at the shape of the
//! song: which sections exist and how many lines each has. Every line gets
//! the same number of notes and the same number of beats, so the duration of
//! a plan is a pure function of that shape and the tempo.
//!
//! Consumed by synth.rs, which turns the plan into samples.

use crate::LyricDocument;

/// Notes sung per lyric line.
pub const NOTES_PER_LINE: usize = 4;

/// Beats taken by one lyric line.
pub const BEATS_PER_LINE: f32 = 2.0;

/// Rest between consecutive sections, in beats.
pub const SECTION_GAP_BEATS: f32 = 0.5;

pub const DEFAULT_TEMPO_BPM: f32 = 100.0;

/// Longest song the planner will produce. Longer shapes are sped up to fit.
pub const MAX_SONG_SECS: f32 = 55.0;

/// Shortest song the planner will produce. Shorter shapes hold the last note.
pub const MIN_SONG_SECS: f32 = 2.0;

/// Line counts used for the refrain and outro when only verses are known.
const GENERIC_REFRAIN_LINES: usize = 2;
const GENERIC_OUTRO_LINES: usize = 1;

/// Rhythm cells in beats. Each sums to `BEATS_PER_LINE`.
const RHYTHMS: [[f32; NOTES_PER_LINE]; 3] = [
    [0.5, 0.5, 0.5, 0.5],
    [0.75, 0.25, 0.5, 0.5],
    [0.5, 0.25, 0.25, 1.0],
];

/// Closing rhythm for the last line of a section.
const CADENCE: [f32; NOTES_PER_LINE] = [0.25, 0.25, 0.5, 1.0];

/// Base melodic contour as scale degrees.
const MOTIF: [i32; NOTES_PER_LINE] = [0, 1, 2, 1];

/// Per-line transposition, cycled.
const LINE_SHIFTS: [i32; 4] = [0, 1, 2, -1];

/// I-vi-IV-V as semitone offsets from the tonic.
const PROGRESSION: [[i32; 3]; 4] = [[0, 4, 7], [9, 12, 16], [5, 9, 12], [7, 11, 14]];

/// Verse register: D4.
const VERSE_ROOT: u8 = 62;

/// Which part of the song a planned section renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Zero-based verse index.
    Verse(usize),
    Refrain,
    Outro,
}

/// Tone colour for a section's melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timbre {
    /// Soft, mostly fundamental. Verses and outro.
    Flute,
    /// Bright partials with a decaying tail. Refrain.
    Bell,
}

/// Ordered section kinds with their line counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongShape {
    pub sections: Vec<(SectionKind, usize)>,
}

impl SongShape {
    /// Shape of a full document: its verses, its refrain and one outro line.
    pub fn from_document(doc: &LyricDocument) -> Self {
        let mut sections: Vec<(SectionKind, usize)> = doc
            .verses
            .iter()
            .enumerate()
            .map(|(i, verse)| (SectionKind::Verse(i), verse.len().max(1)))
            .collect();
        sections.push((SectionKind::Refrain, doc.refrain_lines().len().max(1)));
        sections.push((SectionKind::Outro, GENERIC_OUTRO_LINES));
        Self { sections }
    }

    /// Shape from verse lines alone, with a generic refrain and outro.
    ///
    /// Blank lines are skipped and verses left with no lines are dropped.
    /// Returns `None` when nothing singable remains.
    pub fn from_verses(verses: &[Vec<String>]) -> Option<Self> {
        let mut sections: Vec<(SectionKind, usize)> = verses
            .iter()
            .map(|verse| verse.iter().filter(|l| !l.trim().is_empty()).count())
            .filter(|&lines| lines > 0)
            .enumerate()
            .map(|(i, lines)| (SectionKind::Verse(i), lines))
            .collect();
        if sections.is_empty() {
            return None;
        }
        sections.push((SectionKind::Refrain, GENERIC_REFRAIN_LINES));
        sections.push((SectionKind::Outro, GENERIC_OUTRO_LINES));
        Some(Self { sections })
    }

    pub fn line_count(&self) -> usize {
        self.sections.iter().map(|&(_, lines)| lines).sum()
    }

    /// Beats needed at any tempo, before the minimum-length stretch.
    pub fn natural_beats(&self) -> f32 {
        let gaps = self.sections.len().saturating_sub(1) as f32;
        self.line_count() as f32 * BEATS_PER_LINE + gaps * SECTION_GAP_BEATS
    }
}

/// A pentatonic scale anchored on a MIDI root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub root_midi: u8,
    pub intervals: &'static [u8],
}

impl Scale {
    /// Mohanam: the Carnatic major pentatonic (S R2 G3 P D2).
    pub fn mohanam(root_midi: u8) -> Self {
        Self {
            root_midi,
            intervals: &[0, 2, 4, 7, 9],
        }
    }

    /// MIDI pitch of a scale degree; degrees wrap into neighbouring octaves.
    pub fn degree_to_midi(&self, degree: i32) -> u8 {
        let len = self.intervals.len() as i32;
        let octave = degree.div_euclid(len);
        let step = self.intervals[degree.rem_euclid(len) as usize] as i32;
        (self.root_midi as i32 + octave * 12 + step).clamp(0, 127) as u8
    }
}

/// Equal-tempered frequency of a MIDI pitch (A4 = 440 Hz).
pub fn midi_to_hz(midi: u8) -> f32 {
    440.0 * 2f32.powf((midi as f32 - 69.0) / 12.0)
}

/// One sung note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub midi: u8,
    /// Start, in beats from the beginning of the song.
    pub start_beats: f32,
    pub duration_beats: f32,
    /// Loudness in `0.0..=1.0`.
    pub velocity: f32,
}

/// A sustained chord under one lyric line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordEvent {
    pub notes: [u8; 3],
    pub start_beats: f32,
    pub duration_beats: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSection {
    pub kind: SectionKind,
    pub timbre: Timbre,
    pub start_beats: f32,
    pub duration_beats: f32,
    pub notes: Vec<NoteEvent>,
    pub chords: Vec<ChordEvent>,
}

/// The full note/tempo/chord timeline for a song.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    /// Effective tempo after any compression to fit the maximum length.
    pub tempo_bpm: f32,
    pub seconds_per_beat: f32,
    pub sections: Vec<PlannedSection>,
    pub total_beats: f32,
}

impl CompositionPlan {
    pub fn duration_secs(&self) -> f32 {
        self.total_beats * self.seconds_per_beat
    }

    pub fn note_count(&self) -> usize {
        self.sections.iter().map(|s| s.notes.len()).sum()
    }
}

/// Plan a full document at the default tempo and length cap.
pub fn plan_composition(doc: &LyricDocument) -> CompositionPlan {
    plan_shape(
        &SongShape::from_document(doc),
        DEFAULT_TEMPO_BPM,
        MAX_SONG_SECS,
    )
}

/// Plan a song shape.
///
/// `tempo_bpm` is the preferred tempo; if the song would run past
/// `max_secs` the beat is shortened until it fits. Songs shorter than
/// [`MIN_SONG_SECS`] have their final note held.
pub fn plan_shape(shape: &SongShape, tempo_bpm: f32, max_secs: f32) -> CompositionPlan {
    let natural_beats = shape.natural_beats();
    let mut seconds_per_beat = 60.0 / tempo_bpm;
    if natural_beats * seconds_per_beat > max_secs {
        seconds_per_beat = max_secs / natural_beats;
        log::debug!(
            "Compressing {natural_beats} beats to fit {max_secs}s ({:.1} BPM)",
            60.0 / seconds_per_beat
        );
    }

    let mut sections = Vec::with_capacity(shape.sections.len());
    let mut cursor = 0.0f32;
    for (index, &(kind, lines)) in shape.sections.iter().enumerate() {
        if index > 0 {
            cursor += SECTION_GAP_BEATS;
        }
        let section = plan_section(kind, index, lines, cursor);
        cursor += section.duration_beats;
        sections.push(section);
    }

    let min_beats = MIN_SONG_SECS / seconds_per_beat;
    if cursor < min_beats {
        let extra = min_beats - cursor;
        if let Some(last) = sections.last_mut() {
            if let Some(note) = last.notes.last_mut() {
                note.duration_beats += extra;
            }
            if let Some(chord) = last.chords.last_mut() {
                chord.duration_beats += extra;
            }
            last.duration_beats += extra;
        }
        cursor = min_beats;
    }

    CompositionPlan {
        tempo_bpm: 60.0 / seconds_per_beat,
        seconds_per_beat,
        sections,
        total_beats: cursor,
    }
}

fn plan_section(kind: SectionKind, index: usize, lines: usize, start_beats: f32) -> PlannedSection {
    let (scale, timbre, velocity) = match kind {
        SectionKind::Verse(_) => (Scale::mohanam(VERSE_ROOT), Timbre::Flute, 0.7),
        SectionKind::Refrain => (Scale::mohanam(VERSE_ROOT + 12), Timbre::Bell, 0.9),
        SectionKind::Outro => (Scale::mohanam(VERSE_ROOT), Timbre::Flute, 0.55),
    };
    let pad_root = VERSE_ROOT as i32 - 12;
    let invert = index % 2 == 1;

    let mut notes = Vec::with_capacity(lines * NOTES_PER_LINE);
    let mut chords = Vec::with_capacity(lines);
    let mut beat = start_beats;

    for line in 0..lines {
        let last_line = line + 1 == lines;
        let rhythm = if last_line {
            CADENCE
        } else {
            RHYTHMS[(line + index) % RHYTHMS.len()]
        };
        let shift = LINE_SHIFTS[line % LINE_SHIFTS.len()];

        let chord = PROGRESSION[line % PROGRESSION.len()];
        chords.push(ChordEvent {
            notes: chord.map(|offset| (pad_root + offset).clamp(0, 127) as u8),
            start_beats: beat,
            duration_beats: BEATS_PER_LINE,
        });

        for (n, &duration) in rhythm.iter().enumerate() {
            let contour = if invert { -MOTIF[n] } else { MOTIF[n] };
            let degree = if last_line && n + 1 == NOTES_PER_LINE {
                // cadence on the tonic
                0
            } else {
                contour + shift
            };
            let accent = if n == 0 { 1.0 } else { 0.85 };
            notes.push(NoteEvent {
                midi: scale.degree_to_midi(degree),
                start_beats: beat,
                duration_beats: duration,
                velocity: velocity * accent,
            });
            beat += duration;
        }
    }

    PlannedSection {
        kind,
        timbre,
        start_beats,
        duration_beats: beat - start_beats,
        notes,
        chords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verses(counts: &[usize]) -> Vec<Vec<String>> {
        counts
            .iter()
            .map(|&n| (0..n).map(|i| format!("വരി {i}")).collect())
            .collect()
    }

    fn doc(counts: &[usize]) -> LyricDocument {
        LyricDocument {
            title: "ഗാനം".to_string(),
            verses: verses(counts),
            refrain: "പ്രണയമേ\nവരൂ".to_string(),
            outro: "ബാക്കി".to_string(),
        }
    }

    #[test]
    fn rhythm_cells_fill_a_line() {
        for cell in RHYTHMS.iter().chain(std::iter::once(&CADENCE)) {
            assert!((cell.iter().sum::<f32>() - BEATS_PER_LINE).abs() < 1e-6);
        }
    }

    #[test]
    fn sections_mirror_the_document() {
        let plan = plan_composition(&doc(&[2, 3]));
        let kinds: Vec<SectionKind> = plan.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Verse(0),
                SectionKind::Verse(1),
                SectionKind::Refrain,
                SectionKind::Outro,
            ]
        );
        assert_eq!(plan.sections[0].notes.len(), 2 * NOTES_PER_LINE);
        assert_eq!(plan.sections[1].notes.len(), 3 * NOTES_PER_LINE);
        assert_eq!(plan.sections[2].notes.len(), 2 * NOTES_PER_LINE);
        assert_eq!(plan.sections[3].notes.len(), NOTES_PER_LINE);
    }

    #[test]
    fn duration_is_proportional_to_lines() {
        let plan = plan_composition(&doc(&[2, 3]));
        // 5 verse lines + 2 refrain + 1 outro, 3 gaps
        let expected_beats = 8.0 * BEATS_PER_LINE + 3.0 * SECTION_GAP_BEATS;
        assert!((plan.total_beats - expected_beats).abs() < 1e-4);
        assert!((plan.duration_secs() - expected_beats * 0.6).abs() < 1e-3);
        assert_eq!(plan.note_count(), 8 * NOTES_PER_LINE);
    }

    #[test]
    fn sections_are_separated_by_the_gap() {
        let plan = plan_composition(&doc(&[1, 1]));
        for pair in plan.sections.windows(2) {
            let end = pair[0].start_beats + pair[0].duration_beats;
            assert!((pair[1].start_beats - end - SECTION_GAP_BEATS).abs() < 1e-5);
        }
    }

    #[test]
    fn refrain_sits_in_a_higher_register_with_its_own_timbre() {
        let plan = plan_composition(&doc(&[4]));
        let verse = &plan.sections[0];
        let refrain = &plan.sections[1];
        assert_eq!(verse.timbre, Timbre::Flute);
        assert_eq!(refrain.timbre, Timbre::Bell);
        let mean = |s: &PlannedSection| {
            s.notes.iter().map(|n| n.midi as f32).sum::<f32>() / s.notes.len() as f32
        };
        assert!(mean(refrain) > mean(verse) + 6.0);
    }

    #[test]
    fn every_section_ends_on_the_tonic() {
        let plan = plan_composition(&doc(&[3, 2, 1]));
        for section in &plan.sections {
            let last = section.notes.last().unwrap();
            assert_eq!(last.midi % 12, VERSE_ROOT % 12, "{:?}", section.kind);
        }
    }

    #[test]
    fn long_shapes_are_compressed_under_the_cap() {
        let shape = SongShape::from_verses(&verses(&[4; 20])).unwrap();
        let plan = plan_shape(&shape, DEFAULT_TEMPO_BPM, MAX_SONG_SECS);
        assert!(plan.duration_secs() <= MAX_SONG_SECS + 1e-3);
        assert!(plan.tempo_bpm > DEFAULT_TEMPO_BPM);
    }

    #[test]
    fn tiny_shapes_are_held_to_the_minimum() {
        let shape = SongShape {
            sections: vec![(SectionKind::Verse(0), 1)],
        };
        let plan = plan_shape(&shape, 200.0, MAX_SONG_SECS);
        assert!((plan.duration_secs() - MIN_SONG_SECS).abs() < 1e-4);
        let last = plan.sections[0].notes.last().unwrap();
        assert!(last.duration_beats > CADENCE[NOTES_PER_LINE - 1]);
    }

    #[test]
    fn from_verses_skips_blank_lines_and_empty_verses() {
        let input = vec![
            vec!["  ".to_string()],
            vec!["ഒന്ന്".to_string(), String::new(), "രണ്ട്".to_string()],
        ];
        let shape = SongShape::from_verses(&input).unwrap();
        assert_eq!(
            shape.sections,
            vec![
                (SectionKind::Verse(0), 2),
                (SectionKind::Refrain, GENERIC_REFRAIN_LINES),
                (SectionKind::Outro, GENERIC_OUTRO_LINES),
            ]
        );
        assert!(SongShape::from_verses(&[]).is_none());
        assert!(SongShape::from_verses(&[vec![" ".to_string()]]).is_none());
    }

    #[test]
    fn scale_degrees_wrap_across_octaves() {
        let scale = Scale::mohanam(62);
        assert_eq!(scale.degree_to_midi(0), 62);
        assert_eq!(scale.degree_to_midi(4), 71);
        assert_eq!(scale.degree_to_midi(5), 74);
        assert_eq!(scale.degree_to_midi(-1), 59);
    }

    #[test]
    fn a4_is_440() {
        assert!((midi_to_hz(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(81) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn same_shape_same_plan() {
        assert_eq!(plan_composition(&doc(&[2, 2])), plan_composition(&doc(&[2, 2])));
    }
}
