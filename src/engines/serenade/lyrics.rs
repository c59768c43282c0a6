use rand::Rng;

use super::lexicon::{Lexicon, Mood, VerseTemplate};
use crate::{LyricDocument, SongLength};

/// Upper bound on lines in one verse. Keeps the audio plan bounded.
pub const MAX_LINES_PER_VERSE: usize = 4;

/// How a [`SongLength`] shapes the generated song.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthPolicy {
    pub min_verses: usize,
    pub max_verses: usize,
    /// Longest rendering a song of this length may produce, in seconds.
    pub max_duration_secs: f32,
    pub mood: Mood,
}

pub const SHORT_POLICY: LengthPolicy = LengthPolicy {
    min_verses: 1,
    max_verses: 2,
    max_duration_secs: 15.0,
    mood: Mood::Light,
};

pub const MEDIUM_POLICY: LengthPolicy = LengthPolicy {
    min_verses: 2,
    max_verses: 3,
    max_duration_secs: 30.0,
    mood: Mood::Tender,
};

pub const LONG_POLICY: LengthPolicy = LengthPolicy {
    min_verses: 3,
    max_verses: 4,
    max_duration_secs: 55.0,
    mood: Mood::Deep,
};

/// Compose a lyric document for `length` from `lexicon`.
///
/// The lexicon is assumed valid (see [`Lexicon::validate`]). Output varies
/// with `rng`; seed it for reproducible documents.
pub fn compose_lyrics(lexicon: &Lexicon, length: SongLength, rng: &mut impl Rng) -> LyricDocument {
    let policy = length.policy();
    let verse_count = rng.random_range(policy.min_verses..=policy.max_verses);
    let pool = lexicon.verse_pool(policy.mood);

    let refrain = pick_filled(lexicon, &lexicon.refrains, rng);
    let mut verses = Vec::with_capacity(verse_count);
    let mut previous: Option<usize> = None;

    for _ in 0..verse_count {
        let idx = pick_index(pool.len(), previous, rng);
        previous = Some(idx);
        verses.push(fill_verse(lexicon, pool[idx], &refrain, rng));
    }

    let title = pick_filled(lexicon, &lexicon.titles, rng);
    let outro = pick_filled(lexicon, &lexicon.outros, rng);

    log::debug!(
        "Composed {length} lyrics: {verse_count} verses, title {title:?}"
    );

    LyricDocument {
        title,
        verses,
        refrain,
        outro,
    }
}

/// Pick an index in `0..len`, avoiding `previous` whenever there is a choice.
fn pick_index(len: usize, previous: Option<usize>, rng: &mut impl Rng) -> usize {
    match previous {
        Some(prev) if len > 1 => (prev + rng.random_range(1..len)) % len,
        _ => rng.random_range(0..len),
    }
}

fn pick_filled(lexicon: &Lexicon, pool: &[String], rng: &mut impl Rng) -> String {
    let idx = rng.random_range(0..pool.len());
    lexicon.fill(&pool[idx], rng)
}

fn fill_verse(
    lexicon: &Lexicon,
    template: &VerseTemplate,
    refrain: &str,
    rng: &mut impl Rng,
) -> Vec<String> {
    let mut lines: Vec<String> = template
        .iter()
        .take(MAX_LINES_PER_VERSE)
        .map(|line| lexicon.fill(line, rng))
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        let fallback = refrain.lines().next().unwrap_or(refrain).trim();
        lines.push(fallback.to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::serenade::lexicon::hardcoded_lexicon;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_length_produces_a_valid_document() {
        let lexicon = hardcoded_lexicon();
        let mut rng = StdRng::seed_from_u64(42);
        for length in SongLength::ALL {
            for _ in 0..200 {
                let doc = compose_lyrics(&lexicon, length, &mut rng);
                assert_eq!(doc.validate(), Ok(()), "{length}: {doc:?}");
                let policy = length.policy();
                assert!(
                    (policy.min_verses..=policy.max_verses).contains(&doc.verses.len()),
                    "{length}: {} verses",
                    doc.verses.len()
                );
            }
        }
    }

    #[test]
    fn same_seed_gives_same_document() {
        let lexicon = hardcoded_lexicon();
        let a = compose_lyrics(&lexicon, SongLength::Long, &mut StdRng::seed_from_u64(9));
        let b = compose_lyrics(&lexicon, SongLength::Long, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn mean_verse_count_grows_with_length() {
        let lexicon = hardcoded_lexicon();
        let mut rng = StdRng::seed_from_u64(2024);
        let mean = |length: SongLength, rng: &mut StdRng| {
            let total: usize = (0..300)
                .map(|_| compose_lyrics(&lexicon, length, rng).verses.len())
                .sum();
            total as f64 / 300.0
        };
        let short = mean(SongLength::Short, &mut rng);
        let medium = mean(SongLength::Medium, &mut rng);
        let long = mean(SongLength::Long, &mut rng);
        assert!(short <= medium && medium <= long, "{short} {medium} {long}");
    }

    #[test]
    fn consecutive_verses_use_different_templates() {
        let mut lexicon = hardcoded_lexicon();
        lexicon.verses.clear();
        lexicon.shared_verses = vec![vec!["ഒന്ന്".to_string()], vec!["രണ്ട്".to_string()]];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let doc = compose_lyrics(&lexicon, SongLength::Long, &mut rng);
            for pair in doc.verses.windows(2) {
                assert_ne!(pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn verse_that_fills_to_nothing_falls_back_to_refrain() {
        let mut lexicon = hardcoded_lexicon();
        lexicon.verses.clear();
        lexicon.fragments.insert("hush".to_string(), vec![" ".to_string()]);
        lexicon.shared_verses = vec![vec!["{hush}".to_string()]];
        lexicon.refrains = vec!["പ്രണയമേ\nവരൂ".to_string()];

        let doc = compose_lyrics(&lexicon, SongLength::Short, &mut StdRng::seed_from_u64(5));
        assert_eq!(doc.verses[0], vec!["പ്രണയമേ".to_string()]);
    }

    #[test]
    fn pick_index_never_repeats_when_pool_allows() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert_ne!(pick_index(3, Some(1), &mut rng), 1);
        }
        assert_eq!(pick_index(1, Some(0), &mut rng), 0);
    }
}
