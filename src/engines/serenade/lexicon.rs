use std::collections::HashMap;
use std::path::Path;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::lyrics::MAX_LINES_PER_VERSE;
use crate::error::ConfigError;

/// Emotional colour of a verse template pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Playful, quick imagery for short songs.
    Light,
    /// Gentle longing for medium songs.
    Tender,
    /// Devotion across lifetimes for long songs.
    Deep,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Light, Mood::Tender, Mood::Deep];
}

/// A verse template: one entry per line, each line may contain `{slot}`
/// placeholders that are filled from [`Lexicon::fragments`].
pub type VerseTemplate = Vec<String>;

/// The lexical bank and template store.
///
/// Pure data: pools of fragments keyed by slot name, verse templates keyed by
/// mood plus a shared pool, and the title/refrain/outro pools. Built once and
/// never mutated; the engine shares it through an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub fragments: HashMap<String, Vec<String>>,
    pub titles: Vec<String>,
    pub verses: HashMap<Mood, Vec<VerseTemplate>>,
    #[serde(default)]
    pub shared_verses: Vec<VerseTemplate>,
    pub refrains: Vec<String>,
    pub outros: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        hardcoded_lexicon()
    }
}

impl Lexicon {
    /// Verse templates usable for `mood`: the mood's own pool followed by the
    /// shared pool.
    pub fn verse_pool(&self, mood: Mood) -> Vec<&VerseTemplate> {
        self.verses
            .get(&mood)
            .into_iter()
            .flatten()
            .chain(self.shared_verses.iter())
            .collect()
    }

    /// Fill every `{slot}` in `template` with a random fragment of that slot.
    ///
    /// Unknown slots expand to nothing; [`Lexicon::validate`] rejects them up
    /// front so this only matters for hand-built lexicons.
    pub fn fill(&self, template: &str, rng: &mut impl Rng) -> String {
        let mut out = String::with_capacity(template.len() * 2);
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                out.push_str(&rest[open..]);
                rest = "";
                break;
            };
            let slot = &after[..close];
            match self.fragments.get(slot).and_then(|pool| pool.choose(&mut *rng)) {
                Some(fragment) => out.push_str(fragment),
                None => log::warn!("Lexicon has no fragments for slot {{{slot}}}"),
            }
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        collapse_whitespace(&out)
    }

    /// Check the structural rules every generated document depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (slot, pool) in &self.fragments {
            if pool.is_empty() || pool.iter().any(|f| f.trim().is_empty()) {
                return Err(ConfigError::Lexicon(format!(
                    "fragment pool '{slot}' is empty or contains a blank entry"
                )));
            }
        }

        for (name, pool) in [
            ("titles", &self.titles),
            ("refrains", &self.refrains),
            ("outros", &self.outros),
        ] {
            if pool.is_empty() {
                return Err(ConfigError::Lexicon(format!("'{name}' pool is empty")));
            }
            for entry in pool {
                self.check_line(name, entry)?;
            }
        }

        for mood in Mood::ALL {
            let pool = self.verse_pool(mood);
            if pool.is_empty() {
                return Err(ConfigError::Lexicon(format!(
                    "no verse templates for mood {mood:?} and no shared templates"
                )));
            }
        }

        let all_templates = self
            .verses
            .values()
            .flatten()
            .chain(self.shared_verses.iter());
        for template in all_templates {
            if template.is_empty() || template.len() > MAX_LINES_PER_VERSE {
                return Err(ConfigError::Lexicon(format!(
                    "verse template has {} lines (expected 1..={MAX_LINES_PER_VERSE})",
                    template.len()
                )));
            }
            for line in template {
                self.check_line("verse template", line)?;
            }
        }

        Ok(())
    }

    fn check_line(&self, context: &str, line: &str) -> Result<(), ConfigError> {
        if line.trim().is_empty() {
            return Err(ConfigError::Lexicon(format!("{context}: blank line")));
        }
        let mut rest = line;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                ConfigError::Lexicon(format!("{context}: unclosed placeholder in {line:?}"))
            })?;
            let slot = &after[..close];
            if !self.fragments.contains_key(slot) {
                return Err(ConfigError::Lexicon(format!(
                    "{context}: unknown placeholder {{{slot}}} in {line:?}"
                )));
            }
            rest = &after[close + 1..];
        }
        Ok(())
    }
}

/// Load and validate a lexicon from a JSON file.
pub fn load_lexicon(path: &Path) -> Result<Lexicon, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let lexicon: Lexicon = serde_json::from_str(&content)
        .map_err(|e| ConfigError::Lexicon(format!("Failed to parse JSON: {e}")))?;
    lexicon.validate()?;
    Ok(lexicon)
}

/// Collapse runs of spaces within each line and drop blank lines. Line
/// breaks survive so multi-line refrains keep their shape.
fn collapse_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn pool(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|s| s.to_string()).collect()
}

fn templates(entries: &[&[&str]]) -> Vec<VerseTemplate> {
    entries.iter().map(|lines| pool(lines)).collect()
}

/// Built-in Malayalam love-song bank.
///
/// Used whenever no `lexicon.json` is supplied.
pub fn hardcoded_lexicon() -> Lexicon {
    let fragments: HashMap<String, Vec<String>> = [
        (
            "beloved",
            pool(&["പ്രിയേ", "എൻ ഓമലേ", "സഖീ", "എൻ ജീവനേ", "പൊന്നേ"]),
        ),
        (
            "image",
            pool(&[
                "നിലാവ്",
                "മഴത്തുള്ളി",
                "ഇളംകാറ്റ്",
                "മുല്ലപ്പൂവ്",
                "താരകം",
                "കായലോളം",
            ]),
        ),
        (
            "feeling",
            pool(&["പ്രണയം", "മോഹം", "സ്നേഹം", "വിരഹം", "കിനാവ്"]),
        ),
        (
            "place",
            pool(&["പുഴയോരത്ത്", "മാമരച്ചോട്ടിൽ", "തീരങ്ങളിൽ", "വയലേലകളിൽ"]),
        ),
        (
            "time",
            pool(&["സന്ധ്യയിൽ", "പുലരിയിൽ", "രാവിൽ", "മഴക്കാലത്ത്"]),
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let verses: HashMap<Mood, Vec<VerseTemplate>> = [
        (
            Mood::Light,
            templates(&[
                &["{beloved}, {place} വാ", "{image} പോലെ ചിരിക്കൂ"],
                &["{time} നിൻ മുഖം", "{image} പോൽ തെളിയുന്നു"],
                &["ഒരു കുഞ്ഞു {feeling} പാട്ടായ്", "{place} ഒഴുകി വന്നു"],
            ]),
        ),
        (
            Mood::Tender,
            templates(&[
                &[
                    "{beloved}, നിൻ മിഴിയിൽ",
                    "{image} തിളങ്ങുന്നു",
                    "{time} എൻ ഹൃദയം",
                    "നിന്നെ മാത്രം തേടുന്നു",
                ],
                &["{place} നാം ഒന്നായ്", "{feeling} പൂക്കുമ്പോൾ", "{image} സാക്ഷിയായ്"],
                &["നിൻ സ്വരം {image} പോൽ", "എൻ {feeling} ഉണർത്തുന്നു"],
            ]),
        ),
        (
            Mood::Deep,
            templates(&[
                &[
                    "{time} ഞാൻ കാത്തിരുന്നു",
                    "{place} നിൻ കാൽപ്പാടുകൾ",
                    "{feeling} ആഴക്കടലായ്",
                    "{beloved}, നീ എൻ തീരമായ്",
                ],
                &[
                    "ജന്മങ്ങൾ തോറും {beloved}",
                    "നിൻ {feeling} ഞാൻ തേടും",
                    "{image} മാഞ്ഞാലും",
                    "ഈ ഗാനം മായില്ല",
                ],
                &["{image} പെയ്യും {time}", "{feeling} മാത്രം ബാക്കി"],
            ]),
        ),
    ]
    .into_iter()
    .collect();

    Lexicon {
        fragments,
        titles: pool(&[
            "{feeling} ഗീതം",
            "{time} ഒരു {feeling}",
            "{image} പാടുമ്പോൾ",
            "നിനക്കായ് ഒരു ഗാനം",
        ]),
        verses,
        shared_verses: templates(&[
            &["{beloved}, നീയാണെൻ {feeling}", "{image} പോൽ എൻ ഉള്ളിൽ"],
            &["{time} {place}", "നിൻ ഓർമ്മകൾ മാത്രം"],
        ]),
        refrains: pool(&[
            "നീയെൻ ജീവനിൽ പൂത്തൊരു പ്രണയമേ\nനിന്നോടൊപ്പം ഞാൻ എന്നും",
            "പ്രണയമേ, നീയെൻ പാട്ടായ് വരൂ",
            "ഒരു നിമിഷം കൂടി നിന്നരികിൽ\nഎൻ ഹൃദയം പാടുന്നു",
        ]),
        outros: pool(&[
            "ഈ രാവ് നമുക്കായ് മാത്രം",
            "നിൻ ഓർമ്മയിൽ ഞാൻ ഉറങ്ങട്ടെ",
            "പ്രണയം ഒരു പാട്ടായ് ബാക്കി",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn hardcoded_lexicon_is_valid() {
        hardcoded_lexicon()
            .validate()
            .expect("built-in lexicon should validate");
    }

    #[test]
    fn fill_replaces_every_placeholder() {
        let lexicon = hardcoded_lexicon();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let line = lexicon.fill("{beloved}, {place} {time} {image} {feeling}", &mut rng);
            assert!(!line.contains('{') && !line.contains('}'), "unfilled: {line}");
            assert!(!line.trim().is_empty());
        }
    }

    #[test]
    fn fill_drops_unknown_slots_and_collapses_spaces() {
        let lexicon = hardcoded_lexicon();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(lexicon.fill("നിൻ  {nope}  സ്വരം", &mut rng), "നിൻ സ്വരം");
    }

    #[test]
    fn fill_keeps_refrain_line_breaks() {
        let lexicon = hardcoded_lexicon();
        let mut rng = StdRng::seed_from_u64(2);
        let refrain = lexicon.fill("  {beloved}  വരൂ\n\n  {image} പോലെ ", &mut rng);
        let lines: Vec<&str> = refrain.lines().collect();
        assert_eq!(lines.len(), 2, "{refrain:?}");
        assert!(lines[0].ends_with(" വരൂ") && !lines[0].starts_with(' '));
        assert!(lines[1].ends_with(" പോലെ"));
    }

    #[test]
    fn verse_pool_includes_shared_templates() {
        let lexicon = hardcoded_lexicon();
        let light = lexicon.verse_pool(Mood::Light);
        assert_eq!(
            light.len(),
            lexicon.verses[&Mood::Light].len() + lexicon.shared_verses.len()
        );
    }

    #[test]
    fn rejects_unknown_placeholder() {
        let mut lexicon = hardcoded_lexicon();
        lexicon.outros.push("{moonbeam} മാത്രം".to_string());
        let err = lexicon.validate().unwrap_err();
        assert!(err.to_string().contains("moonbeam"), "{err}");
    }

    #[test]
    fn rejects_overlong_verse_template() {
        let mut lexicon = hardcoded_lexicon();
        lexicon
            .shared_verses
            .push(vec!["ഒന്ന്".to_string(); MAX_LINES_PER_VERSE + 1]);
        assert!(matches!(lexicon.validate(), Err(ConfigError::Lexicon(_))));
    }

    #[test]
    fn rejects_missing_mood_pool_without_shared_fallback() {
        let mut lexicon = hardcoded_lexicon();
        lexicon.shared_verses.clear();
        lexicon.verses.remove(&Mood::Deep);
        assert!(matches!(lexicon.validate(), Err(ConfigError::Lexicon(_))));
    }

    #[test]
    fn loads_lexicon_round_tripped_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        let json = serde_json::to_string_pretty(&hardcoded_lexicon()).unwrap();
        std::fs::write(&path, json).unwrap();

        let loaded = load_lexicon(&path).expect("lexicon should load");
        assert_eq!(loaded.titles, hardcoded_lexicon().titles);
        assert_eq!(loaded.verses.len(), Mood::ALL.len());
    }

    #[test]
    fn load_reports_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_lexicon(&path), Err(ConfigError::Lexicon(_))));
    }
}
