//! Annotation sources for the three layers
//!
//! Segmentation, dictionary glosses, phonetic transcription and sentence
//! translation all come from collaborators behind small traits. Every lookup
//! returns a [`Lookup`]; [`or_placeholder`] is the one place where a failed
//! lookup becomes an empty cell, so a single miss never aborts a document.

use crate::typography::{Layer, PartOfSpeech, Token, TokenAnnotation};
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use pinyin::ToPinyin;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Why a collaborator produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no entry for {0:?}")]
    Missing(String),
    #[error("{0:?} is on the no-translate list")]
    Excluded(String),
    #[error("backend failure: {0}")]
    Backend(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type Lookup = std::result::Result<String, LookupError>;

/// Uniform degrade policy: a failed lookup becomes an empty string.
pub fn or_placeholder(what: &str, input: &str, lookup: Lookup) -> String {
    match lookup {
        Ok(text) => text,
        Err(err @ (LookupError::Missing(_) | LookupError::Excluded(_) | LookupError::Unsupported(_))) => {
            log::debug!("{} for {:?} left empty: {}", what, input, err);
            String::new()
        }
        Err(err @ LookupError::Backend(_)) => {
            log::warn!("{} for {:?} left empty: {}", what, input, err);
            String::new()
        }
    }
}

pub trait Segmenter {
    fn segment(&self, line: &str) -> std::result::Result<Vec<Token>, LookupError>;
}

pub trait Glossary {
    fn gloss(&self, token: &str) -> Lookup;
}

pub trait Transcriber {
    fn transcribe(&self, token: &str) -> Lookup;
}

pub trait Translator {
    fn translate(&self, text: &str) -> Lookup;
}

/// Map full-width punctuation to ASCII and fold newlines into spaces.
pub fn preprocess(line: &str) -> String {
    let mut normalized = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '“' | '”' => normalized.push('"'),
            '‘' | '’' => normalized.push('\''),
            '—' => normalized.push('-'),
            '…' => normalized.push_str("..."),
            '《' => normalized.push('<'),
            '》' => normalized.push('>'),
            '（' => normalized.push('('),
            '）' => normalized.push(')'),
            '【' => normalized.push('['),
            '】' => normalized.push(']'),
            '、' | '，' => normalized.push(','),
            '。' => normalized.push('.'),
            '：' => normalized.push(':'),
            '；' => normalized.push(';'),
            '？' => normalized.push('?'),
            '！' => normalized.push('!'),
            '\n' => normalized.push(' '),
            _ => normalized.push(ch),
        }
    }
    normalized
}

/// Split source text on the ideographic full stop into normalized sentences.
///
/// A full stop inside closing quotes is moved after them first, so the quote
/// stays with its sentence. Each sentence gets a terminal `.` back.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.replace("。”", "”。")
        .split('。')
        .filter(|piece| !piece.trim().is_empty())
        .map(|piece| format!("{}.", preprocess(piece)))
        .collect()
}

/// Read a no-translate list: one token per line.
pub fn load_no_translate(path: impl AsRef<Path>) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading no-translate list {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Space-separated languages. Tokens keep their leading space, which the
/// literal layer then renders as inter-word spacing.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn segment(&self, line: &str) -> std::result::Result<Vec<Token>, LookupError> {
        Ok(line
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(|word| Token::new(format!(" {}", word), PartOfSpeech::None))
            .collect())
    }
}

/// One token per grapheme cluster, for scripts written without spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphemeSegmenter;

impl Segmenter for GraphemeSegmenter {
    fn segment(&self, line: &str) -> std::result::Result<Vec<Token>, LookupError> {
        Ok(line
            .graphemes(true)
            .filter(|g| !g.trim().is_empty())
            .map(|g| Token::new(g, PartOfSpeech::None))
            .collect())
    }
}

/// Pre-segmented input: whitespace-separated `word/label` pairs, as produced
/// by external part-of-speech taggers. A pair without a label gets `None`.
/// Sentence punctuation glued to a label (the terminal `.` that
/// [`split_sentences`] appends) becomes a token of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaggedSegmenter;

const SENTENCE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

impl Segmenter for TaggedSegmenter {
    fn segment(&self, line: &str) -> std::result::Result<Vec<Token>, LookupError> {
        let mut tokens = Vec::new();
        for pair in line.split_whitespace() {
            let Some((word, label)) = pair.rsplit_once('/') else {
                tokens.push(Token::new(pair, PartOfSpeech::None));
                continue;
            };
            if word.is_empty() {
                return Err(LookupError::Backend(format!("tag without word: {:?}", pair)));
            }

            let bare_label = label.trim_end_matches(SENTENCE_PUNCTUATION);
            tokens.push(Token::new(word, PartOfSpeech::from_label(bare_label)));
            let trailing = &label[bare_label.len()..];
            if !trailing.is_empty() {
                tokens.push(Token::new(trailing, PartOfSpeech::None));
            }
        }
        Ok(tokens)
    }
}

/// Longest-match word segmentation over a word list, for Chinese text.
/// Anything not covered by a listed word falls back to one grapheme per token.
#[derive(Debug, Default, Clone)]
pub struct DictionarySegmenter {
    words: HashSet<String>,
    longest: usize,
}

impl DictionarySegmenter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: HashSet<String> = words.into_iter().map(Into::into).collect();
        let longest = words
            .iter()
            .map(|word| word.graphemes(true).count())
            .max()
            .unwrap_or(1);
        Self { words, longest }
    }

    pub fn from_glossary(glossary: &CedictGlossary) -> Self {
        Self::new(glossary.headwords())
    }
}

impl Segmenter for DictionarySegmenter {
    fn segment(&self, line: &str) -> std::result::Result<Vec<Token>, LookupError> {
        let mut tokens = Vec::new();
        for run in line.split_whitespace() {
            let graphemes: Vec<&str> = run.graphemes(true).collect();
            let mut start = 0;
            while start < graphemes.len() {
                let max_len = self.longest.min(graphemes.len() - start);
                let len = (2..=max_len)
                    .rev()
                    .find(|&len| self.words.contains(&graphemes[start..start + len].concat()))
                    .unwrap_or(1);
                tokens.push(Token::new(graphemes[start..start + len].concat(), PartOfSpeech::None));
                start += len;
            }
        }
        Ok(tokens)
    }
}

/// Dictionary glosses from CC-CEDICT formatted data.
pub struct CedictGlossary {
    entries: HashMap<String, String>,
    no_translate: HashSet<String>,
    fallback: Option<Box<dyn Translator>>,
}

const GLOSS_MAX_CHARS: usize = 10;

impl CedictGlossary {
    /// Parse `trad simp [pin yin] /meaning/.../` lines, keyed by simplified form.
    /// The first meaning is kept; an earlier entry wins over a later duplicate.
    pub fn parse(data: &str) -> Self {
        let mut entries = HashMap::new();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((simplified, meaning)) = parse_cedict_line(line) {
                entries.entry(simplified).or_insert(meaning);
            }
        }
        log::debug!("Parsed {} dictionary entries", entries.len());

        Self {
            entries,
            no_translate: HashSet::new(),
            fallback: None,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading dictionary {}", path.display()))?;
        Ok(Self::parse(&data))
    }

    pub fn with_no_translate(mut self, words: HashSet<String>) -> Self {
        self.no_translate = words;
        self
    }

    /// Translator used for missing words, variants and surnames.
    pub fn with_fallback(mut self, translator: Box<dyn Translator>) -> Self {
        self.fallback = Some(translator);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Simplified headwords, for dictionary-driven segmentation.
    pub fn headwords(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    fn raw_meaning(&self, word: &str) -> Lookup {
        match self.entries.get(word) {
            Some(meaning)
                if !meaning.starts_with("variant of") && !meaning.starts_with("surname") =>
            {
                Ok(meaning.clone())
            }
            _ => match &self.fallback {
                Some(translator) => translator.translate(word),
                None => Err(LookupError::Missing(word.to_string())),
            },
        }
    }
}

impl Glossary for CedictGlossary {
    fn gloss(&self, token: &str) -> Lookup {
        let word = token.trim();
        if self.no_translate.contains(word) {
            return Err(LookupError::Excluded(word.to_string()));
        }
        let meaning = self.raw_meaning(word)?;
        Ok(shorten_gloss(&meaning))
    }
}

fn parse_cedict_line(line: &str) -> Option<(String, String)> {
    let mut heads = line.splitn(3, ' ');
    let _traditional = heads.next()?;
    let simplified = heads.next()?;
    let rest = heads.next()?;
    let definitions = &rest[rest.find('/')? + 1..];
    let first = definitions.split('/').next()?.trim();
    if first.is_empty() {
        return None;
    }
    Some((simplified.to_string(), first.to_string()))
}

/// Reduce a dictionary meaning to a short word-for-word gloss.
fn shorten_gloss(meaning: &str) -> String {
    let mut text = strip_delimited(meaning, '(', ')', false);
    if let Some(rest) = text.strip_prefix("to be ") {
        text = rest.to_string();
    } else if let Some(rest) = text.strip_prefix("to ") {
        text = rest.to_string();
    }

    let mut words = text.split(' ');
    let mut kept = words.next().unwrap_or_default().to_string();
    for word in words {
        let candidate = format!("{} {}", kept, word);
        if candidate.chars().count() > GLOSS_MAX_CHARS {
            break;
        }
        kept = candidate;
    }
    kept.chars().take(GLOSS_MAX_CHARS).collect()
}

/// Remove delimited spans. `shortest` removes each innermost `open..close`
/// pair in turn; otherwise a single span from the first `open` to the last
/// `close` is removed.
fn strip_delimited(text: &str, open: char, close: char, shortest: bool) -> String {
    if !shortest {
        return match (text.find(open), text.rfind(close)) {
            (Some(start), Some(end)) if end > start => {
                format!("{}{}", &text[..start], &text[end + close.len_utf8()..])
            }
            _ => text.to_string(),
        };
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(open) {
        match rest[start..].find(close) {
            Some(offset) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + offset + close.len_utf8()..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// Phonetic transcriptions from a tab-separated `word<TAB>phonetic` table.
#[derive(Debug, Default, Clone)]
pub struct TableTranscriber {
    table: HashMap<String, String>,
}

impl TableTranscriber {
    pub fn parse(data: &str) -> Self {
        let table = data
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(word, phonetic)| (word.trim().to_lowercase(), phonetic.trim().to_string()))
            .filter(|(word, _)| !word.is_empty())
            .collect();
        Self { table }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading phonetic table {}", path.display()))?;
        Ok(Self::parse(&data))
    }
}

impl Transcriber for TableTranscriber {
    fn transcribe(&self, token: &str) -> Lookup {
        if token.trim().is_empty() {
            return Ok(token.to_string());
        }
        let key = token.trim().to_lowercase();
        match self.table.get(&key) {
            Some(phonetic) => Ok(strip_delimited(phonetic, '[', ']', true)),
            None => Err(LookupError::Missing(key)),
        }
    }
}

/// Tone-marked Hanyu Pinyin generated per character. Syllables are joined
/// without spaces and characters without a reading are kept as they are.
#[derive(Debug, Default, Clone, Copy)]
pub struct PinyinTranscriber;

impl Transcriber for PinyinTranscriber {
    fn transcribe(&self, token: &str) -> Lookup {
        if token.trim().is_empty() {
            return Ok(token.to_string());
        }
        let mut reading = String::new();
        let mut found = false;
        for ch in token.trim().chars() {
            match ch.to_pinyin() {
                Some(syllable) => {
                    reading.push_str(syllable.with_tone());
                    found = true;
                }
                None => reading.push(ch),
            }
        }
        if found {
            Ok(reading)
        } else {
            Err(LookupError::Missing(token.trim().to_string()))
        }
    }
}

/// Fixed sentence or word translations, for offline runs and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticTranslator {
    translations: HashMap<String, String>,
}

impl StaticTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.translations.insert(source.into(), target.into());
    }

    /// Read a tab-separated `source<TAB>translation` table. Sources are
    /// normalized like sentences, so `我们走。` matches the line `我们走.`.
    pub fn parse(data: &str) -> Self {
        let translations = data
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .map(|(source, target)| (preprocess(source.trim()), target.trim().to_string()))
            .filter(|(source, target)| !source.is_empty() && !target.is_empty())
            .collect();
        Self { translations }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading translations {}", path.display()))?;
        Ok(Self::parse(&data))
    }

    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
}

impl Translator for StaticTranslator {
    fn translate(&self, text: &str) -> Lookup {
        self.translations
            .get(text)
            .cloned()
            .ok_or_else(|| LookupError::Missing(text.to_string()))
    }
}

/// Annotated form of one sentence, before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSentence {
    pub source: String,
    pub translation: String,
    pub tokens: Vec<TokenAnnotation>,
}

/// Runs the collaborators over a sentence. Absent collaborators leave their
/// layer empty.
pub struct Annotator {
    segmenter: Box<dyn Segmenter>,
    glossary: Option<Box<dyn Glossary>>,
    transcriber: Option<Box<dyn Transcriber>>,
    translator: Option<Box<dyn Translator>>,
}

impl Annotator {
    pub fn new(segmenter: Box<dyn Segmenter>) -> Self {
        Self {
            segmenter,
            glossary: None,
            transcriber: None,
            translator: None,
        }
    }

    pub fn with_glossary(mut self, glossary: Box<dyn Glossary>) -> Self {
        self.glossary = Some(glossary);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Box<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    fn lookup_gloss(&self, token: &str) -> Lookup {
        match &self.glossary {
            Some(glossary) => glossary.gloss(token),
            None => Err(LookupError::Unsupported("no glossary".to_string())),
        }
    }

    fn lookup_phonetic(&self, token: &str) -> Lookup {
        match &self.transcriber {
            Some(transcriber) => transcriber.transcribe(token),
            None => Err(LookupError::Unsupported("no transcriber".to_string())),
        }
    }

    fn lookup_translation(&self, line: &str) -> Lookup {
        match &self.translator {
            Some(translator) => translator.translate(line),
            None => Err(LookupError::Unsupported("no translator".to_string())),
        }
    }

    pub fn annotate_sentence(&self, line: &str) -> AnnotatedSentence {
        let tokens = self.segmenter.segment(line).unwrap_or_else(|err| {
            log::warn!("Segmentation of {:?} failed: {}", line, err);
            Vec::new()
        });

        let translation = or_placeholder("translation", line, self.lookup_translation(line));
        let tokens = tokens
            .iter()
            .map(|token| TokenAnnotation {
                gloss: or_placeholder(Layer::Gloss.name(), token.text(), self.lookup_gloss(token.text())),
                phonetic: or_placeholder(
                    Layer::Phonetic.name(),
                    token.text(),
                    self.lookup_phonetic(token.text()),
                ),
                literal: token.text().to_string(),
                category: token.category(),
            })
            .collect();

        AnnotatedSentence {
            source: line.to_string(),
            translation,
            tokens,
        }
    }
}
