// Interactive simulator for the suggestion fusion pipeline.
//
// Loads one word list per locale as a main dictionary, wires up in-memory
// user/history dictionaries, and runs a read-eval loop: type a word to see
// the fused suggestions and the autocorrect decision, commit words to
// watch language confidences shift.

use anyhow::{bail, Context, Result};
use clap::Parser;
use libsuggest_core::{
    Blacklist, Candidate, ComposedInput, Dictionary, DictionaryError, DictionaryFacilitator,
    DictionaryFactory, DictionaryKind, InMemoryLearnableDictionary, InputStyle,
    LearnableDictionary, Locale, NgramContext, SettingsSnapshot, Suggest, WordListDictionary,
};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "suggest_sim", about = "Drive the suggestion fusion pipeline from a terminal")]
struct Args {
    /// Word lists as locale=path pairs, e.g. en=words_en.txt (first is primary)
    #[arg(required = true, value_parser = parse_dict_arg)]
    dictionaries: Vec<(String, PathBuf)>,

    /// Directory for persistent per-locale blacklists
    #[arg(long)]
    blacklist_dir: Option<PathBuf>,

    /// Normalized-score autocorrection threshold
    #[arg(long, default_value_t = 0.185)]
    threshold: f32,
}

fn parse_dict_arg(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((locale, path)) if !locale.is_empty() && !path.is_empty() => {
            Ok((locale.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected locale=path, got {arg:?}")),
    }
}

struct SimFactory {
    word_lists: HashMap<Locale, PathBuf>,
    secondary: Vec<Locale>,
    blacklist_dir: Option<PathBuf>,
    // keep learned dictionaries alive across rebuilds
    subs: Mutex<HashMap<(DictionaryKind, Locale), Arc<InMemoryLearnableDictionary>>>,
}

impl DictionaryFactory for SimFactory {
    fn create_main(&self, locale: &Locale) -> Result<Arc<dyn Dictionary>, DictionaryError> {
        let Some(path) = self.word_lists.get(locale) else {
            return Err(DictionaryError::NotAvailable(locale.clone()));
        };
        let text = std::fs::read_to_string(path)?;
        let dict = WordListDictionary::from_word_list(locale.clone(), &text)?;
        Ok(Arc::new(dict))
    }

    fn create_sub(
        &self,
        kind: DictionaryKind,
        locale: &Locale,
    ) -> Option<Arc<dyn LearnableDictionary>> {
        if !matches!(kind, DictionaryKind::User | DictionaryKind::UserHistory) {
            return None;
        }
        let mut subs = self.subs.lock().expect("sim factory lock");
        let dict = subs
            .entry((kind, locale.clone()))
            .or_insert_with(|| Arc::new(InMemoryLearnableDictionary::new(kind, locale.clone())))
            .clone();
        Some(dict)
    }

    fn secondary_locales(&self, _main: &Locale) -> Vec<Locale> {
        self.secondary.clone()
    }

    fn blacklist_for(&self, locale: &Locale) -> Arc<Blacklist> {
        match &self.blacklist_dir {
            Some(dir) => Arc::new(Blacklist::persistent(
                &dir.join(format!("{}.redb", locale.tag())),
            )),
            None => Arc::new(Blacklist::in_memory()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();
    let primary = Locale::new(args.dictionaries[0].0.clone());
    let factory = Arc::new(SimFactory {
        word_lists: args
            .dictionaries
            .iter()
            .map(|(locale, path)| (Locale::new(locale.clone()), path.clone()))
            .collect(),
        secondary: args.dictionaries[1..]
            .iter()
            .map(|(locale, _)| Locale::new(locale.clone()))
            .collect(),
        blacklist_dir: args.blacklist_dir.clone(),
        subs: Mutex::new(HashMap::new()),
    });

    let mut settings = SettingsSnapshot::for_locale(primary.tag());
    settings.autocorrect_threshold = args.threshold;

    let facilitator = Arc::new(DictionaryFacilitator::new(factory));
    facilitator.reset_dictionaries(&primary, &settings, false, None);
    if !facilitator.wait_for_loading_main_dictionaries(Duration::from_secs(10)) {
        bail!("timed out loading main dictionaries");
    }
    let suggest = Suggest::new(facilitator.clone());

    println!("loaded {} dictionaries; primary locale {primary}", args.dictionaries.len());
    println!("commands: <word> | commit <word> | remove <word> | predict | confidences | stats | quit");

    let mut context = NgramContext::beginning_of_sentence();
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line.context("reading stdin")?;
        let line = line.trim();
        match line.split_once(' ').map_or((line, ""), |(a, b)| (a, b)) {
            ("quit", _) | ("exit", _) => break,
            ("", _) => continue,
            ("confidences", _) => {
                println!(
                    "{}",
                    facilitator
                        .locales_and_confidences()
                        .unwrap_or_else(|| "single language".into())
                );
            }
            ("stats", _) => println!("{}", facilitator.dump_stats_json()),
            ("remove", word) if !word.is_empty() => {
                facilitator.remove_word(word);
                println!("removed {word:?}");
            }
            ("commit", word) if !word.is_empty() => {
                facilitator.add_to_user_history(word, false, &context, 0, &settings);
                context = context.next(word);
                println!("committed {word:?}");
            }
            ("predict", _) => {
                let words = suggest.get_suggested_words(
                    &ComposedInput::empty(),
                    &context,
                    &settings,
                    true,
                    InputStyle::Typing,
                    0,
                );
                print_suggestions(&words.suggestions);
            }
            (word, _) => {
                let words = suggest.get_suggested_words(
                    &ComposedInput::typing(word),
                    &context,
                    &settings,
                    true,
                    InputStyle::Typing,
                    0,
                );
                if let Some(correction) = words.auto_correction() {
                    println!("autocorrect -> {:?}", correction.word);
                }
                println!(
                    "typed word valid: {}",
                    if words.is_typed_word_valid { "yes" } else { "no" }
                );
                print_suggestions(&words.suggestions);
            }
        }
    }
    facilitator.close_dictionaries();
    Ok(())
}

fn print_suggestions(suggestions: &[Candidate]) {
    for (i, c) in suggestions.iter().take(8).enumerate() {
        println!(
            "  {i}. {:<20} {:>12} {} {}",
            c.word, c.score, c.source, c.source_locale
        );
    }
    if suggestions.is_empty() {
        println!("  (no suggestions)");
    }
}
