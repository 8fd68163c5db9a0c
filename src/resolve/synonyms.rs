use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::resolve::normalize::normalize;

/// Upper bound on the synonym set, to keep downstream query expressions and
/// relevance scans bounded.
pub(crate) const MAX_SYNONYMS: usize = 100;

/// Static synonym table: generic name → brand names, international spellings
/// and scientific aliases. Authored as a forward map in canonical form; the
/// loader derives the reverse relation, so entries never need to be repeated
/// in both directions.
///
/// Kept in code rather than a data file so the table ships with the binary
/// and stays under test (see the TabMail synonym-table precedent).
const SYNONYM_TABLE: &[(&str, &[&str])] = &[
    (
        "aspirin",
        &["acetylsalicylic acid", "asa", "aspirina", "ecotrin"],
    ),
    (
        "acetaminophen",
        &["paracetamol", "tylenol", "panadol", "apap"],
    ),
    ("ibuprofen", &["advil", "motrin", "nurofen", "ibuprofeno"]),
    ("naproxen", &["aleve", "naprosyn", "naproxen sodium"]),
    ("metformin", &["glucophage", "metformin hydrochloride"]),
    ("atorvastatin", &["lipitor", "atorvastatin calcium"]),
    ("simvastatin", &["zocor"]),
    ("rosuvastatin", &["crestor", "rosuvastatin calcium"]),
    ("omeprazole", &["prilosec", "losec"]),
    ("esomeprazole", &["nexium"]),
    ("amoxicillin", &["amoxil", "amoxicilina", "amoxycillin"]),
    ("azithromycin", &["zithromax", "z-pak"]),
    ("lisinopril", &["prinivil", "zestril"]),
    (
        "levothyroxine",
        &["synthroid", "levothyroxine sodium", "levoxyl"],
    ),
    ("warfarin", &["coumadin", "warfarin sodium", "jantoven"]),
    ("sertraline", &["zoloft", "sertraline hydrochloride"]),
    ("fluoxetine", &["prozac", "fluoxetine hydrochloride"]),
    ("escitalopram", &["lexapro", "escitalopram oxalate"]),
    ("albuterol", &["salbutamol", "ventolin", "proventil"]),
    ("gabapentin", &["neurontin"]),
    ("pregabalin", &["lyrica"]),
    ("amlodipine", &["norvasc", "amlodipine besylate"]),
    (
        "metoprolol",
        &["lopressor", "metoprolol tartrate", "metoprolol succinate"],
    ),
    ("losartan", &["cozaar", "losartan potassium"]),
    ("prednisone", &["deltasone", "prednisona"]),
    ("clopidogrel", &["plavix", "clopidogrel bisulfate"]),
    ("diphenhydramine", &["benadryl"]),
    ("cetirizine", &["zyrtec", "cetirizine hydrochloride"]),
    ("loratadine", &["claritin"]),
    ("pantoprazole", &["protonix", "pantoprazole sodium"]),
    ("duloxetine", &["cymbalta", "duloxetine hydrochloride"]),
    ("apixaban", &["eliquis"]),
    ("rivaroxaban", &["xarelto"]),
    ("semaglutide", &["ozempic", "wegovy", "rybelsus"]),
    ("sitagliptin", &["januvia", "sitagliptin phosphate"]),
];

/// Pharmaceutical salt and formulation words: stripped as trailing suffixes
/// and never useful as standalone search terms.
const SALT_SUFFIXES: &[&str] = &[
    "sodium",
    "hydrochloride",
    "hcl",
    "sulfate",
    "sulphate",
    "citrate",
    "potassium",
    "calcium",
    "magnesium",
    "tartrate",
    "maleate",
    "mesylate",
    "besylate",
    "bisulfate",
    "succinate",
    "oxalate",
    "phosphate",
    "acetate",
    "nitrate",
    "carbonate",
    "monohydrate",
    "dihydrate",
];

/// Words too generic to stand alone when extracted from a multi-word name.
const GENERIC_WORDS: &[&str] = &[
    "acid", "oral", "tablet", "tablets", "capsule", "solution", "injection", "extended",
    "release",
];

struct SynonymTable {
    forward: HashMap<&'static str, &'static [&'static str]>,
    reverse: HashMap<&'static str, Vec<&'static str>>,
}

fn table() -> &'static SynonymTable {
    static TABLE: OnceLock<SynonymTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut forward: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        let mut reverse: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for &(key, values) in SYNONYM_TABLE {
            forward.insert(key, values);
            for &value in values {
                let keys = reverse.entry(value).or_default();
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        SynonymTable { forward, reverse }
    })
}

fn cas_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2,7}-\d{2}-\d$").expect("valid regex"))
}

/// Returns true for CAS-registry-number-shaped tokens such as `50-78-2`.
pub(crate) fn is_cas_number(token: &str) -> bool {
    cas_number_re().is_match(token)
}

/// Ordered, deduplicated synonym set builder. First insertion wins the slot.
#[derive(Default)]
struct SynonymSet {
    items: Vec<String>,
}

impl SynonymSet {
    fn insert(&mut self, value: String) {
        if value.len() <= 1 || self.items.contains(&value) {
            return;
        }
        self.items.push(value);
    }
}

/// Expands a drug name into the full candidate set used for searching:
/// the name itself, static-table synonyms looked up both forward and
/// reverse, morphological variations of all of those, and filtered
/// externally supplied synonyms with their own variations.
///
/// Every member is canonical (see [`normalize`]) and longer than one
/// character; the result is capped at [`MAX_SYNONYMS`] entries with the seed
/// name first. A name absent from the table still yields itself plus its own
/// variations, so an unknown compound degrades to a single-term search.
pub(crate) fn expand(name: &str, external: &[String]) -> Vec<String> {
    let mut set = SynonymSet::default();
    let seed = normalize(name);
    set.insert(seed.clone());

    let table = table();
    if let Some(values) = table.forward.get(seed.as_str()) {
        for value in *values {
            set.insert(normalize(value));
        }
    }
    if let Some(keys) = table.reverse.get(seed.as_str()) {
        for key in keys {
            set.insert(normalize(key));
            if let Some(values) = table.forward.get(key) {
                for value in *values {
                    set.insert(normalize(value));
                }
            }
        }
    }

    let base = set.items.clone();
    for member in &base {
        for variant in variations(member) {
            set.insert(variant);
        }
    }

    for raw in external {
        let candidate = normalize(raw);
        if candidate.len() <= 1
            || !candidate.chars().any(|c| c.is_ascii_alphabetic())
            || is_cas_number(&candidate)
        {
            continue;
        }
        set.insert(candidate.clone());
        for variant in variations(&candidate) {
            set.insert(variant);
        }
    }

    set.items.truncate(MAX_SYNONYMS);
    set.items
}

fn is_standalone_word(word: &str) -> bool {
    word.len() > 1 && !SALT_SUFFIXES.contains(&word) && !GENERIC_WORDS.contains(&word)
}

/// Morphological variations of one canonical name: spacing/hyphenation
/// variants, first/last word extraction, sliding word bigrams, and trailing
/// salt-suffix stripping. The name itself is never included.
fn variations(name: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let words: Vec<&str> = name.split(' ').collect();

    if words.len() > 1 {
        out.push(words.concat());
        out.push(words.join("-"));
        if let Some(first) = words.first().copied().filter(|w| is_standalone_word(w)) {
            out.push(first.to_string());
        }
        if let Some(last) = words.last().copied().filter(|w| is_standalone_word(w)) {
            out.push(last.to_string());
        }
        for pair in words.windows(2) {
            out.push(pair.join(" "));
        }
        if words
            .last()
            .is_some_and(|w| SALT_SUFFIXES.contains(w))
        {
            out.push(words[..words.len() - 1].join(" "));
        }
    }

    if name.contains('-') {
        out.push(name.replace('-', " "));
        out.push(name.replace('-', ""));
    }

    out.retain(|v| v.len() > 1 && v != name);
    out
}
