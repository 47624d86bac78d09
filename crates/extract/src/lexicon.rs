use std::collections::HashMap;

use regex::Regex;
use tracing::info;

use crate::ids::IdSequence;
use crate::schema::Trigger;

const TRIGGER_WORDS: &[(&str, &[&str])] = &[
    ("STATEMENT", &["say", "announce", "state", "declare", "claim", "report", "mention", "tell", "speak", "assert"]),
    ("MOVEMENT", &["go", "move", "travel", "arrive", "leave", "depart", "return", "enter", "exit", "flee"]),
    ("TRANSACTION", &["buy", "sell", "trade", "purchase", "acquire", "pay", "spend", "invest", "donate", "fund"]),
    ("CONFLICT", &["attack", "fight", "war", "battle", "strike", "bomb", "shoot", "kill", "destroy", "defeat"]),
    ("BUSINESS", &["merge", "acquire", "launch", "start", "found", "establish", "expand", "grow", "develop", "build"]),
    ("JUSTICE", &["arrest", "charge", "convict", "sentence", "sue", "prosecute", "investigate", "trial", "judge", "rule"]),
    ("LIFE", &["born", "die", "marry", "divorce", "graduate", "study", "educate", "live", "grow", "age"]),
    ("CONTACT", &["meet", "visit", "contact", "call", "email", "write", "talk", "discuss", "negotiate", "consult"]),
    ("PERSONNEL", &["hire", "fire", "resign", "appoint", "elect", "nominate", "promote", "demote", "employ", "work"]),
];

/// Irregular past forms: (base, forms).
const IRREGULAR: &[(&str, &[&str])] = &[
    ("say", &["said"]),
    ("tell", &["told"]),
    ("speak", &["spoke", "spoken"]),
    ("go", &["went", "gone"]),
    ("leave", &["left"]),
    ("flee", &["fled"]),
    ("buy", &["bought"]),
    ("sell", &["sold"]),
    ("pay", &["paid"]),
    ("spend", &["spent"]),
    ("fight", &["fought"]),
    ("strike", &["struck"]),
    ("shoot", &["shot"]),
    ("grow", &["grew", "grown"]),
    ("build", &["built"]),
    ("meet", &["met"]),
    ("write", &["wrote", "written"]),
];

/// Word list lookup for event trigger candidates.
pub struct TriggerLexicon {
    /// Surface form -> event type
    forms: HashMap<String, String>,
    word_re: Regex,
}

impl TriggerLexicon {
    pub fn new() -> Self {
        let mut forms: HashMap<String, String> = HashMap::new();

        for (event_type, words) in TRIGGER_WORDS {
            for word in *words {
                for form in inflections(word) {
                    // First listed type wins for words under two types.
                    forms.entry(form).or_insert_with(|| event_type.to_string());
                }
            }
        }
        for (base, irregular) in IRREGULAR {
            if let Some(event_type) = forms.get(*base).cloned() {
                for form in *irregular {
                    forms.entry(form.to_string()).or_insert_with(|| event_type.clone());
                }
            }
        }

        info!(forms = forms.len(), "Loaded trigger lexicon");

        Self {
            forms,
            word_re: Regex::new(r"\b\w+\b").expect("static regex"),
        }
    }

    pub fn event_type(&self, word: &str) -> Option<&str> {
        self.forms.get(&word.to_lowercase()).map(String::as_str)
    }

    /// All whole-word trigger matches in surface order, with ids `T1`, `T2`, ...
    pub fn extract_triggers(&self, text: &str) -> Vec<Trigger> {
        let mut ids = IdSequence::new("T");
        let triggers: Vec<Trigger> = self
            .word_re
            .find_iter(text)
            .filter_map(|m| {
                let event_type = self.event_type(m.as_str())?;
                Some(Trigger::new(ids.next_id(), m.as_str(), (m.start(), m.end()), event_type))
            })
            .collect();

        info!(triggers = triggers.len(), "Extracted trigger candidates");
        triggers
    }
}

impl Default for TriggerLexicon {
    fn default() -> Self {
        Self::new()
    }
}

fn inflections(word: &str) -> Vec<String> {
    let mut forms = vec![word.to_string()];
    if let Some(stem) = word.strip_suffix('e') {
        forms.push(format!("{}d", word));
        forms.push(format!("{}ing", stem));
        forms.push(format!("{}s", word));
    } else if let Some(stem) = word.strip_suffix('y').filter(|s| !s.ends_with(['a', 'e', 'o', 'u'])) {
        forms.push(format!("{}ied", stem));
        forms.push(format!("{}ing", word));
        forms.push(format!("{}ies", stem));
    } else {
        forms.push(format!("{}ed", word));
        forms.push(format!("{}ing", word));
        if word.ends_with(['s', 'h', 'x', 'o']) {
            forms.push(format!("{}es", word));
        } else {
            forms.push(format!("{}s", word));
        }
    }
    forms
}
