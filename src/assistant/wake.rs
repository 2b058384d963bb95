//! Wake-phrase spotting in live transcripts.

/// Common recognizer spellings of the assistant's name.
const NAME_VARIANTS: [&str; 6] = ["durgas", "durga", "durgus", "dergas", "durgaz", "durgass"];

/// Greeting words accepted in front of the name.
const GREETINGS: [&str; 4] = ["hey", "hi", "okay", "ok"];

/// Lowercase, replace punctuation with spaces and collapse whitespace so that
/// `"Hey, Durgas!"` and `"hey durgas"` compare equal.
fn normalize(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .flat_map(char::to_lowercase)
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn variants(wake_phrase: &str) -> Vec<String> {
    let phrase = normalize(wake_phrase);
    if phrase.is_empty() {
        return Vec::new();
    }
    let mut out = vec![phrase.clone()];
    // Only the built-in name gets recognizer-confusion variants.
    let words: Vec<&str> = phrase.split(' ').collect();
    if let Some((last, head)) = words.split_last()
        && NAME_VARIANTS.contains(last)
    {
        let greeting = head.join(" ");
        let greetings: Vec<String> = if head.len() == 1 && GREETINGS.contains(&head[0]) {
            GREETINGS.iter().map(|g| (*g).to_owned()).collect()
        } else {
            vec![greeting]
        };
        for g in &greetings {
            for name in NAME_VARIANTS {
                out.push(if g.is_empty() {
                    name.to_owned()
                } else {
                    format!("{g} {name}")
                });
            }
        }
    }
    out.sort_by_key(|v| std::cmp::Reverse(v.len()));
    out.dedup();
    out
}

/// Find the wake phrase in `transcript` on word boundaries.
///
/// Returns the text spoken after the phrase (possibly empty) when found.
pub fn find_wake_phrase(transcript: &str, wake_phrase: &str) -> Option<String> {
    let text = normalize(transcript);
    let padded = format!(" {text} ");
    let mut best: Option<(usize, usize)> = None;
    for v in variants(wake_phrase) {
        let needle = format!(" {v} ");
        if let Some(pos) = padded.find(&needle) {
            let candidate = (pos, needle.len());
            best = match best {
                Some(prev) if prev.0 <= candidate.0 => Some(prev),
                _ => Some(candidate),
            };
        }
    }
    best.map(|(pos, len)| padded[pos + len - 1..].trim().to_owned())
}
