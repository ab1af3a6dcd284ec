use serde::{Deserialize, Serialize};

use super::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    #[default]
    Orthodox,
    Southpaw,
}

const LEFT: &str = "LEFT";
const RIGHT: &str = "RIGHT";
// Contains no word characters, so it can never collide with a real token.
const PLACEHOLDER: &str = "\u{0}SIDE\u{0}";

/// Mirror a move for the given stance.
///
/// Orthodox is the identity. Southpaw swaps every whole-word `LEFT` and
/// `RIGHT`; applying it twice gives back the original text.
pub fn transform(mv: &Move, stance: Stance) -> Move {
    match stance {
        Stance::Orthodox => mv.clone(),
        Stance::Southpaw => {
            let text = replace_word(&mv.text, LEFT, PLACEHOLDER);
            let text = replace_word(&text, RIGHT, LEFT);
            let text = text.replace(PLACEHOLDER, RIGHT);
            Move { text, ..mv.clone() }
        }
    }
}

pub fn transform_all(moves: &[Move], stance: Stance) -> Vec<Move> {
    moves.iter().map(|mv| transform(mv, stance)).collect()
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Replace occurrences of `word` that are not glued to other word characters.
fn replace_word(text: &str, word: &str, with: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(word) {
        let end = start + word.len();
        let bounded_left = start == 0 || !is_word_byte(bytes[start - 1]);
        let bounded_right = end == bytes.len() || !is_word_byte(bytes[end]);
        if bounded_left && bounded_right {
            out.push_str(&text[last..start]);
            out.push_str(with);
            last = end;
        }
    }
    out.push_str(&text[last..]);
    out
}
