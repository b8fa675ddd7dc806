/// Longest word the tokenizer keeps; extra characters are dropped.
pub const MAX_WORD_LEN: usize = 499;

/// States for the tokenizer state machine.
enum State {
    /// Between tokens — whitespace is skipped
    Normal,
    /// Building a word — whitespace ends it
    InWord,
}

/// Split a line into whitespace-delimited words.
///
/// A `#` anywhere starts a comment: the rest of the line is ignored, but a
/// word already in progress is kept. Words longer than [`MAX_WORD_LEN`]
/// characters are silently truncated.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut state = State::Normal;

    for ch in input.chars() {
        if ch == '#' {
            break;
        }

        match (&state, ch.is_whitespace()) {
            (State::Normal, true) => {}
            (State::InWord, true) => {
                words.push(std::mem::take(&mut current));
                current_len = 0;
                state = State::Normal;
            }
            (_, false) => {
                if current_len < MAX_WORD_LEN {
                    current.push(ch);
                    current_len += 1;
                }
                state = State::InWord;
            }
        }
    }

    if let State::InWord = state {
        words.push(current);
    }

    words
}
