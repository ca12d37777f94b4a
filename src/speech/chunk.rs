//! Word-bounded text chunking for speech output

/// Default chunk length limit in characters
pub const DEFAULT_MAX_CHUNK_LEN: usize = 200;

/// Split `text` into chunks of at most `max_len` characters.
///
/// Words are accumulated greedily and never broken; a single word longer
/// than `max_len` becomes a chunk of its own. Joining the chunks with single
/// spaces yields the original word sequence.
pub fn split_into_chunks(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + word_len + 1 <= max_len {
            current.push(' ');
            current.push_str(word);
            current_len += word_len + 1;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
