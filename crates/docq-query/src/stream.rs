/// Split `text` into chunks of at most `chunk_size` bytes, never inside a UTF-8 sequence.
///
/// A single character wider than `chunk_size` becomes its own (oversized) chunk. Empty input
/// yields no chunks; a zero `chunk_size` is treated as `1`.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut rest = text;

    while !rest.is_empty() {
        if rest.len() <= chunk_size {
            chunks.push(rest);
            break;
        }

        let mut end = chunk_size;
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = rest
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(rest.len());
        }

        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }

    chunks
}
