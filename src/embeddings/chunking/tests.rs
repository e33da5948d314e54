use super::*;

#[test]
fn empty_input_yields_no_chunks() {
    assert!(split_into_chunks("", 1000).is_empty());
    assert!(split_into_chunks("\n\n\n\n   \n\n", 1000).is_empty());
}

#[test]
fn long_paragraph_is_sliced() {
    let paragraph = "a".repeat(2500);
    let chunks = split_into_chunks(&paragraph, 1000);

    let lengths: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(lengths, vec![1000, 1000, 500]);
    assert_eq!(chunks.concat(), paragraph);
}

#[test]
fn paragraph_of_exact_size_is_not_sliced() {
    let paragraph = "b".repeat(1000);
    let chunks = split_into_chunks(&paragraph, 1000);
    assert_eq!(chunks, vec![paragraph]);
}

#[test]
fn short_paragraphs_are_kept_verbatim() {
    let text = "First paragraph.\nStill first.\n\n  Second, with indent.  \n\nThird.";
    let chunks = split_into_chunks(text, 1000);
    assert_eq!(
        chunks,
        vec![
            "First paragraph.\nStill first.",
            "  Second, with indent.  ",
            "Third."
        ]
    );
}

#[test]
fn whitespace_slices_are_dropped() {
    // The second slice of this paragraph is pure whitespace
    let paragraph = format!("{}{}", "x".repeat(100), " ".repeat(100));
    let chunks = split_into_chunks(&paragraph, 100);
    assert_eq!(chunks, vec!["x".repeat(100)]);
}

#[test]
fn slicing_may_split_words() {
    let chunks = split_into_chunks("hello world", 4);
    assert_eq!(chunks, vec!["hell", "o wo", "rld"]);
}

#[test]
fn multibyte_text_is_sliced_by_character() {
    let paragraph = "é".repeat(250);
    let chunks = split_into_chunks(&paragraph, 100);

    let lengths: Vec<usize> = chunks.iter().map(|c| char_len(c)).collect();
    assert_eq!(lengths, vec![100, 100, 50]);
}

#[test]
fn chunks_respect_size_and_order() {
    let text = [
        "FILE: notes.txt\nAlpha paragraph.".to_string(),
        "Beta ".repeat(300),
        "Gamma.".to_string(),
        "   ".to_string(),
        "Delta ".repeat(50),
    ]
    .join(PARAGRAPH_SEPARATOR);

    let chunks = split_into_chunks(&text, 400);

    assert!(chunks.iter().all(|c| !c.trim().is_empty()));
    assert!(chunks.iter().all(|c| char_len(c) <= 400));

    // Every chunk appears in the source after the previous one
    let mut cursor = 0;
    for chunk in &chunks {
        let found = text
            .get(cursor..)
            .and_then(|rest| rest.find(chunk.as_str()))
            .expect("chunk should appear in order");
        cursor += found + chunk.len();
    }

    assert!(chunks[0].starts_with("FILE: notes.txt"));
    assert!(chunks.last().expect("non-empty").starts_with("Delta"));
}

#[test]
fn zero_chunk_size_is_treated_as_one() {
    let chunks = split_into_chunks("abc", 0);
    assert_eq!(chunks, vec!["a", "b", "c"]);
}
