#![no_main]

use libfuzzer_sys::fuzz_target;
use nqx::index::AttrIndex;

// Build a tiny index from arbitrary bytes and check that range sizes
// agree with a naive scan of the stream.
fuzz_target!(|data: &[u8]| {
    let Some((&ngram_len, rest)) = data.split_first() else {
        return;
    };
    let ngram_len = 1 + (ngram_len as usize % 4);
    if rest.len() < ngram_len + 1 {
        return;
    }
    let (query_bytes, stream_bytes) = rest.split_at(ngram_len);

    let mut array = AttrIndex::new();
    for &b in stream_bytes {
        if b % 16 == 0 {
            array.append_sentence_boundary();
        } else {
            array.append_word(&format!("w{}", b % 16));
        }
    }
    array.append_sentence_boundary();
    array.build_suffix_array();

    let words: Vec<String> = query_bytes
        .iter()
        .map(|&b| format!("w{}", 1 + b % 15))
        .collect();
    let Some(ngram) = array.encode_ngram(words.iter().map(String::as_str)) else {
        return;
    };

    let stream: Vec<u32> = array.corpus().iter().collect();
    let expected = stream
        .windows(ngram.len())
        .filter(|w| *w == ngram.as_slice())
        .count() as u64;

    assert_eq!(array.count(&ngram).unwrap(), expected);
});
