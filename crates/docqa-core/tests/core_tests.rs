use std::fs;
use tempfile::TempDir;

use docqa_core::chunker::{expected_chunk_count, reassemble, Chunker};
use docqa_core::extract::{discover_documents, source_name, FileExtractor};
use docqa_core::traits::TextExtractor;

#[test]
fn extracted_file_chunks_with_default_windows() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("history.txt");
    let body: String = (0..260).map(|i| format!("line {i:03}\n")).collect();
    fs::write(&path, &body).unwrap();

    let files = discover_documents(&[tmp.path().to_path_buf()]).expect("discover");
    assert_eq!(files, vec![path.clone()]);
    assert_eq!(source_name(&path), "history.txt");

    let text = FileExtractor::new().extract(&path).expect("extract");
    let chunker = Chunker::default();
    let chunks = chunker.split(&text);
    let n = text.chars().count();
    assert_eq!(n, 2340);
    assert_eq!(chunks.len(), expected_chunk_count(n, 1000, 200));
    assert_eq!(chunks.len(), 3, "windows start at 0, 800 and 1600");
    assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));

    let texts: Vec<String> = chunks.into_iter().map(|c| c.text).collect();
    assert_eq!(reassemble(&texts, chunker.overlap()), text);
}
