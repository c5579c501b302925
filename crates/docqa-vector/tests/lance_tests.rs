use docqa_core::config::{StoreBackend, StoreSettings};
use docqa_core::traits::{EmbeddingProvider, VectorCollection};
use docqa_core::types::{ChunkMetadata, Record, WriteBatch};
use docqa_core::ErrorKind;
use docqa_embed::FakeEmbedder;
use docqa_vector::{open_collection, LanceStore};

async fn records_for(embedder: &FakeEmbedder, texts: &[&str]) -> WriteBatch {
    let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
    let embeddings = embedder.embed_batch(&owned).await.unwrap();
    WriteBatch::from_records(
        owned
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (text, embedding))| Record {
                id: Record::id_for("notes.txt", i),
                text,
                embedding,
                metadata: ChunkMetadata::new("notes.txt", i, "docs/notes.txt"),
            })
            .collect(),
    )
}

#[tokio::test]
async fn write_then_query_nearest_first() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = FakeEmbedder::new(64);
    let store = LanceStore::open(&dir.path().join("db")).await.unwrap();
    let coll = store.collection("documents", 64).await.unwrap();
    assert_eq!(coll.dim(), 64);

    let batch = records_for(&embedder, &["ferry timetable for vashon", "strawberry festival parade", "goat milk soap recipe"]).await;
    coll.add(&batch).await.unwrap();
    assert_eq!(coll.count().await.unwrap(), 3);

    let q = embedder.embed_batch(&["strawberry festival parade".to_string()]).await.unwrap().remove(0);
    let res = coll.query(&q, 2).await.unwrap();
    assert_eq!(res.ids.len(), 2);
    assert_eq!(res.ids[0], "notes.txt_1");
    assert_eq!(res.documents[0], "strawberry festival parade");
    assert_eq!(res.metadatas[0], ChunkMetadata::new("notes.txt", 1, "docs/notes.txt"));
    assert!(res.distances[0] <= res.distances[1]);
}

#[tokio::test]
async fn rewriting_ids_overwrites_rows() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = FakeEmbedder::new(32);
    let store = LanceStore::open(&dir.path().join("db")).await.unwrap();
    let coll = store.collection("documents", 32).await.unwrap();

    coll.add(&records_for(&embedder, &["first version", "second chunk"]).await).await.unwrap();
    coll.add(&records_for(&embedder, &["first version edited", "second chunk"]).await).await.unwrap();
    assert_eq!(coll.count().await.unwrap(), 2);
}

#[tokio::test]
async fn reopening_with_another_width_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db");
    let store = LanceStore::open(&path).await.unwrap();
    store.collection("documents", 16).await.unwrap();

    let err = match store.collection("documents", 32).await {
        Ok(_) => panic!("width mismatch must be rejected"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn writing_vectors_of_another_width_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = LanceStore::open(&dir.path().join("db")).await.unwrap();
    let coll = store.collection("documents", 16).await.unwrap();

    let batch = records_for(&FakeEmbedder::new(8), &["too narrow", "also too narrow"]).await;
    let err = coll.add(&batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Store);
    assert!(!err.is_transient());
    assert_eq!(coll.count().await.unwrap(), 0);
}

#[tokio::test]
async fn chunk_index_past_the_column_range_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = FakeEmbedder::new(8);
    let store = LanceStore::open(&dir.path().join("db")).await.unwrap();
    let coll = store.collection("documents", 8).await.unwrap();

    let mut batch = records_for(&embedder, &["huge document tail"]).await;
    batch.metadatas[0].chunk = Some(i32::MAX as usize + 1);
    let err = coll.add(&batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Store);
    assert_eq!(coll.count().await.unwrap(), 0);
}

#[tokio::test]
async fn settings_pick_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    let lance = StoreSettings {
        backend: StoreBackend::Lance,
        uri: dir.path().join("db").to_string_lossy().into_owned(),
        collection: "docs".into(),
    };
    let coll = open_collection(&lance, 8).await.unwrap();
    assert_eq!(coll.name(), "docs");
    assert_eq!(coll.count().await.unwrap(), 0);

    let memory = StoreSettings { backend: StoreBackend::Memory, ..lance };
    let coll = open_collection(&memory, 8).await.unwrap();
    assert_eq!(coll.count().await.unwrap(), 0);
}
