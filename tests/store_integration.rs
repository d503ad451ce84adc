//! Vector store integration tests
//!
//! Exercises the full rebuild → persist → reopen cycle against real files on
//! disk, using the deterministic hashing embedder so no model download is
//! needed.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use docq::config::ChunkingConfig;
use docq::embedding::HashingEmbedder;
use docq::store::VectorStore;

const DIM: usize = 96;

fn chunking() -> ChunkingConfig {
    ChunkingConfig {
        text_chunk_chars: 700,
        pdf_chunk_chars: 900,
    }
}

fn open_store(index_dir: &Path) -> VectorStore {
    VectorStore::open(index_dir, Arc::new(HashingEmbedder::new(DIM))).unwrap()
}

fn write_corpus(src: &Path) {
    std::fs::create_dir_all(src).unwrap();
    std::fs::write(
        src.join("deploy.md"),
        "Deployment guide: build the container image, push it to the registry, \
         then roll out with the orchestrator. Rollbacks use the previous tag.",
    )
    .unwrap();
    std::fs::write(
        src.join("backup.txt"),
        "Backups run nightly. Restore procedure: stop writes, copy the snapshot \
         back into place, verify checksums, resume traffic.",
    )
    .unwrap();
    std::fs::write(
        src.join("cooking.txt"),
        "Pancake recipe: whisk flour, milk and eggs, rest the batter, fry on a \
         hot griddle until golden.",
    )
    .unwrap();
}

#[test]
fn rebuild_persists_artifacts_a_second_instance_can_read() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("data");
    let index_dir = temp.path().join("index");
    write_corpus(&src);

    let mut builder = open_store(&index_dir);
    let count = builder.rebuild(&src, &chunking()).unwrap();
    assert_eq!(count, 3);

    // A fresh instance (e.g. a server picking up an external rebuild) sees
    // exactly what was built
    let reader = open_store(&index_dir);
    assert_eq!(reader.len(), 3);
    assert_eq!(reader.metadata(), builder.metadata());
    for (a, b) in reader.vectors().iter().zip(builder.vectors()) {
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}

#[test]
fn every_persisted_vector_is_unit_norm() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("data");
    let index_dir = temp.path().join("index");
    write_corpus(&src);

    let mut store = open_store(&index_dir);
    store.rebuild(&src, &chunking()).unwrap();

    let reader = open_store(&index_dir);
    assert_eq!(reader.vectors().len(), reader.metadata().len());
    for vector in reader.vectors() {
        assert_eq!(vector.len(), DIM);
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {}", norm);
    }
}

#[test]
fn search_ranks_topically_close_chunks_first() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("data");
    write_corpus(&src);

    let mut store = open_store(&temp.path().join("index"));
    store.rebuild(&src, &chunking()).unwrap();

    let results = store.search("restore a backup snapshot", 3).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[0].path.ends_with("backup.txt"));
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for result in &results {
        assert!((-1.0..=1.0).contains(&result.score));
    }
}

#[test]
fn nonexistent_source_directory_builds_a_valid_empty_index() {
    let temp = TempDir::new().unwrap();
    let index_dir = temp.path().join("index");

    let mut store = open_store(&index_dir);
    let count = store
        .rebuild(&temp.path().join("never-created"), &chunking())
        .unwrap();
    assert_eq!(count, 0);

    let reader = open_store(&index_dir);
    assert!(reader.is_empty());
    assert!(reader.search("anything at all", 10).unwrap().is_empty());
}

#[test]
fn search_is_a_pure_read() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("data");
    write_corpus(&src);

    let mut store = open_store(&temp.path().join("index"));
    store.rebuild(&src, &chunking()).unwrap();
    let before = store.metadata().to_vec();

    for _ in 0..3 {
        store.search("deployment rollout", 2).unwrap();
    }
    assert_eq!(store.metadata(), before.as_slice());
    assert_eq!(store.len(), 3);
}
