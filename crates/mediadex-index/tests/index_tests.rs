use std::path::{Path, PathBuf};

use mediadex_core::traits::MediaCatalog;
use mediadex_core::{AudioFile, TrackMetadata};
use mediadex_index::{AudioField, IndexError, IndexOptions, MediaIndex};
use tempfile::TempDir;

fn track(root: &str, rel: &str, artist: Option<&str>) -> AudioFile {
    let root = Path::new(root);
    let meta = TrackMetadata {
        artist: artist.map(str::to_string),
        album: Some("Comfort".into()),
        duration: Some("0:04:12".into()),
    };
    AudioFile::discovered(root, &root.join(rel), meta).expect("under root")
}

fn index_path() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("audio.idx");
    (tmp, path)
}

fn small_batches(batch_size: usize) -> IndexOptions {
    IndexOptions { batch_size, ..IndexOptions::default() }
}

#[test]
fn exact_path_query_returns_that_document() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    let a = track("/music", "rock/a.mp3", Some("Foo"));
    let b = track("/music", "rock/ab.mp3", Some("Foo"));
    index.add_item(&a).unwrap();
    index.add_item(&b).unwrap();
    index.flush().unwrap();

    let hits = index.query(r#"path:"/music/rock/a.mp3""#).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0], a);
}

#[test]
fn artist_matches_partial_and_case_insensitive_terms() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    index.add_item(&track("/music", "house/one.flac", Some("Maya Jane Coles"))).unwrap();
    index.add_item(&track("/music", "house/two.flac", Some("Someone Else"))).unwrap();
    index.flush().unwrap();

    for q in ["jane coles", "Jane", "artist:coles"] {
        let hits = index.query(q).unwrap();
        assert_eq!(hits.len(), 1, "query {q:?}");
        assert_eq!(hits[0].artist.as_deref(), Some("Maya Jane Coles"));
    }
}

#[test]
fn keyword_fields_match_verbatim() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    index.add_item(&track("/music", "rock/90s/track.mp3", None)).unwrap();
    index.flush().unwrap();

    assert_eq!(index.query("tags:90s").unwrap().len(), 1);
    assert_eq!(index.query(r#"folder:"rock/90s""#).unwrap().len(), 1);
    assert!(index.query("tags:Rock").unwrap().is_empty());
}

#[test]
fn bare_terms_match_folder_tags() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    index.add_item(&track("/music", "jazz/b.mp3", Some("Bar"))).unwrap();
    index.add_item(&track("/music", "rock/90s/a.mp3", Some("Foo"))).unwrap();
    index.flush().unwrap();

    let hits = index.query("jazz").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "b.mp3");
    assert_eq!(index.query("90s").unwrap()[0].name, "a.mp3");
    // Tags stay verbatim keywords.
    assert!(index.query("Jazz").unwrap().is_empty());
}

#[test]
fn hydration_restores_every_field_including_tags() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    let item = track("/music", "rock/90s/track.mp3", Some("Foo"));
    index.add_item(&item).unwrap();
    index.flush().unwrap();

    let hit = index.query("foo").unwrap().into_inner().remove(0);
    assert_eq!(hit.tags, vec!["rock".to_string(), "90s".to_string()]);
    assert_eq!(hit.folder, "rock/90s");
    assert_eq!(hit, item);
}

#[test]
fn fields_outside_the_projection_stay_empty() {
    let (_tmp, path) = index_path();
    let options = IndexOptions {
        projection: vec![AudioField::Id, AudioField::Path, AudioField::Name],
        ..IndexOptions::default()
    };
    let mut index = MediaIndex::create(&path, options).unwrap();
    let item = track("/music", "rock/a.mp3", Some("Foo"));
    index.add_item(&item).unwrap();
    index.flush().unwrap();

    let hit = index.query("foo").unwrap().into_inner().remove(0);
    assert_eq!(hit.id, item.id);
    assert_eq!(hit.path, item.path);
    assert_eq!(hit.name, "a.mp3");
    assert_eq!(hit.artist, None);
    assert!(hit.tags.is_empty());
    assert_eq!(hit.root, "");
}

#[test]
fn adding_the_same_path_twice_keeps_one_document() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    let first = track("/music", "rock/a.mp3", Some("Foo"));
    let mut second = first.clone();
    second.artist = Some("Renamed".into());

    index.add_item(&first).unwrap();
    index.add_item(&second).unwrap();
    index.flush().unwrap();
    index.add_item(&second).unwrap();
    index.flush().unwrap();

    assert_eq!(index.num_docs(), 1);
    let hits = index.query("*").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].artist.as_deref(), Some("Renamed"));
}

#[test]
fn documents_become_visible_only_after_a_flush() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, small_batches(10)).unwrap();
    index.add_item(&track("/music", "a.mp3", Some("Foo"))).unwrap();
    assert!(index.query("foo").unwrap().is_empty());
    index.flush().unwrap();
    assert_eq!(index.query("foo").unwrap().len(), 1);
    // Nothing pending: a second flush is a no-op.
    index.flush().unwrap();
}

#[test]
fn full_batch_without_flush_survives_close() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, small_batches(3)).unwrap();
    let mut batches = index.subscribe_batches();
    for name in ["a.mp3", "b.mp3", "c.mp3"] {
        index.add_item(&track("/music", name, None)).unwrap();
    }
    assert_eq!(batches.try_recv().unwrap(), 3);
    index.close().unwrap();

    let reopened = MediaIndex::open(&path, IndexOptions::default()).unwrap();
    assert_eq!(reopened.query("*").unwrap().len(), 3);
}

#[test]
fn close_commits_a_partial_batch() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    index.add_item(&track("/music", "a.mp3", None)).unwrap();
    index.add_item(&track("/music", "b.mp3", None)).unwrap();
    index.close().unwrap();

    let reopened = MediaIndex::open(&path, IndexOptions::default()).unwrap();
    assert_eq!(reopened.num_docs(), 2);
}

#[test]
fn results_are_capped_at_max_hits() {
    let (_tmp, path) = index_path();
    let options = IndexOptions { max_hits: 2, ..IndexOptions::default() };
    let mut index = MediaIndex::create(&path, options).unwrap();
    for name in ["a.mp3", "b.mp3", "c.mp3", "d.mp3"] {
        index.add_item(&track("/music", name, Some("Foo"))).unwrap();
    }
    index.flush().unwrap();
    assert_eq!(index.query("foo").unwrap().len(), 2);
}

#[test]
fn path_for_id_resolves_known_ids_only() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    let item = track("/music", "jazz/b.mp3", Some("Bar"));
    index.add_item(&item).unwrap();
    index.flush().unwrap();

    assert_eq!(index.path_for_id(&item.id).unwrap(), Some(PathBuf::from("/music/jazz/b.mp3")));
    assert_eq!(index.path_for_id("0000").unwrap(), None);

    let catalog: &dyn MediaCatalog = &index;
    assert_eq!(catalog.path_for_id(&item.id).unwrap(), Some(PathBuf::from(&item.path)));
    assert_eq!(catalog.query("bar").unwrap().len(), 1);
}

#[test]
fn malformed_query_is_an_error() {
    let (_tmp, path) = index_path();
    let index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    let err = index.query("nosuchfield:foo").unwrap_err();
    assert!(matches!(err, IndexError::Query { .. }), "{err}");
}

#[test]
fn create_refuses_existing_and_open_requires_one() {
    let (_tmp, path) = index_path();
    assert!(matches!(
        MediaIndex::open(&path, IndexOptions::default()),
        Err(IndexError::NotFound(p)) if p == path
    ));

    MediaIndex::create(&path, IndexOptions::default()).unwrap().close().unwrap();
    assert!(matches!(
        MediaIndex::create(&path, IndexOptions::default()),
        Err(IndexError::AlreadyExists(_))
    ));
    assert!(MediaIndex::open(&path, IndexOptions::default()).is_ok());
}

#[test]
fn opened_stores_take_the_writer_lock_only_when_writing() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    index.add_item(&track("/music", "a.mp3", Some("Foo"))).unwrap();
    index.close().unwrap();

    let first = MediaIndex::open(&path, IndexOptions::default()).unwrap();
    let second = MediaIndex::open(&path, IndexOptions::default()).unwrap();
    assert_eq!(first.query("foo").unwrap().len(), 1);
    assert_eq!(second.query("foo").unwrap().len(), 1);

    let mut writer = MediaIndex::open(&path, IndexOptions::default()).unwrap();
    writer.add_item(&track("/music", "b.mp3", Some("Foo"))).unwrap();
    writer.flush().unwrap();
    assert_eq!(writer.num_docs(), 2);

    let mut contender = MediaIndex::open(&path, IndexOptions::default()).unwrap();
    let err = contender.add_item(&track("/music", "c.mp3", None)).unwrap_err();
    assert!(matches!(err, IndexError::Store(_)), "{err}");

    writer.close().unwrap();
    contender.add_item(&track("/music", "c.mp3", None)).unwrap();
    contender.close().unwrap();
}

#[test]
fn documents_without_an_id_are_rejected() {
    let (_tmp, path) = index_path();
    let mut index = MediaIndex::create(&path, IndexOptions::default()).unwrap();
    let err = index.add_item(&AudioFile::default()).unwrap_err();
    assert!(matches!(err, IndexError::Encoding(_)));
}
