use trainer::store::{move_message, Corpus, FileCorpus, MemoryCorpus};

#[test]
fn test_file_corpus_create_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let mut corpus = FileCorpus::open(dir.path().join("unknown")).unwrap();

    let first = corpus.create(b"Subject: a\n\none", 1_000_000_000).unwrap();
    let second = corpus.create(b"Subject: b\n\ntwo", 1_000_000_000).unwrap();

    assert_eq!(first, "1000000000");
    assert_eq!(second, "1000000001");
    assert_eq!(corpus.keys().unwrap(), vec![first.clone(), second]);
    assert_eq!(corpus.get(&first).unwrap().as_deref(), Some(&b"Subject: a\n\none"[..]));
    assert_eq!(corpus.get("1999999999").unwrap(), None);
}

#[test]
fn test_file_corpus_rejects_escaping_keys() {
    let dir = tempfile::tempdir().unwrap();
    let mut corpus = FileCorpus::open(dir.path()).unwrap();

    assert!(corpus.insert("../outside", b"x").is_err());
    assert!(corpus.insert(".hidden", b"x").is_err());
    assert_eq!(corpus.get("../outside").unwrap(), None);
    assert!(!corpus.remove("../outside").unwrap());
}

#[test]
fn test_file_corpus_ignores_foreign_entries() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("subdir")).unwrap();
    std::fs::write(dir.path().join(".lock"), "").unwrap();
    std::fs::write(dir.path().join("1000000000"), "msg").unwrap();

    let corpus = FileCorpus::open(dir.path()).unwrap();
    assert_eq!(corpus.keys().unwrap(), vec!["1000000000".to_string()]);
}

#[test]
fn test_move_between_file_stores() {
    let dir = tempfile::tempdir().unwrap();
    let mut unknown = FileCorpus::open(dir.path().join("unknown")).unwrap();
    let mut spam = FileCorpus::open(dir.path().join("spam")).unwrap();
    unknown.insert("1000000000", b"buy now").unwrap();

    assert!(move_message(&mut unknown, &mut spam, "1000000000").unwrap());
    assert!(unknown.keys().unwrap().is_empty());
    assert_eq!(spam.get("1000000000").unwrap().as_deref(), Some(&b"buy now"[..]));

    assert!(!move_message(&mut unknown, &mut spam, "1000000000").unwrap());
}

#[test]
fn test_purge_older_than() {
    let dir = tempfile::tempdir().unwrap();
    let mut corpus = FileCorpus::open(dir.path()).unwrap();
    corpus.insert("1000000000", b"old").unwrap();
    corpus.insert("1000500000", b"new").unwrap();
    corpus.insert("notatimestamp", b"kept").unwrap();

    assert_eq!(corpus.purge_older_than(1_000_100_000).unwrap(), 1);
    assert_eq!(
        corpus.keys().unwrap(),
        vec!["1000500000".to_string(), "notatimestamp".to_string()]
    );
}

#[test]
fn test_memory_corpus_remove() {
    let mut corpus = MemoryCorpus::with_messages([("1000000000", "a")]);
    assert_eq!(corpus.len(), 1);
    assert!(corpus.remove("1000000000").unwrap());
    assert!(!corpus.remove("1000000000").unwrap());
    assert!(corpus.is_empty());
}

#[test]
fn test_file_corpus_keeps_raw_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let mut unknown = FileCorpus::open(dir.path().join("unknown")).unwrap();
    let mut spam = FileCorpus::open(dir.path().join("spam")).unwrap();
    let latin1: &[u8] = b"Subject: caf\xe9\n\nd\xe9j\xe0 vu\n";

    let key = unknown.create(latin1, 1_000_000_000).unwrap();
    assert_eq!(std::fs::read(dir.path().join("unknown").join(&key)).unwrap(), latin1);

    assert!(move_message(&mut unknown, &mut spam, &key).unwrap());
    assert_eq!(spam.get(&key).unwrap().as_deref(), Some(latin1));
    assert_eq!(std::fs::read(dir.path().join("spam").join(&key)).unwrap(), latin1);
}
