use wbpe::{BpeTokenizer, StopReason, Trainer, TrainerConfig, UnknownPolicy};

const CORPUS: &str = "This is an example that we will use to demonstrate BPE.";

// Two specials plus the 21 distinct corpus characters.
const SEED_VOCAB: usize = 23;

fn config(vocab_size: usize) -> TrainerConfig {
    TrainerConfig::builder()
        .target_vocab_size(vocab_size)
        .show_progress(false)
        .build()
        .expect("valid config")
}

fn trained_tokenizer(vocab_size: usize) -> BpeTokenizer {
    BpeTokenizer::train(CORPUS, config(vocab_size)).expect("training succeeds")
}

fn assert_round_trip(tokenizer: &BpeTokenizer, text: &str) {
    let tokens = tokenizer.encode(text);
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    assert_eq!(tokenizer.decode(&tokens), normalized, "round trip of {text:?}");
}

#[test]
fn round_trips_text_with_characters_outside_the_corpus() {
    let tokenizer = trained_tokenizer(50);
    // "c", "g", and the punctuation never appear in the training corpus;
    // the default passthrough policy keeps them as literal tokens.
    assert_round_trip(&tokenizer, "This is a test sentence to encode");
    assert_round_trip(&tokenizer, "loose goose");
    assert_round_trip(&tokenizer, "Hello, world! How's it going?");
}

#[test]
fn round_trips_empty_input() {
    let tokenizer = trained_tokenizer(50);
    assert!(tokenizer.encode("").is_empty());
    let tokens: Vec<&str> = Vec::new();
    assert_eq!(tokenizer.decode(&tokens), "");
}

#[test]
fn whitespace_runs_normalize_to_single_spaces() {
    let tokenizer = trained_tokenizer(50);
    let tokens = tokenizer.encode("This  is\n\tan   example");
    assert_eq!(tokenizer.decode(&tokens), "This is an example");
}

#[test]
fn corpus_tokens_stay_inside_the_vocabulary() {
    let tokenizer = trained_tokenizer(50);
    for token in tokenizer.encode(CORPUS) {
        assert!(
            tokenizer.vocab().contains(token.as_str()),
            "token {token:?} missing from vocabulary"
        );
    }
}

#[test]
fn markers_terminate_exactly_the_word_final_tokens() {
    let tokenizer = trained_tokenizer(50);
    for word in CORPUS.split_whitespace() {
        let tokens = tokenizer.segment(word);
        let (last, rest) = tokens.split_last().expect("segmentation is never empty");
        assert!(last.ends_with("</w>"), "word {word:?} lost its marker");
        for token in rest {
            assert!(
                !token.ends_with("</w>"),
                "mid-word token {token:?} carries the marker"
            );
        }
    }
}

#[test]
fn unknown_characters_pass_through_by_default() {
    let tokenizer = trained_tokenizer(50);
    let tokens = tokenizer.encode("z");
    let tokens: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
    assert_eq!(tokens, ["z", "</w>"]);
    assert_eq!(tokenizer.decode(&tokens), "z");
}

#[test]
fn unknown_characters_substituted_when_configured() {
    let cfg = TrainerConfig::builder()
        .target_vocab_size(50)
        .unknown_policy(UnknownPolicy::Substitute)
        .show_progress(false)
        .build()
        .expect("valid config");
    let tokenizer = BpeTokenizer::train(CORPUS, cfg).expect("training succeeds");
    let tokens = tokenizer.encode("z");
    let tokens: Vec<&str> = tokens.iter().map(|t| t.as_str()).collect();
    assert_eq!(tokens, ["<unk>", "</w>"]);
    assert_eq!(tokenizer.decode(&tokens), "<unk>");
}

#[test]
fn training_is_reproducible() {
    let first = Trainer::new(config(50)).train(CORPUS).expect("first run");
    let second = Trainer::new(config(50)).train(CORPUS).expect("second run");
    assert_eq!(
        first.model.vocab().symbols(),
        second.model.vocab().symbols()
    );
    assert_eq!(first.model.merges(), second.model.merges());
    assert_eq!(first.segmentations, second.segmentations);
}

#[test]
fn vocabulary_growth_is_bounded_per_iteration() {
    let artifacts = Trainer::new(config(50)).train(CORPUS).expect("training");
    assert_eq!(artifacts.model.merges().len(), artifacts.metrics.iterations.len());
    assert_eq!(artifacts.metrics.iterations[0].vocab_size, SEED_VOCAB + 1);
    let mut previous = SEED_VOCAB;
    for iteration in &artifacts.metrics.iterations {
        let grown = iteration.vocab_size - previous;
        assert!(grown <= 1, "vocabulary grew by {grown} in one iteration");
        previous = iteration.vocab_size;
    }
    assert_eq!(previous, 50);
}

#[test]
fn training_stops_exactly_at_target_vocab() {
    let artifacts = Trainer::new(config(30)).train(CORPUS).expect("training");
    assert_eq!(artifacts.model.vocab_size(), 30);
    assert_eq!(
        artifacts.metrics.stop_reason,
        StopReason::TargetVocabReached
    );
}

#[test]
fn generous_target_saturates_every_corpus_word() {
    let artifacts = Trainer::new(config(200)).train(CORPUS).expect("training");
    assert_eq!(artifacts.metrics.stop_reason, StopReason::NoEligiblePairs);
    assert!(artifacts.model.vocab_size() < 200);
    for segmentation in &artifacts.segmentations {
        assert_eq!(segmentation.len(), 1);
    }

    // Replaying the learned rules reproduces the saturated segmentations.
    let tokenizer = artifacts.model.tokenizer().expect("tokenizer");
    for word in CORPUS.split_whitespace() {
        assert_eq!(tokenizer.segment(word).len(), 1, "word {word:?} split");
    }
    assert_round_trip(&tokenizer, CORPUS);
}

#[test]
fn persistence_round_trip_preserves_tokenization() {
    let artifacts = Trainer::new(config(50)).train(CORPUS).expect("training");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("model.json");
    artifacts.model.save(&path).expect("save model");

    let restored = wbpe::BpeModel::load(&path).expect("load model");
    assert_eq!(restored.vocab().symbols(), artifacts.model.vocab().symbols());
    assert_eq!(restored.merges(), artifacts.model.merges());

    let original = artifacts.model.tokenizer().expect("tokenizer");
    let reloaded = restored.tokenizer().expect("tokenizer");
    assert_eq!(original.encode(CORPUS), reloaded.encode(CORPUS));
}

#[test]
fn trailing_tokens_without_marker_are_dropped() {
    let tokenizer = trained_tokenizer(50);
    assert_eq!(tokenizer.decode(&["This</w>", "is"]), "This");
}
