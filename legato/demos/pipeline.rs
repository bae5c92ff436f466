use std::sync::mpsc;

use legato::{
    CancellationToken, Chain, Determinist, Dictionary, FrenchLiaison, Transcription,
};

fn main() {
    let mut words = Dictionary::new();
    words.insert("les", vec!["le".to_string()]);
    words.insert("amis", vec!["ami".to_string()]);
    words.insert("sont", vec!["sɔ̃".to_string()]);

    let mut fallback = Dictionary::new();
    fallback.insert("ici", vec!["isi".to_string()]);

    // A lexicon pass, a fallback pass over whatever stays raw, then the
    // liaison rule engine.
    let chain = Chain::new()
        .then(Determinist::new(words))
        .then(Determinist::new(fallback))
        .then(FrenchLiaison::new());

    let token = CancellationToken::new();
    let (tx, rx) = mpsc::sync_channel(1);
    tx.send(Transcription::input("les amis sont ici")).ok();
    drop(tx);

    for result in chain.stream(&token, rx) {
        let phonetized: Vec<&str> = result
            .fragments
            .iter()
            .map(|f| f.phonetized.as_str())
            .collect();
        println!("{:?} -> {}", result.text, phonetized.join(" "));
    }
}
