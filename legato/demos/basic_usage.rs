use legato::{Determinist, DeterministOptions, MergeMode};

fn main() -> Result<(), legato::LegatoError> {
    let lexicon = "\
# petit lexique français
le\tlə
garçon\tgaʁ.sɔ̃
benoit\tbə.nwa | be.nwa
";
    let dict = legato::load_blobs(MergeMode::Append, [lexicon.as_bytes()])?;

    let determinist = Determinist::with_options(
        dict,
        DeterministOptions {
            diacritic_insensitive: true,
            allow_partial_match: true,
        },
    );

    let result = determinist.scan("Le garcon GrosBenoit");

    println!("text: {:?}", result.text);
    for f in &result.fragments {
        println!(
            "  fragment pos={:<2} len={:<2} variant={} confidence={:.2} {:?}",
            f.pos, f.len, f.variant, f.confidence, f.phonetized
        );
    }
    for raw in result.raw_texts() {
        println!("  raw      pos={:<2} len={:<2} {:?}", raw.pos, raw.len, raw.text);
    }
    Ok(())
}
