use criterion::{criterion_group, criterion_main, Criterion};

use legato::{Determinist, DeterministOptions, Dictionary};

fn build_dictionary() -> Dictionary {
    let words = [
        ("le", "lə"),
        ("la", "la"),
        ("les", "le"),
        ("un", "œ̃"),
        ("une", "yn"),
        ("garçon", "gaʁ.sɔ̃"),
        ("benoit", "bə.nwa"),
        ("est", "ɛ"),
        ("très", "tʁɛ"),
        ("aimable", "ɛ.mabl"),
        ("et", "e"),
        ("chien", "ʃjɛ̃"),
        ("chat", "ʃa"),
        ("maison", "mɛ.zɔ̃"),
        ("à aucun moment", "aokœ̃mɔmɑ̃"),
    ];
    let mut dict = Dictionary::with_capacity(words.len());
    for (w, p) in words {
        dict.insert(w, vec![p.to_string()]);
    }
    dict
}

fn bench_scan(c: &mut Criterion) {
    let sentence = "le garçon est très aimable et le chien est à la maison";
    let text: String = std::iter::repeat(sentence).take(50).collect::<Vec<_>>().join(". ");

    let strict = Determinist::new(build_dictionary());
    c.bench_function("scan_strict", |b| {
        b.iter(|| std::hint::black_box(strict.scan(&text)))
    });

    let tolerant = Determinist::with_options(
        build_dictionary(),
        DeterministOptions {
            diacritic_insensitive: true,
            allow_partial_match: true,
        },
    );
    let stripped = text.replace('ç', "c").replace('è', "e");
    c.bench_function("scan_tolerant", |b| {
        b.iter(|| std::hint::black_box(tolerant.scan(&stripped)))
    });
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
