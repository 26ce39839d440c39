use rs_mash_core::config::{CorpusConfig, GenerationConfig};
use rs_mash_core::model::generator::{Generator, generate_sentence, get_random_sentence};
use rs_mash_core::source::{FileSource, SourceKey};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Every "<key>.txt" file of the "data" directory is a source,
    // one text unit per line
    let source = FileSource::new("./data");
    println!("Available sources: {}", source.available_keys()?.join(", "));

    // Units fetched per source when the call does not say (10 by default)
    let corpus_config = CorpusConfig { max_units: 50, ..Default::default() };
    let generator = Generator::new(source, &corpus_config)?;

    // A leading '@' is optional, "@alice" and "alice" are the same source
    let alice = SourceKey::new("@alice")?;
    let bob = SourceKey::new("bob")?;

    // Both sources are fetched concurrently, then cached
    let corpus = generator.get_corpus(&alice, &bob, None).await?;
    println!("Corpus: {} units", corpus.len());

    // Second call is served from the cache
    let corpus = generator.get_corpus(&alice, &bob, None).await?;

    // Window size 3, punctuation stripped, fresh randomness each time
    let config = GenerationConfig::default();
    for i in 0..5 {
        println!("Generated sentence {}: {}", i + 1, get_random_sentence(&corpus, &config, 20)?);
    }

    // Keeping punctuation lets the model learn where sentences end
    let config = GenerationConfig { strip_punctuation: false, ..Default::default() };
    println!("With punctuation: {}", get_random_sentence(&corpus, &config, 20)?);

    // A fixed seed gives the same sentence on every run
    let config = GenerationConfig { ngram_length: 2, seed: Some(42), ..Default::default() };
    let sentence = generate_sentence(&corpus, &config, 15)?;
    println!("Seeded ({} tokens): {}", sentence.len(), sentence);

    // Windows larger than the corpus cannot be built
    let config = GenerationConfig { ngram_length: 5_000, ..Default::default() };
    match get_random_sentence(&corpus, &config, 20) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("ngram_length 5000 is too large: {e}"),
    }

    Ok(())
}
