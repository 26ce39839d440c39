mod config;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use log::{error, info};
use serde::Deserialize;

use rs_mash_core::MashError;
use rs_mash_core::config::GenerationConfig;
use rs_mash_core::model::generator::{Generator, get_random_sentence};
use rs_mash_core::source::{ConfiguredSource, SourceKey};

use crate::config::{MashConfig, ServerConfig};

/// Query parameters of `/api/corpus`
#[derive(Deserialize)]
struct CorpusParams {
	pretty: Option<bool>,
}

/// Query parameters of `/api/mash`, each overriding the configured default
#[derive(Deserialize)]
struct MashParams {
	ngram_length: Option<usize>,
	strip_punctuation: Option<bool>,
	word_count: Option<usize>,
	seed: Option<u64>,
}

impl MashParams {
	/// Generation options and word count for one request.
	///
	/// # Errors
	/// `InvalidConfiguration` if the word count is above `max_word_count`.
	fn resolve(&self, defaults: &MashConfig) -> Result<(GenerationConfig, usize), MashError> {
		let word_count = self.word_count.unwrap_or(defaults.word_count);
		if word_count > defaults.max_word_count {
			return Err(MashError::InvalidConfiguration {
				reason: format!("word_count must be <= {}, got {word_count}", defaults.max_word_count),
			});
		}
		let generation = GenerationConfig {
			ngram_length: self.ngram_length.unwrap_or(defaults.generation.ngram_length),
			strip_punctuation: self.strip_punctuation.unwrap_or(defaults.generation.strip_punctuation),
			seed: self.seed.or(defaults.generation.seed),
		};
		Ok((generation, word_count))
	}
}

struct SharedData {
	generator: Generator<ConfiguredSource>,
	source: ConfiguredSource,
	mash: MashConfig,
}

/// Maps a core error to a response, keeping its message as body.
fn error_response(e: MashError) -> HttpResponse {
	let body = e.to_string();
	match e {
		MashError::SourceNotFound { .. } => HttpResponse::NotFound().body(body),
		MashError::SourceUnavailable { .. } => HttpResponse::BadGateway().body(body),
		MashError::InvalidConfiguration { .. } => HttpResponse::BadRequest().body(body),
		e if e.is_data_error() => HttpResponse::UnprocessableEntity().body(body),
		_ => HttpResponse::InternalServerError().body(body),
	}
}

fn parse_keys(key1: &str, key2: &str) -> Result<(SourceKey, SourceKey), HttpResponse> {
	let key1 = SourceKey::new(key1).map_err(error_response)?;
	let key2 = SourceKey::new(key2).map_err(error_response)?;
	Ok((key1, key2))
}

async fn corpus_response(
	data: &SharedData,
	key1: &str,
	key2: &str,
	max_units: Option<usize>,
	pretty: bool,
) -> HttpResponse {
	let (key1, key2) = match parse_keys(key1, key2) {
		Ok(keys) => keys,
		Err(response) => return response,
	};

	match data.generator.get_corpus(&key1, &key2, max_units).await {
		Ok(corpus) if pretty => HttpResponse::Ok().content_type("text/html; charset=utf-8").body(corpus.join("</br>")),
		Ok(corpus) => HttpResponse::Ok().json(corpus),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/api/corpus/{key1}/{key2}/{max_units}`
///
/// Returns the merged corpus as a JSON array, or as `</br>`-joined HTML
/// with `?pretty=true`.
#[get("/api/corpus/{key1}/{key2}/{max_units}")]
async fn get_corpus_sized(
	data: web::Data<SharedData>,
	path: web::Path<(String, String, usize)>,
	query: web::Query<CorpusParams>,
) -> impl Responder {
	let (key1, key2, max_units) = path.into_inner();
	corpus_response(&data, &key1, &key2, Some(max_units), query.pretty.unwrap_or(false)).await
}

/// HTTP GET endpoint `/api/corpus/{key1}/{key2}`, with the default size.
#[get("/api/corpus/{key1}/{key2}")]
async fn get_corpus(
	data: web::Data<SharedData>,
	path: web::Path<(String, String)>,
	query: web::Query<CorpusParams>,
) -> impl Responder {
	let (key1, key2) = path.into_inner();
	corpus_response(&data, &key1, &key2, None, query.pretty.unwrap_or(false)).await
}

/// HTTP GET endpoint `/api/mash/{key1}/{key2}`
///
/// Generates one sentence in the blended style of both sources.
#[get("/api/mash/{key1}/{key2}")]
async fn get_mash(
	data: web::Data<SharedData>,
	path: web::Path<(String, String)>,
	query: web::Query<MashParams>,
) -> impl Responder {
	let (key1, key2) = match parse_keys(&path.0, &path.1) {
		Ok(keys) => keys,
		Err(response) => return response,
	};
	let (generation, word_count) = match query.resolve(&data.mash) {
		Ok(resolved) => resolved,
		Err(e) => return error_response(e),
	};

	let corpus = match data.generator.get_corpus(&key1, &key2, Some(data.mash.max_units)).await {
		Ok(corpus) => corpus,
		Err(e) => return error_response(e),
	};

	// Model building is CPU bound, keep it off the async workers
	match web::block(move || get_random_sentence(&corpus, &generation, word_count)).await {
		Ok(Ok(sentence)) => HttpResponse::Ok().body(sentence),
		Ok(Err(e)) => error_response(e),
		Err(e) => {
			error!("generation task failed: {e}");
			HttpResponse::InternalServerError().body("Generation failed")
		}
	}
}

/// HTTP GET endpoint `/api/units/{key}/{count}`, uncached.
#[get("/api/units/{key}/{count}")]
async fn get_units(data: web::Data<SharedData>, path: web::Path<(String, usize)>) -> impl Responder {
	let (key, count) = path.into_inner();
	let key = match SourceKey::new(&key) {
		Ok(key) => key,
		Err(e) => return error_response(e),
	};
	match data.generator.fetch_units(&key, count).await {
		Ok(units) => HttpResponse::Ok().json(units),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/api/verify/{key}`
///
/// Empty body if the source exists, `"@key does not exist"` otherwise.
#[get("/api/verify/{key}")]
async fn get_verify(data: web::Data<SharedData>, path: web::Path<String>) -> impl Responder {
	let key = match SourceKey::new(&path) {
		Ok(key) => key,
		Err(e) => return error_response(e),
	};
	match data.generator.verify(&key).await {
		Ok(()) => HttpResponse::Ok().finish(),
		Err(MashError::SourceNotFound { .. }) => HttpResponse::Ok().body(format!("{key} does not exist")),
		Err(e) => error_response(e),
	}
}

/// HTTP GET endpoint `/api/sources`, keys known to a file source.
#[get("/api/sources")]
async fn get_sources(data: web::Data<SharedData>) -> impl Responder {
	match data.source.available_keys() {
		Some(Ok(keys)) => HttpResponse::Ok().body(keys.join("\n")),
		Some(Err(e)) => error_response(e),
		None => HttpResponse::NotFound().body("Source cannot list its keys"),
	}
}

/// Main entry point for the server.
///
/// Reads the configuration, builds the shared generator (and its cache)
/// once, and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = ServerConfig::load()?;
	let source = ConfiguredSource::from_config(&config.source).map_err(std::io::Error::other)?;
	let generator = Generator::new(source.clone(), &config.corpus).map_err(std::io::Error::other)?;

	let shared_data = web::Data::new(SharedData { generator, source, mash: config.mash });

	info!("listening on {}:{}", config.host, config.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_corpus_sized)
			.service(get_corpus)
			.service(get_mash)
			.service(get_units)
			.service(get_verify)
			.service(get_sources)
	})
	.bind((config.host.as_str(), config.port))?
	.run()
	.await
}
