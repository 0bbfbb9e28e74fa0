use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ironquery_core::{
    Collection, GeoLocator, IndexHandle, IronQueryError, LogLevel, MemoryEngine, SimpleQuery,
};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ironquery")]
#[command(about = "IronQuery CLI - run simple queries against a JSON fixture")]
#[command(version)]
struct Cli {
    /// Fixture file: { "<collection>": { "type", "documents", "indexes" } }
    #[arg(long, global = true, default_value = "fixture.json")]
    fixture: PathBuf,

    /// Log level (error, warn, info, debug, trace); overrides IRONQUERY_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every collection with its index catalog
    Describe,
    /// Print all documents of a collection
    All {
        collection: String,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        skip: Option<u64>,
    },
    /// Print documents matching field/value pairs (values parsed as JSON when possible)
    ByExample {
        collection: String,
        /// field value [field value ...]
        pairs: Vec<String>,
    },
    /// Resolve the geo index for a location attribute, attribute pair or index handle
    Geo {
        collection: String,
        /// Location attribute (or latitude attribute with --longitude)
        attribute: Option<String>,
        /// Longitude attribute of a two-field geo index
        #[arg(long, conflicts_with_all = ["geo_json", "index"])]
        longitude: Option<String>,
        /// Match geo1 indexes with this geoJson flag
        #[arg(long)]
        geo_json: Option<bool>,
        /// Index id or name, looked up directly
        #[arg(long, conflicts_with = "attribute")]
        index: Option<String>,
    },
    /// Iterate documents with JSON options, e.g. '{"limit": 5}'
    ///
    /// The fixture engine runs only unsampled traversals; a probability
    /// below 1 fails with error 9.
    Iterate {
        collection: String,
        #[arg(long, default_value = "{}")]
        options: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_logging(cli.log_level.as_deref())?;

    let engine = Arc::new(load_fixture(&cli.fixture)?);

    match cli.command {
        Commands::Describe => describe(&engine),
        Commands::All {
            collection,
            limit,
            skip,
        } => {
            let coll = open(&engine, &collection)?;
            let mut query = coll.all();
            if let Some(skip) = skip {
                query = query.skip(skip);
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            print_documents(&query)
        }
        Commands::ByExample { collection, pairs } => {
            let coll = open(&engine, &collection)?;
            let args = pairs.iter().map(String::as_str).map(parse_value).collect();
            let query = coll.by_example_pairs(args)?;
            print_documents(&query)
        }
        Commands::Geo {
            collection,
            attribute,
            longitude,
            geo_json,
            index,
        } => {
            let coll = open(&engine, &collection)?;
            let locator = geo_locator(attribute, longitude, geo_json, index)?;
            let geo = coll.geo(locator)?;
            println!("{}", geo.index_id());
            Ok(())
        }
        Commands::Iterate {
            collection,
            options,
        } => {
            let coll = open(&engine, &collection)?;
            let options: Value = serde_json::from_str(&options)
                .with_context(|| format!("Invalid JSON options: {}", options))?;
            let delivered = coll.iterate_with(&options, |document, position| {
                println!("{}\t{}", position, document);
                Ok::<(), IronQueryError>(())
            })?;
            eprintln!("{} documents", delivered);
            Ok(())
        }
    }
}

fn configure_logging(level: Option<&str>) -> Result<()> {
    match level {
        Some(name) => {
            let level = LogLevel::parse(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown log level: {}", name))?;
            ironquery_core::set_log_level(level);
        }
        None => {
            ironquery_core::init_from_env();
        }
    }
    Ok(())
}

/// Load a fixture file into a fresh in-memory engine
fn load_fixture(path: &Path) -> Result<MemoryEngine> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
    let fixture: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in fixture: {}", path.display()))?;
    let engine = MemoryEngine::from_fixture(&fixture)
        .with_context(|| format!("Invalid fixture: {}", path.display()))?;
    ironquery_core::log_info!(
        "loaded {} collections from {}",
        engine.collection_names().len(),
        path.display()
    );
    Ok(engine)
}

fn open(engine: &Arc<MemoryEngine>, name: &str) -> Result<Collection<MemoryEngine>> {
    engine
        .collection(name)
        .with_context(|| format!("Failed to get collection: {}", name))
}

fn describe(engine: &Arc<MemoryEngine>) -> Result<()> {
    for name in engine.collection_names() {
        let coll = open(engine, &name)?;
        println!("{}", coll);
        for index in coll.get_indexes()? {
            println!("  {} {} {:?}", index.id, index.index_type, index.fields);
        }
    }
    Ok(())
}

fn print_documents(query: &SimpleQuery<'_, MemoryEngine>) -> Result<()> {
    let documents = query.to_vec()?;
    for document in &documents {
        println!("{}", document);
    }
    eprintln!("{} documents", documents.len());
    Ok(())
}

/// JSON literal if it parses, plain string otherwise
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn geo_locator(
    attribute: Option<String>,
    longitude: Option<String>,
    geo_json: Option<bool>,
    index: Option<String>,
) -> Result<GeoLocator> {
    if let Some(index) = index {
        return Ok(GeoLocator::index(if index.contains('/') || index.parse::<u64>().is_ok() {
            IndexHandle::id(index)
        } else {
            IndexHandle::name(index)
        }));
    }

    let attribute =
        attribute.ok_or_else(|| anyhow::anyhow!("geo needs an attribute or --index"))?;
    Ok(match (longitude, geo_json) {
        (Some(longitude), _) => GeoLocator::pair(attribute, longitude),
        (None, Some(flag)) => GeoLocator::field_with_geo_json(attribute, flag),
        (None, None) => GeoLocator::field(attribute),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_fixture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"places": {{"documents": [{{"name": "Cologne"}}],
                "indexes": [{{"type": "geo2", "fields": ["lat", "lon"]}}]}}}}"#
        )
        .unwrap();

        let engine = Arc::new(load_fixture(file.path()).unwrap());
        let places = open(&engine, "places").unwrap();
        assert_eq!(places.all().to_vec().unwrap().len(), 1);

        let locator = geo_locator(Some("lat".into()), Some("lon".into()), None, None).unwrap();
        assert!(places.geo(locator).is_ok());
    }

    #[test]
    fn test_load_fixture_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(load_fixture(file.path()).is_err());
    }

    #[test]
    fn test_iterate_help_names_unsampled_limit() {
        use clap::CommandFactory;
        let mut command = Cli::command();
        let iterate = command
            .find_subcommand_mut("iterate")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(iterate.contains("only unsampled traversals"));
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), serde_json::json!(42));
        assert_eq!(parse_value("true"), serde_json::json!(true));
        assert_eq!(parse_value("Cologne"), serde_json::json!("Cologne"));
    }

    #[test]
    fn test_geo_locator_shapes() {
        assert_eq!(
            geo_locator(Some("loc".into()), None, None, None).unwrap(),
            GeoLocator::field("loc")
        );
        assert_eq!(
            geo_locator(Some("loc".into()), None, Some(true), None).unwrap(),
            GeoLocator::field_with_geo_json("loc", true)
        );
        assert_eq!(
            geo_locator(None, None, None, Some("places/3".into())).unwrap(),
            GeoLocator::index(IndexHandle::id("places/3"))
        );
        assert_eq!(
            geo_locator(None, None, None, Some("by_loc".into())).unwrap(),
            GeoLocator::index(IndexHandle::name("by_loc"))
        );
        assert!(geo_locator(None, None, None, None).is_err());
    }
}
