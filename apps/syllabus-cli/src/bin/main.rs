use std::env;

use syllabus_core::batcher::{BatchEmitter, Batcher};
use syllabus_core::bm25f::{Bm25fScorer, CorpusStats};
use syllabus_core::config::{resolve_with_base, Config, DataPaths, ScorerBackend, Settings};
use syllabus_core::render::{read_template, DirectorySink, PlaceholderRenderer};
use syllabus_core::store::CorpusStore;
use syllabus_core::topic_tree::{attached_page, flatten, read_syllabus};
use syllabus_core::traits::Scorer;
use syllabus_core::vendor::write_manifest;
use syllabus_core::{PipelineDriver, PipelineState};
use syllabus_text::TantivyCorpusIndexer;
use tracing_subscriber::EnvFilter;

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() { eprintln!("Usage: {} <build|topics> [args...]", prog); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))).init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let paths = settings.data.resolve(&env::current_dir()?);
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "build" => {
            let mut labels = Vec::new();
            let mut i = 0; while i < args.len() { match args[i].as_str() {
                "--scheme" | "-s" => { if let Some(label) = args.get(i + 1) { labels.push(label.clone()); i += 1; } else { eprintln!("Error: --scheme requires a label"); std::process::exit(1); } }
                other => { eprintln!("Unknown argument: {}", other); std::process::exit(1); } } i += 1; }
            build(&settings, &paths, &labels)?;
        }
        "topics" => {
            let mut page = None;
            let mut i = 0; while i < args.len() { match args[i].as_str() {
                "--page" | "-p" => { if let Some(n) = args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) { page = Some(n); i += 1; } else { eprintln!("Error: --page requires a number"); std::process::exit(1); } }
                other => { eprintln!("Unknown argument: {}", other); std::process::exit(1); } } i += 1; }
            topics(&settings, &paths, page)?;
        }
        _ => { eprintln!("Unknown command: {}", cmd); std::process::exit(1); }
    }
    Ok(())
}

fn build(settings: &Settings, paths: &DataPaths, labels: &[String]) -> anyhow::Result<()> {
    let schemes = settings.schemes_named(labels)?;
    // Both inputs are fatal before anything is written.
    let (syllabus_json, tree) = read_syllabus(&paths.syllabus)?;
    let template = read_template(&paths.template)?;
    let store = CorpusStore::load(&paths.corpus)?;
    let leaves = flatten(&tree);
    println!("Syllabus Batches\n================");
    println!("Syllabus: {} ({} leaf topics)", paths.syllabus.display(), leaves.len());
    println!("Corpus: {} ({} posts)", paths.corpus.display(), store.len());

    let mut scorer = open_scorer(settings, &store)?;
    let renderer = PlaceholderRenderer;
    let emitter = BatchEmitter::new(&renderer, &template, &syllabus_json, &settings.batching);
    let mut sink = DirectorySink::create(&paths.output_dir)?;
    let mut state = PipelineState::starting_at(settings.batching.start_id);
    let mut driver = PipelineDriver::new(scorer.as_mut(), &store, emitter, settings.selection, Batcher::new(settings.batching.capacity));
    let report = driver.run(&leaves, &schemes, &mut state, &mut sink)?;

    let ids = report.batch_ids();
    write_manifest(&paths.manifest, &ids)?;
    for run in &report.runs {
        println!("\n[{}] {} posts in {} batch(es) {:?}", run.scheme, run.document_count, run.batch_count(), run.batch_ids);
        for w in &run.warnings { println!("  ⚠️  {}", w); }
    }
    println!("\n✅ Wrote {} batch(es) to {}", ids.len(), sink.dir().display());
    println!("📄 Manifest: {}", paths.manifest.display());
    if report.warning_count() > 0 { println!("⚠️  {} warning(s)", report.warning_count()); }
    Ok(())
}

fn open_scorer(settings: &Settings, store: &CorpusStore) -> anyhow::Result<Box<dyn Scorer>> {
    match settings.scoring.backend {
        ScorerBackend::Bm25f => Ok(Box::new(Bm25fScorer::new(CorpusStats::build(store.documents()), settings.scoring.params()))),
        ScorerBackend::Tantivy => {
            let indexer = match &settings.scoring.index_dir {
                Some(dir) => {
                    let dir = resolve_with_base(&env::current_dir()?, dir);
                    println!("Tantivy index: {}", dir.display());
                    TantivyCorpusIndexer::new(&dir)?
                }
                None => TantivyCorpusIndexer::in_memory()?,
            };
            let indexer = indexer.with_progress(true);
            indexer.index_documents(store.documents())?;
            Ok(Box::new(indexer.into_scorer()?))
        }
    }
}

fn topics(settings: &Settings, paths: &DataPaths, page: Option<usize>) -> anyhow::Result<()> {
    let (_, tree) = read_syllabus(&paths.syllabus)?;
    let leaves = flatten(&tree);
    println!("{} leaf topics in {}", leaves.len(), paths.syllabus.display());
    for leaf in &leaves {
        println!("- [{}] {}  (query: {})", leaf.id, leaf.name, leaf.query().text());
        if let Some(page) = page {
            for doc in attached_page(&[*leaf], page, settings.selection.per_topic) {
                println!("    #{} {}", doc.id, doc.title);
            }
        }
    }
    Ok(())
}
