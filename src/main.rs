use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexgraph::consistency::RelationMap;
use lexgraph::model::{PosKey, PosTypeUpdate, RelationKey, RelationTypeUpdate, WordDraft};
use lexgraph::store::ExportBundle;
use lexgraph::{BuildOptions, Config, GraphData, Lexicon, LexiconService};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lexgraph")]
#[command(about = "Lexical relation graph: words, paired relations, and graph views")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed empty relation and part-of-speech registries with the defaults
    Init,
    /// Add a word
    AddWord {
        label: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        phonetic: Option<String>,
        /// `pos:definition`, `pos:` or `:definition`; repeatable
        #[arg(long = "def")]
        definitions: Vec<String>,
        #[arg(long = "example")]
        examples: Vec<String>,
    },
    /// Show a word with its definitions and relations
    Show { id: String },
    /// Delete a word and every connection touching it
    DeleteWord { id: String },
    /// Link two words; paired reverses are created automatically
    Link {
        source: String,
        relation: String,
        target: String,
    },
    /// Remove a connection (and its paired reverse) by id
    Unlink { id: String },
    /// Replace all editable relations of a word
    Relate {
        word_id: String,
        /// `relation=target1,target2`; repeatable. Omit to clear.
        #[arg(long = "set")]
        sets: Vec<String>,
    },
    /// Print the editable relations of a word
    Relations { word_id: String },
    /// List relation types (or parts of speech with --pos)
    Types {
        #[arg(long)]
        pos: bool,
    },
    /// Rename a relation type key everywhere it is referenced
    RenameRelation {
        old: String,
        new: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Rename a part-of-speech key everywhere it is referenced
    RenamePos {
        old: String,
        new: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Build the graph for a query (`*` for the overview)
    Search {
        #[arg(default_value = "*")]
        query: String,
        #[arg(short, long)]
        depth: Option<usize>,
        #[arg(short, long)]
        max_nodes: Option<usize>,
        /// Include inactive relation types
        #[arg(long)]
        all_relations: bool,
        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the working set as JSON (stdout when no path is given)
    Export { path: Option<PathBuf> },
    /// Import a JSON export, replacing the working set
    Import {
        path: PathBuf,
        /// Store the bundle as a new project instead
        #[arg(long = "as-project")]
        as_project: Option<String>,
    },
    /// Show or edit the search history
    History {
        #[arg(long)]
        clear: bool,
        #[arg(long)]
        remove: Option<String>,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectAction {
    List,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Switch { id: String },
    /// Save the working set into the current project
    Save,
    Rename {
        id: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
    Export { id: String, path: Option<PathBuf> },
}

fn parse_definition(raw: &str) -> Result<(Option<PosKey>, Option<String>)> {
    let (pos, definition) = raw.split_once(':').unwrap_or((raw, ""));
    let pos = match pos.trim() {
        "" => None,
        key => Some(PosKey::parse(key)?),
    };
    let definition = Some(definition.trim().to_string()).filter(|d| !d.is_empty());
    Ok((pos, definition))
}

fn parse_relation_set(raw: &str) -> Result<(RelationKey, Vec<String>)> {
    let (relation, targets) = raw
        .split_once('=')
        .with_context(|| format!("Expected relation=target[,target...], got '{}'", raw))?;
    let targets = targets
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    Ok((RelationKey::parse(relation)?, targets))
}

fn write_json<T: serde::Serialize>(value: &T, path: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn print_graph(graph: &GraphData) {
    if graph.is_empty() {
        println!("No matching words.");
        return;
    }
    println!("{:-<60}", "");
    for node in graph.word_nodes() {
        let marker = if node.is_center { "*" } else { " " };
        let more = if node.has_more { " +" } else { "" };
        println!("{} [{}] {} ({}){}", marker, node.level, node.label, node.id, more);
    }
    println!("{:-<60}", "");
    for edge in graph.relation_edges() {
        let relation = edge.relation.as_ref().map(RelationKey::as_str).unwrap_or("-");
        println!("  {} --{}--> {}", edge.source, relation, edge.target);
    }
    println!("{:-<60}", "");
    println!(
        "{} node(s), {} edge(s)",
        graph.word_nodes().count(),
        graph.relation_edges().count()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", &config.lexgraph.log_level)
    ).init();

    log::debug!("Database path: {}", config.db_path().display());
    let lexicon = Lexicon::open(&config).context("Failed to open lexicon database")?;

    match cli.command {
        Command::Init => {
            lexicon.initialize_defaults()?;
            println!(
                "Registries ready: {} relation type(s), {} part(s) of speech",
                lexicon.list_relation_types()?.len(),
                lexicon.list_pos_types()?.len()
            );
        }
        Command::AddWord {
            label,
            id,
            phonetic,
            definitions,
            examples,
        } => {
            let mut draft = WordDraft::new(label);
            draft.id = id;
            draft.phonetic = phonetic;
            for raw in &definitions {
                let (pos, definition) = parse_definition(raw)?;
                draft = draft.with_pos_definition(pos, definition.as_deref());
            }
            draft.examples = examples;
            let word = lexicon.add_word(draft)?;
            println!("Added '{}' ({})", word.label, word.id);
        }
        Command::Show { id } => {
            let word = lexicon.get_word(&id)?.with_context(|| format!("Word not found: {}", id))?;
            match &word.phonetic {
                Some(phonetic) => println!("{} {}", word.label, phonetic),
                None => println!("{}", word.label),
            }
            for line in lexicon.pos_definition_lines(&word)? {
                println!("  {}  {}", line.pos_label, line.definition);
            }
            for example in &word.examples {
                println!("  e.g. {}", example);
            }
            for (relation, targets) in lexicon.word_relations(&id)? {
                println!("  {}: {}", relation, targets.join(", "));
            }
        }
        Command::DeleteWord { id } => {
            let deletion = lexicon.delete_word(&id)?;
            if deletion.word_removed {
                println!("Deleted {} and {} connection(s)", id, deletion.connections_removed);
            } else {
                println!("No word {} (removed {} dangling connection(s))", id, deletion.connections_removed);
            }
        }
        Command::Link {
            source,
            relation,
            target,
        } => {
            let outcome = lexicon.add_connection(&source, &target, &RelationKey::parse(&relation)?)?;
            match (&outcome.created, &outcome.reverse) {
                (None, None) => println!("Already linked"),
                (created, reverse) => {
                    if let Some(conn) = created {
                        println!("Linked {} --{}--> {} ({})", conn.source, conn.relation, conn.target, conn.id);
                    }
                    if let Some(conn) = reverse {
                        println!("Linked {} --{}--> {} ({})", conn.source, conn.relation, conn.target, conn.id);
                    }
                }
            }
        }
        Command::Unlink { id } => {
            let removed = lexicon.delete_connection(&id)?;
            println!("Removed {} connection(s)", removed.len());
        }
        Command::Relate { word_id, sets } => {
            let mut relations = RelationMap::new();
            for raw in &sets {
                let (relation, targets) = parse_relation_set(raw)?;
                relations.entry(relation).or_default().extend(targets);
            }
            let report = lexicon.replace_word_relations(&word_id, &relations)?;
            println!(
                "Removed {}, created {} (+{} reverse)",
                report.removed, report.created, report.reverses_created
            );
            for target in &report.skipped_reverses {
                println!("  Skipped reverse for missing word {}", target);
            }
        }
        Command::Relations { word_id } => {
            let relations = lexicon.word_relations(&word_id)?;
            if relations.is_empty() {
                println!("No relations.");
            }
            for (relation, targets) in relations {
                println!("{}: {}", relation, targets.join(", "));
            }
        }
        Command::Types { pos } => {
            if pos {
                for pt in lexicon.list_pos_types()? {
                    println!("{:<20} {}", pt.key.as_str(), pt.display_label());
                }
            } else {
                for rt in lexicon.list_relation_types()?.iter() {
                    let pair = match &rt.pair_with {
                        Some(p) if p == &rt.key => "symmetric".to_string(),
                        Some(p) => format!("<-> {}", p),
                        None => "-".to_string(),
                    };
                    let active = if rt.default_active { "" } else { " (inactive)" };
                    println!("{:<15} {:<15} {:<8} {}{}", rt.key.as_str(), rt.label, rt.color, pair, active);
                }
            }
        }
        Command::RenameRelation { old, new, label } => {
            let updates = RelationTypeUpdate {
                label,
                ..Default::default()
            };
            let renamed =
                lexicon.rename_relation_type_key(&RelationKey::parse(&old)?, &RelationKey::parse(&new)?, updates)?;
            println!(
                "Renamed {} -> {}: {} connection(s), {} pairing(s)",
                old, new, renamed.connections_rewritten, renamed.pairings_rewritten
            );
        }
        Command::RenamePos { old, new, label } => {
            let updates = PosTypeUpdate {
                label,
                ..Default::default()
            };
            let renamed = lexicon.rename_pos_key(&PosKey::parse(&old)?, &PosKey::parse(&new)?, updates)?;
            println!("Renamed {} -> {}: {} word(s)", old, new, renamed.words_rewritten);
        }
        Command::Search {
            query,
            depth,
            max_nodes,
            all_relations,
            json,
        } => {
            let depth = depth.unwrap_or(lexicon.default_depth());
            let max_nodes = max_nodes.unwrap_or(lexicon.default_max_nodes());
            let graph = if all_relations {
                lexicon.build_with(&query, &BuildOptions::new(depth, max_nodes))?
            } else {
                let service = LexiconService::new(lexicon, config.simulated_latency());
                let graph = service.build(&query, depth, max_nodes).await?;
                service.lexicon().record_search(&query)?;
                graph
            };
            if json {
                write_json(&graph, None)?;
            } else {
                print_graph(&graph);
            }
        }
        Command::Export { path } => {
            write_json(&lexicon.export_data()?, path.as_ref())?;
        }
        Command::Import { path, as_project } => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            let bundle: ExportBundle = serde_json::from_str(&raw).context("Failed to parse export file")?;
            match as_project {
                Some(name) => {
                    let project = lexicon.import_as_project(&name, bundle, None)?;
                    println!("Imported as project '{}' ({})", project.name, project.id);
                }
                None => {
                    lexicon.import_data(&bundle)?;
                    println!("Imported {} word(s), {} connection(s)", bundle.words.len(), bundle.connections.len());
                }
            }
        }
        Command::History { clear, remove } => {
            if clear {
                lexicon.clear_history()?;
            } else if let Some(word) = remove {
                lexicon.remove_history_item(&word)?;
            }
            for item in lexicon.history()? {
                println!("{}  {}", item.timestamp.format("%Y-%m-%d %H:%M"), item.word);
            }
        }
        Command::Project { action } => run_project(&lexicon, action)?,
    }

    Ok(())
}

fn run_project<B: lexgraph::db::KvBackend>(lexicon: &Lexicon<B>, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::List => {
            let current = lexicon.current_project_id()?;
            for project in lexicon.projects()? {
                let marker = if current.as_deref() == Some(project.id.as_str()) { "*" } else { " " };
                println!(
                    "{} {:<24} {:<40} {} word(s)",
                    marker,
                    project.name,
                    project.id,
                    project.data.words.len()
                );
            }
            if lexicon.has_unsaved_changes()? {
                println!("(working set has unsaved changes)");
            }
        }
        ProjectAction::Create { name, description } => {
            let project = lexicon.create_project(&name, description.as_deref())?;
            println!("Created project '{}' ({})", project.name, project.id);
        }
        ProjectAction::Switch { id } => {
            lexicon.switch_to_project(&id)?;
            println!("Switched to {}", id);
        }
        ProjectAction::Save => {
            if lexicon.update_current_project()? {
                println!("Saved current project");
            } else {
                println!("No current project");
            }
        }
        ProjectAction::Rename { id, name, description } => {
            if !lexicon.rename_project(&id, &name, description.as_deref())? {
                anyhow::bail!("Project not found: {}", id);
            }
        }
        ProjectAction::Delete { id } => {
            if !lexicon.delete_project(&id)? {
                anyhow::bail!("Project not found: {}", id);
            }
        }
        ProjectAction::Export { id, path } => {
            let project = lexicon
                .export_project(&id)?
                .with_context(|| format!("Project not found: {}", id))?;
            write_json(&project, path.as_ref())?;
        }
    }
    Ok(())
}
