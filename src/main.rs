//! pipehub - reconcile the pipe hubs of a saved node graph
//!
//! Loads a graph, runs the same boot scan an editor would run after opening
//! it, then reports each hub's pairs and optionally saves the result.

use clap::Parser;
use pipehub::constants::hub;
use pipehub::nodes::port::pair_index;
use pipehub::{HostGraph, HubConfig, NodeGraph, PipeHubEngine};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Reconcile the pipe hubs of a saved node graph
#[derive(Parser, Debug)]
#[command(name = "pipehub", version)]
struct Cli {
    /// Serialized node graph to load
    #[arg(value_name = "GRAPH")]
    graph: PathBuf,
    /// Hub config file, instead of the one in the user config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Write the reconciled graph here
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

fn load_graph(path: &Path) -> Result<NodeGraph, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    NodeGraph::from_json(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

fn save_graph(path: &Path, graph: &NodeGraph) -> Result<(), String> {
    let json = graph
        .to_json_pretty()
        .map_err(|e| format!("Failed to serialize graph: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

fn run(args: Cli) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => HubConfig::load(path).map_err(|e| e.to_string())?,
        None => HubConfig::load_or_default(),
    };

    let mut graph = load_graph(&args.graph)?;
    let mut engine = PipeHubEngine::new(config);
    let ids: Vec<_> = graph.nodes.keys().copied().collect();
    for id in ids {
        engine.on_node_created(&mut graph, id);
    }
    engine.on_graph_loaded();
    let tasks = engine.run_until_idle(&mut graph);
    log::info!("Settled after {} tasks", tasks);

    for id in engine.states().ids() {
        let Some(node) = graph.node(id) else {
            continue;
        };
        let pairs = node
            .inputs
            .iter()
            .filter(|slot| pair_index(&slot.name, hub::PAIR_INPUT_PREFIX).is_some())
            .count();
        println!("{} #{}: {} pairs", node.title, id, pairs);
        if let Some(state) = engine.hub_state(id) {
            for k in 1..=pairs {
                if let Some(label) = state.display_label(k) {
                    println!("  {:>2}  {}", k, label);
                }
            }
        }
    }

    if let Some(out) = &args.out {
        save_graph(out, &graph)?;
        println!("Saved {}", out.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Cli::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
