//! Scene checker binary — loads a scene document and reports its structure.
//!
//! Usage: cargo run --bin scene_check -- <scene.json> [OPTIONS]
//!
//! Options:
//!   --tree    Print the resolved entity tree
//!
//! Exits non-zero if the document (or any ancestor in its inheritance
//! chain) fails to load. Missing parents and duplicate names are reported
//! as flags, not failures; the editor can open and repair those.

use std::process::ExitCode;
use std::sync::Arc;

use diorama::io::DiskFileAccess;
use diorama::scene::{SceneGraphLoader, SceneNodeId, SceneTree};

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(uri) = args.iter().skip(1).find(|a| !a.starts_with("--")) else {
        eprintln!("usage: scene_check <scene.json> [--tree]");
        return ExitCode::FAILURE;
    };
    let print_tree = args.iter().any(|a| a == "--tree");

    let runtime = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    let loader = SceneGraphLoader::new(Arc::new(DiskFileAccess::new()));

    let tree = match runtime.block_on(loader.load(uri)) {
        Ok(tree) => tree,
        Err(e) => {
            log::error!("failed to load {uri}: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("scene:      {}", tree.root_name());
    println!("entities:   {}", tree.node_count() - 1);
    if let Some(ancestor) = &tree.inherits_from {
        println!("inherits:   {ancestor}");
    }
    if !tree.ancestors.is_empty() {
        println!("chain:      {}", tree.ancestors.join(" -> "));
    }
    println!("missing:    {}", tree.has_missing_nodes());
    println!("duplicates: {}", tree.has_duplicate_names());

    if print_tree {
        println!();
        print_subtree(&tree, tree.root(), 0);
    }

    ExitCode::SUCCESS
}

fn print_subtree(tree: &SceneTree, id: SceneNodeId, depth: usize) {
    let Some(node) = tree.get(id) else { return };

    let mut flags = Vec::new();
    if node.missing {
        flags.push("missing");
    }
    if node.duplicate {
        flags.push("duplicate");
    }
    if node.save_entity {
        flags.push("saved");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    println!(
        "{:indent$}{} ({:?}){}",
        "",
        node.name,
        node.resolved_static,
        flags,
        indent = depth * 2
    );
    for child in tree.children(id) {
        print_subtree(tree, child, depth + 1);
    }
}
