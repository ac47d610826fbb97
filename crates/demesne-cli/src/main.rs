//! Demesne CLI
//!
//! Operator tooling over a world snapshot file:
//! - inspect containment trees, room membership and boundary paths
//! - validate proposed Neighborhood/Room edits against a grant set
//! - commit a validated edit back to the snapshot (whole-mapping
//!   replacement, the same discipline the live services use)
//!
//! The snapshot and grants files are plain JSON in the wire format of
//! the world services; fetching and broadcasting them is someone else's
//! job.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use demesne_core::{GrantSet, HeaderMap, HeaderStore, Topology, Visibility};
use demesne_edits::{
    predict_reparent, predict_room_edit, validate_neighborhood_update, validate_room_update,
    NeighborhoodChange, NeighborhoodUpdate, RoomUpdate, Verdict,
};
use demesne_topology::{
    full_tree, neighborhood_only_tree, neighborhood_only_tree_excluding_subtree,
    neighborhood_paths, room_ids_in_neighborhood, Tree,
};
use std::fs;
use std::path::{Path, PathBuf};

mod snapshot;

use snapshot::SnapshotFile;

#[derive(Parser)]
#[command(name = "demesne")]
#[command(author, version, about = "Demesne: world-topology inspection and edit gating")]
struct Cli {
    /// World snapshot JSON file.
    #[arg(long, global = true, default_value = "world.json")]
    snapshot: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the containment tree.
    Tree {
        /// Keep only Neighborhood nodes.
        #[arg(long)]
        neighborhoods_only: bool,
        /// Exclude the branch at this exact ancestry path (implies
        /// --neighborhoods-only).
        #[arg(long, value_name = "ANCESTRY")]
        exclude: Option<String>,
        /// Emit JSON instead of the indented listing.
        #[arg(long)]
        json: bool,
    },

    /// List room ids, optionally restricted to one neighborhood's subtree.
    Rooms {
        #[arg(long, value_name = "ID")]
        neighborhood: Option<String>,
    },

    /// Report a neighborhood's boundary-crossing exits and entries.
    Paths {
        #[arg(long, value_name = "ID")]
        neighborhood: String,
        #[arg(long)]
        json: bool,
    },

    /// Validate (and optionally commit) a proposed Neighborhood edit.
    CheckNeighborhood {
        /// Grant set JSON file for the acting character.
        #[arg(long)]
        grants: PathBuf,
        #[arg(long, value_name = "ID")]
        id: String,
        #[arg(long, value_name = "ID")]
        parent: Option<String>,
        /// Public or Private.
        #[arg(long)]
        visibility: Option<String>,
        /// Connected or Dead-End.
        #[arg(long)]
        topology: Option<String>,
        /// Commit the predicted mapping back to the snapshot when valid.
        #[arg(long)]
        apply: bool,
    },

    /// Validate (and optionally commit) a proposed Room edit.
    CheckRoom {
        /// Grant set JSON file for the acting character.
        #[arg(long)]
        grants: PathBuf,
        #[arg(long, value_name = "ID")]
        id: String,
        #[arg(long, value_name = "ID")]
        parent: Option<String>,
        /// Replacement exits as JSON, e.g. '[{"RoomId":"ABC","Name":"east"}]'.
        #[arg(long, value_name = "JSON")]
        exits: Option<String>,
        /// Replacement entries as JSON.
        #[arg(long, value_name = "JSON")]
        entries: Option<String>,
        #[arg(long)]
        apply: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let snapshot = SnapshotFile::load(&cli.snapshot)
        .with_context(|| format!("loading snapshot {}", cli.snapshot.display()))?;

    match cli.command {
        Commands::Tree { neighborhoods_only, exclude, json } => {
            let tree = match &exclude {
                Some(ancestry) => {
                    neighborhood_only_tree_excluding_subtree(&snapshot.permanent_headers, ancestry)
                }
                None if neighborhoods_only => neighborhood_only_tree(&snapshot.permanent_headers),
                None => full_tree(&snapshot.permanent_headers),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print_tree(&tree, 0);
            }
        }

        Commands::Rooms { neighborhood } => {
            for room_id in
                room_ids_in_neighborhood(&snapshot.permanent_headers, neighborhood.as_deref())
            {
                println!("{room_id}");
            }
        }

        Commands::Paths { neighborhood, json } => {
            let paths = neighborhood_paths(&snapshot.permanent_headers, &neighborhood);
            if json {
                println!("{}", serde_json::to_string_pretty(&paths)?);
            } else {
                println!("{}", "Exits".bold());
                for edge in &paths.exits {
                    println!("  {} -> {}  ({})", edge.origin_id, edge.room_id, edge.name);
                }
                println!("{}", "Entries".bold());
                for edge in &paths.entries {
                    println!("  {} <- {}  ({})", edge.origin_id, edge.room_id, edge.name);
                }
                println!(
                    "{} distinct external rooms touched",
                    paths.distinct_touched_rooms()
                );
            }
        }

        Commands::CheckNeighborhood { grants, id, parent, visibility, topology, apply } => {
            let grants = load_grants(&grants)?;
            let update = NeighborhoodUpdate {
                permanent_id: id.clone(),
                parent_id: parent,
                visibility: visibility.as_deref().map(parse_visibility).transpose()?,
                topology: topology.as_deref().map(parse_topology).transpose()?,
            };
            let verdict = validate_neighborhood_update(&snapshot.permanent_headers, &grants, &update);
            report(&verdict);
            if verdict.is_valid() && apply {
                let change = NeighborhoodChange {
                    parent_id: update.parent_id.clone(),
                    visibility: update.visibility,
                    topology: update.topology,
                    ..Default::default()
                };
                let predicted = predict_reparent(&snapshot.permanent_headers, &id, &change);
                commit(&cli.snapshot, snapshot, predicted)?;
            } else if !verdict.is_valid() {
                std::process::exit(1);
            }
        }

        Commands::CheckRoom { grants, id, parent, exits, entries, apply } => {
            let grants = load_grants(&grants)?;
            let update = RoomUpdate {
                permanent_id: id.clone(),
                parent_id: parent,
                exits: exits
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()
                    .context("parsing --exits")?,
                entries: entries
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()
                    .context("parsing --entries")?,
            };
            let verdict = validate_room_update(&snapshot.permanent_headers, &grants, &update);
            report(&verdict);
            if verdict.is_valid() && apply {
                let current = snapshot
                    .permanent_headers
                    .get(&id)
                    .ok_or_else(|| anyhow!("unknown room {id}"))?;
                let predicted = predict_room_edit(
                    &snapshot.permanent_headers,
                    &id,
                    update.parent_id.as_deref().or(current.parent_id.as_deref()),
                    update.exits.as_deref().unwrap_or(&current.exits),
                    update.entries.as_deref().unwrap_or(&current.entries),
                );
                commit(&cli.snapshot, snapshot, predicted)?;
            } else if !verdict.is_valid() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_tree(tree: &Tree, depth: usize) {
    for (id, node) in tree {
        let label = match &node.header {
            Some(h) if h.is_neighborhood() => {
                format!("{} {}", h.display_name().bold(), format!("[{id}]").dimmed())
            }
            Some(h) => format!("{} {}", h.display_name(), format!("[{id}]").dimmed()),
            None => format!("{}", format!("[{id}] (ghost)").dimmed()),
        };
        println!("{:indent$}{label}", "", indent = depth * 2);
        print_tree(&node.children, depth + 1);
    }
}

fn report(verdict: &Verdict) {
    if verdict.is_valid() {
        println!("{}", "valid".green().bold());
    } else {
        let reason = verdict.error.as_deref().unwrap_or("invalid");
        println!("{} {reason}", "invalid:".red().bold());
    }
}

fn commit(path: &Path, mut snapshot: SnapshotFile, predicted: HeaderMap) -> Result<()> {
    // Same discipline as the live services: the whole mapping is
    // replaced, never individual fields.
    let mut store = HeaderStore::new(std::mem::take(&mut snapshot.permanent_headers));
    let epoch = store.commit(predicted);
    snapshot.permanent_headers = store.snapshot();
    snapshot
        .save(path)
        .with_context(|| format!("writing snapshot {}", path.display()))?;
    println!("{} epoch {epoch}", "committed".green().bold());
    Ok(())
}

fn load_grants(path: &Path) -> Result<GrantSet> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading grants {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing grants {}", path.display()))
}

fn parse_visibility(value: &str) -> Result<Visibility> {
    match value {
        "Public" => Ok(Visibility::Public),
        "Private" => Ok(Visibility::Private),
        other => Err(anyhow!("unknown visibility {other:?} (expected Public or Private)")),
    }
}

fn parse_topology(value: &str) -> Result<Topology> {
    match value {
        "Connected" => Ok(Topology::Connected),
        "Dead-End" => Ok(Topology::DeadEnd),
        other => Err(anyhow!("unknown topology {other:?} (expected Connected or Dead-End)")),
    }
}
