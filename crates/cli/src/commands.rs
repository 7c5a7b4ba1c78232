//! clap command tree

use clap::{Arg, ArgAction, Command};

/// Build the top-level `vecnav` command
pub fn build_cli() -> Command {
    Command::new("vecnav")
        .about("Build and query navigable-graph vector indexes")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Log progress to stderr (-v info, -vv debug)"),
        )
        .subcommand(construct_cmd())
        .subcommand(query_cmd())
        .subcommand(info_cmd())
}

fn construct_cmd() -> Command {
    Command::new("construct")
        .about("Build an index from an .npy matrix and save it")
        .arg(
            Arg::new("data")
                .required(true)
                .help("Row-major .npy file of vectors (<f4, |u1 or |i1)"),
        )
        .arg(Arg::new("output").required(true).help("Index file to write"))
        .arg(
            Arg::new("metric")
                .long("metric")
                .default_value("l2")
                .help("Distance metric: l2 or inner_product"),
        )
        .arg(
            Arg::new("data-type")
                .long("data-type")
                .help("Element type; must match the file (default: taken from the file)"),
        )
        .arg(
            Arg::new("entry-policy")
                .long("entry-policy")
                .default_value("sampled_greedy")
                .help("Entry node policy: first_node, random or sampled_greedy"),
        )
        .arg(
            Arg::new("options")
                .long("options")
                .help("TOML file of engine options"),
        )
        .arg(
            Arg::new("max-edges")
                .long("max-edges")
                .help("Maximum outgoing links per node"),
        )
        .arg(
            Arg::new("ef-construction")
                .long("ef-construction")
                .help("Beam width while inserting"),
        )
        .arg(
            Arg::new("ef-search")
                .long("ef-search")
                .help("Default beam width stored with the index"),
        )
        .arg(
            Arg::new("num-initializations")
                .long("num-initializations")
                .help("Nodes sampled by the sampled_greedy policy"),
        )
        .arg(Arg::new("seed").long("seed").help("Seed for the random policy"))
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .default_value("10000")
                .help("Vectors inserted per batch"),
        )
        .arg(
            Arg::new("reorder")
                .long("reorder")
                .action(ArgAction::SetTrue)
                .help("Renumber nodes (reverse Cuthill-McKee) before saving"),
        )
}

fn query_cmd() -> Command {
    Command::new("query")
        .about("Search a saved index with an .npy matrix of queries")
        .arg(Arg::new("index").required(true).help("Index file"))
        .arg(
            Arg::new("queries")
                .required(true)
                .help("Row-major .npy file of query vectors"),
        )
        .arg(
            Arg::new("k")
                .short('k')
                .default_value("10")
                .help("Neighbors per query"),
        )
        .arg(
            Arg::new("ef-search")
                .long("ef-search")
                .help("Beam width (default: stored with the index)"),
        )
        .arg(
            Arg::new("ground-truth")
                .long("ground-truth")
                .help("<i4 .npy matrix of true neighbor ids; prints recall@k"),
        )
}

fn info_cmd() -> Command {
    Command::new("info")
        .about("Print the header of a saved index")
        .arg(Arg::new("index").required(true).help("Index file"))
}
