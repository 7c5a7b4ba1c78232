//! ArgMatches → CliAction conversion

use clap::ArgMatches;
use std::path::PathBuf;
use vecnav_api::ConfigurationMap;

/// A fully parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    /// Build and save an index
    Construct(ConstructArgs),
    /// Search a saved index
    Query(QueryArgs),
    /// Print an index file header
    Info { index: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructArgs {
    pub data: PathBuf,
    pub output: PathBuf,
    pub metric: String,
    pub data_type: Option<String>,
    pub entry_policy: String,
    pub options_file: Option<PathBuf>,
    /// Options given as flags; these win over the options file
    pub overrides: ConfigurationMap,
    pub batch_size: usize,
    pub reorder: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryArgs {
    pub index: PathBuf,
    pub queries: PathBuf,
    pub k: usize,
    pub ef_search: Option<usize>,
    pub ground_truth: Option<PathBuf>,
}

/// Flag name → engine option key
const OPTION_FLAGS: [(&str, &str); 5] = [
    ("max-edges", "max_edges_per_node"),
    ("ef-construction", "ef_construction"),
    ("ef-search", "ef_search"),
    ("num-initializations", "num_initializations"),
    ("seed", "seed"),
];

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "construct" => parse_construct(m),
        "query" => parse_query(m),
        "info" => Ok(CliAction::Info {
            index: PathBuf::from(required(m, "index")?),
        }),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn parse_construct(m: &ArgMatches) -> Result<CliAction, String> {
    let mut overrides = ConfigurationMap::new();
    for (flag, key) in OPTION_FLAGS {
        if let Some(value) = optional_number::<u64>(m, flag)? {
            overrides.insert(key.to_string(), serde_json::Value::from(value));
        }
    }

    let batch_size = optional_number::<usize>(m, "batch-size")?.unwrap_or(10_000);
    if batch_size == 0 {
        return Err("Invalid batch-size: must be > 0".to_string());
    }

    Ok(CliAction::Construct(ConstructArgs {
        data: PathBuf::from(required(m, "data")?),
        output: PathBuf::from(required(m, "output")?),
        metric: required(m, "metric")?.clone(),
        data_type: m.get_one::<String>("data-type").cloned(),
        entry_policy: required(m, "entry-policy")?.clone(),
        options_file: m.get_one::<String>("options").map(PathBuf::from),
        overrides,
        batch_size,
        reorder: m.get_flag("reorder"),
    }))
}

fn parse_query(m: &ArgMatches) -> Result<CliAction, String> {
    let k = optional_number::<usize>(m, "k")?.unwrap_or(10);
    if k == 0 {
        return Err("Invalid k: must be > 0".to_string());
    }
    Ok(CliAction::Query(QueryArgs {
        index: PathBuf::from(required(m, "index")?),
        queries: PathBuf::from(required(m, "queries")?),
        k,
        ef_search: optional_number::<usize>(m, "ef-search")?,
        ground_truth: m.get_one::<String>("ground-truth").map(PathBuf::from),
    }))
}

fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a String, String> {
    m.get_one::<String>(name)
        .ok_or_else(|| format!("Missing argument: {}", name))
}

fn optional_number<T>(m: &ArgMatches, name: &str) -> Result<Option<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    m.get_one::<String>(name)
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| format!("Invalid {}: {}", name, e))
        })
        .transpose()
}
