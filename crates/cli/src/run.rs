//! Command execution

use crate::npy::{read_npy, NpyArray};
use crate::parse::{CliAction, ConstructArgs, QueryArgs};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};
use vecnav_api::{
    create_from_request, load, ConfigurationMap, CreateRequest, DataType, Neighbor,
    ReorderStrategy,
};
use vecnav_engine::read_header;

/// Execute an action, returning the text to print
pub fn execute(action: CliAction) -> Result<String, String> {
    match action {
        CliAction::Construct(args) => construct(&args),
        CliAction::Query(args) => query(&args),
        CliAction::Info { index } => info_cmd(&index),
    }
}

fn read_array(path: &Path) -> Result<NpyArray, String> {
    read_npy(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn read_options(path: &Path) -> Result<ConfigurationMap, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("Invalid options file {}: {}", path.display(), e))
}

fn construct(args: &ConstructArgs) -> Result<String, String> {
    let array = read_array(&args.data)?;
    let file_type = array
        .data_type()
        .ok_or_else(|| format!("{} does not hold f4, u1 or i1 vectors", args.data.display()))?;
    if let Some(name) = &args.data_type {
        let requested =
            DataType::parse(name).ok_or_else(|| format!("Unknown data type: {}", name))?;
        if requested != file_type {
            return Err(format!(
                "--data-type {} does not match file element type {}",
                requested, file_type
            ));
        }
    }

    let mut options = match &args.options_file {
        Some(path) => read_options(path)?,
        None => ConfigurationMap::new(),
    };
    options.extend(args.overrides.clone());

    let request = CreateRequest {
        metric: args.metric.clone(),
        data_type: file_type.name().to_string(),
        dimension: i64::try_from(array.cols).map_err(|e| e.to_string())?,
        capacity: i64::try_from(array.rows).map_err(|e| e.to_string())?,
        entry_policy: args.entry_policy.clone(),
        options,
    };
    let mut index = create_from_request(&request).map_err(|e| e.to_string())?;

    let start = Instant::now();
    let mut inserted = 0;
    while inserted < array.rows {
        let end = (inserted + args.batch_size).min(array.rows);
        let batch = array
            .rows(inserted..end)
            .ok_or_else(|| "Data rows out of range".to_string())?;
        let labels: Vec<u64> = (inserted as u64..end as u64).collect();
        index.add(batch, &labels).map_err(|e| e.to_string())?;
        inserted = end;
        info!(inserted, total = array.rows, "building index");
    }
    let build_secs = start.elapsed().as_secs_f64();

    if args.reorder {
        let start = Instant::now();
        index.reorder(ReorderStrategy::ReverseCuthillMckee);
        debug!(secs = start.elapsed().as_secs_f64(), "reordered");
    }

    index.save(&args.output).map_err(|e| e.to_string())?;

    Ok(format!(
        "Built {} index of {} vectors (dimension {}) in {:.2}s -> {}",
        index.specialization(),
        index.len(),
        index.dimension(),
        build_secs,
        args.output.display()
    ))
}

fn query(args: &QueryArgs) -> Result<String, String> {
    let index = load(&args.index).map_err(|e| e.to_string())?;
    let queries = read_array(&args.queries)?;
    if queries.data_type() != Some(index.data_type()) {
        return Err(format!(
            "Query element type does not match index type {}",
            index.data_type()
        ));
    }
    if queries.cols != index.dimension() {
        return Err(format!(
            "Query dimension {} does not match index dimension {}",
            queries.cols,
            index.dimension()
        ));
    }

    let start = Instant::now();
    let mut results = Vec::with_capacity(queries.rows);
    for i in 0..queries.rows {
        let query = queries
            .row(i)
            .ok_or_else(|| format!("Query row {} out of range", i))?;
        let neighbors = match args.ef_search {
            Some(ef) => index.search_with_ef(query, args.k, ef),
            None => index.search(query, args.k),
        }
        .map_err(|e| e.to_string())?;
        results.push(neighbors);
    }
    let secs = start.elapsed().as_secs_f64();
    info!(
        queries = queries.rows,
        secs,
        qps = queries.rows as f64 / secs.max(f64::EPSILON),
        "search finished"
    );

    match &args.ground_truth {
        Some(path) => {
            let truth = read_array(path)?;
            let rows = truth
                .int_rows()
                .ok_or_else(|| format!("{} is not an <i4 matrix", path.display()))?;
            if truth.rows < queries.rows || truth.cols < args.k {
                return Err(format!(
                    "Ground truth is {}x{}, need at least {}x{}",
                    truth.rows, truth.cols, queries.rows, args.k
                ));
            }
            let truth: Vec<&[i32]> = rows.collect();
            let recall = recall_at_k(&results, &truth, args.k);
            Ok(format!("recall@{}: {:.4}", args.k, recall))
        }
        None => Ok(results
            .iter()
            .map(|neighbors| {
                neighbors
                    .iter()
                    .map(|n| n.label.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Fraction of the true top-`k` ids found among the returned neighbors
pub fn recall_at_k(results: &[Vec<Neighbor>], truth: &[&[i32]], k: usize) -> f64 {
    if results.is_empty() || k == 0 {
        return 0.0;
    }
    let hits: usize = results
        .iter()
        .zip(truth)
        .map(|(found, expected)| {
            let expected = &expected[..k.min(expected.len())];
            found
                .iter()
                .take(k)
                .filter(|n| expected.iter().any(|&id| id >= 0 && id as u64 == n.label))
                .count()
        })
        .sum();
    hits as f64 / (results.len() * k) as f64
}

fn info_cmd(path: &Path) -> Result<String, String> {
    let header = read_header(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok([
        format!("format version:     {}", header.format_version),
        format!("metric:             {}", header.key.metric),
        format!("data type:          {}", header.key.data_type),
        format!("entry policy:       {}", header.entry_policy),
        format!("dimension:          {}", header.dimension),
        format!("capacity:           {}", header.capacity),
        format!("max edges per node: {}", header.max_edges_per_node),
        format!("vectors:            {}", header.len),
        format!("body bytes:         {}", header.body_len),
    ]
    .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npy::tests::{encode, f32_bytes};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn neighbors(labels: &[u64]) -> Vec<Neighbor> {
        labels
            .iter()
            .map(|&label| Neighbor {
                label,
                distance: 0.0,
            })
            .collect()
    }

    fn grid_points() -> Vec<f32> {
        (0..25)
            .flat_map(|i| [(i % 5) as f32, (i / 5) as f32])
            .collect()
    }

    fn construct_args(dir: &TempDir) -> ConstructArgs {
        let data = dir.path().join("data.npy");
        fs::write(&data, encode("<f4", "(25, 2)", &f32_bytes(&grid_points()))).unwrap();
        ConstructArgs {
            data,
            output: dir.path().join("grid.vnav"),
            metric: "l2".into(),
            data_type: None,
            entry_policy: "sampled_greedy".into(),
            options_file: None,
            overrides: ConfigurationMap::new(),
            batch_size: 7,
            reorder: false,
        }
    }

    #[test]
    fn test_recall_at_k() {
        let results = vec![neighbors(&[1, 2, 3]), neighbors(&[4, 5, 6])];
        let truth: Vec<&[i32]> = vec![&[1, 2, 9, 9], &[6, 0, 0, 0]];
        let recall = recall_at_k(&results, &truth, 3);
        assert!((recall - 3.0 / 6.0).abs() < 1e-9);
        assert_eq!(recall_at_k(&[], &[], 3), 0.0);
    }

    #[test]
    fn test_construct_query_info_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut args = construct_args(&dir);
        args.overrides
            .insert("max_edges_per_node".into(), serde_json::json!(32));
        args.reorder = true;

        let message = execute(CliAction::Construct(args.clone())).unwrap();
        assert!(message.contains("25 vectors"));

        let info = execute(CliAction::Info {
            index: args.output.clone(),
        })
        .unwrap();
        assert!(info.contains("max edges per node: 32"));
        assert!(info.contains("vectors:            25"));

        // Query with the first three points and their own ids as truth.
        let queries = dir.path().join("q.npy");
        fs::write(&queries, encode("<f4", "(3, 2)", &f32_bytes(&grid_points()[..6]))).unwrap();
        let truth = dir.path().join("gt.npy");
        let ids: Vec<u8> = [0i32, 1, 2].iter().flat_map(|v| v.to_le_bytes()).collect();
        fs::write(&truth, encode("<i4", "(3, 1)", &ids)).unwrap();

        let output = execute(CliAction::Query(QueryArgs {
            index: args.output.clone(),
            queries: queries.clone(),
            k: 1,
            ef_search: Some(32),
            ground_truth: Some(truth),
        }))
        .unwrap();
        assert_eq!(output, "recall@1: 1.0000");

        let listing = execute(CliAction::Query(QueryArgs {
            index: args.output,
            queries,
            k: 1,
            ef_search: None,
            ground_truth: None,
        }))
        .unwrap();
        assert_eq!(listing, "0\n1\n2");
    }

    #[test]
    fn test_options_file_and_overrides() {
        let dir = TempDir::new().unwrap();
        let options = dir.path().join("options.toml");
        fs::write(&options, "max_edges_per_node = 12\nef_search = 30\n").unwrap();

        let mut args = construct_args(&dir);
        args.options_file = Some(options);
        args.overrides.insert("ef_search".into(), serde_json::json!(45));
        execute(CliAction::Construct(args.clone())).unwrap();

        let index = load(&args.output).unwrap();
        assert_eq!(index.max_edges_per_node(), 12);
        assert_eq!(index.options().ef_search, 45);
    }

    #[test]
    fn test_bad_options_file_rejected() {
        let dir = TempDir::new().unwrap();
        let options = dir.path().join("options.toml");
        fs::write(&options, "max_edges = 12\n").unwrap();

        let mut args = construct_args(&dir);
        args.options_file = Some(options);
        let err = execute(CliAction::Construct(args)).unwrap_err();
        assert!(err.contains("options"), "{}", err);
    }

    #[test]
    fn test_data_type_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = construct_args(&dir);
        args.data_type = Some("uint8".into());
        let err = execute(CliAction::Construct(args)).unwrap_err();
        assert!(err.contains("does not match"));
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let dir = TempDir::new().unwrap();
        let mut args = construct_args(&dir);
        args.metric = "cosine".into();
        let err = execute(CliAction::Construct(args)).unwrap_err();
        assert!(err.contains("cosine"));
    }

    #[test]
    fn test_info_on_missing_file() {
        let err = execute(CliAction::Info {
            index: PathBuf::from("/nonexistent/index.vnav"),
        })
        .unwrap_err();
        assert!(err.contains("index.vnav"));
    }
}
