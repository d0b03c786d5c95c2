use csv::ReaderBuilder;
use nalgebra::{DMatrix, DVector};
use rusty_cart::data::dataset::Dataset;
use rusty_cart::metrics::errors::RegressionMetrics;
use rusty_cart::trees::classifier::DecisionTreeClassifier;
use rusty_cart::trees::regressor::DecisionTreeRegressor;
use std::collections::HashMap;
use std::error::Error;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "usage: cart <regress|classify> <file.csv> <n_features> [max_depth]";
const SPLIT_SEED: u64 = 42;

fn read_rows(
    file_path: &str,
    dimension: usize,
) -> Result<(Vec<Vec<f64>>, Vec<String>), Box<dyn Error>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(file_path)?;
    let mut features = Vec::new();
    let mut labels = Vec::new();

    for result in reader.records() {
        let record = result?;
        let mut feature_row = Vec::with_capacity(dimension);

        for feature in record.iter().take(dimension) {
            feature_row.push(feature.trim().parse::<f64>()?);
        }
        if feature_row.len() != dimension {
            return Err(format!(
                "Expected {} features, got {}",
                dimension,
                feature_row.len()
            )
            .into());
        }

        let label = record.get(dimension).ok_or("Missing label")?;
        features.push(feature_row);
        labels.push(label.trim().to_string());
    }
    if features.is_empty() {
        return Err("The file contains no rows".into());
    }
    Ok((features, labels))
}

fn feature_matrix(features: &[Vec<f64>], dimension: usize) -> DMatrix<f64> {
    DMatrix::from_row_slice(features.len(), dimension, &features.concat())
}

fn read_file_classification(
    file_path: &str,
    dimension: usize,
) -> Result<Dataset<usize>, Box<dyn Error>> {
    let (features, labels) = read_rows(file_path, dimension)?;
    let mut label_map = HashMap::new();
    let codes = labels
        .into_iter()
        .map(|label| {
            let next = label_map.len();
            *label_map.entry(label).or_insert(next)
        })
        .collect::<Vec<_>>();
    info!(classes = label_map.len(), "encoded labels");

    Ok(Dataset::new(
        feature_matrix(&features, dimension),
        DVector::from_vec(codes),
    ))
}

fn read_file_regression(file_path: &str, dimension: usize) -> Result<Dataset<f64>, Box<dyn Error>> {
    let (features, labels) = read_rows(file_path, dimension)?;
    let targets = labels
        .iter()
        .map(|label| label.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dataset::new(
        feature_matrix(&features, dimension),
        DVector::from_vec(targets),
    ))
}

fn run_tree_classifier(
    file_path: &str,
    dimension: usize,
    max_depth: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let dataset = read_file_classification(file_path, dimension)?;
    let (train_dataset, test_dataset) = dataset.train_test_split(0.75, Some(SPLIT_SEED))?;

    let mut classifier = DecisionTreeClassifier::with_params(None, None, None, max_depth)?;
    classifier.fit(&train_dataset)?;
    let accuracy = classifier.score(&test_dataset)?;
    info!(accuracy = accuracy * 100.0, "evaluated classifier on held-out rows");
    Ok(())
}

fn run_tree_regressor(
    file_path: &str,
    dimension: usize,
    max_depth: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let dataset = read_file_regression(file_path, dimension)?;
    let (train_dataset, test_dataset) = dataset.train_test_split(0.75, Some(SPLIT_SEED))?;

    let mut regressor = DecisionTreeRegressor::with_params(None, None, max_depth)?;
    regressor.fit(&train_dataset)?;
    let predictions = regressor.predict(&test_dataset.x)?;
    let mse = regressor.mse(&test_dataset.y, &predictions)?;
    let r2 = regressor.r2(&test_dataset.y, &predictions)?;
    info!(mse, r2, "evaluated regressor on held-out rows");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (mode, file_path, dimension) = match args.as_slice() {
        [mode, file_path, dimension, ..] => (
            mode.as_str(),
            file_path.as_str(),
            dimension.parse::<usize>()?,
        ),
        _ => return Err(USAGE.into()),
    };
    let max_depth = args.get(3).map(|depth| depth.parse::<usize>()).transpose()?;

    match mode {
        "regress" => run_tree_regressor(file_path, dimension, max_depth),
        "classify" => run_tree_classifier(file_path, dimension, max_depth),
        _ => Err(USAGE.into()),
    }
}
