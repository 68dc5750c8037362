//! Dataset I/O implementations and shared ingestion helpers.

use super::*;
use arrow::{
    array::{Array, ArrayRef, Float32Array, Float64Array, ListArray},
    datatypes::Float32Type,
    record_batch::RecordBatch,
};
use parquet::arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

fn canonicalize_dataset_path(file_path: &str) -> JetCloudResult<PathBuf> {
    Ok(Path::new(&*shellexpand::full(file_path)?).canonicalize()?)
}

fn expand_output_path(file_path: &str) -> JetCloudResult<PathBuf> {
    Ok(PathBuf::from(&*shellexpand::full(file_path)?))
}

/// Load the configured split of a JetNet-style dataset directory, which holds
/// one Parquet file per jet type (`t.parquet`, `g.parquet`, ...).
pub fn load_jetnet(config: &LoaderConfig) -> JetCloudResult<JetDataset> {
    let path = Path::new(&config.data_dir).join(format!("{}.parquet", config.jet_type.tag()));
    let path_str = path.to_str().ok_or_else(|| {
        JetCloudError::Custom(format!("Dataset path is not valid UTF-8: {}", path.display()))
    })?;
    log::info!(
        "Loading {} split of jet type '{}' from {}",
        config.split,
        config.jet_type,
        path_str
    );
    read_parquet(path_str, config)
}

/// Load a [`JetDataset`] from a single Parquet file.
///
/// Constituent features are read from `List<Float32|Float64>` columns named
/// after [`ParticleFeature::column_name`], jet features from scalar float
/// columns named after [`JetFeature::column_name`]. A scalar `pt` column is
/// always required: it supplies the reference jet momentum used to undo
/// preprocessing, independently of which jet features were requested.
///
/// The requested split is carved out of the file by cumulative split
/// fractions, then truncated to `n_jets` if a cap is supplied. When enabled in
/// the configuration, jet kinematics are recomputed from the point cloud and
/// the constituent momentum is moved to the log-squash domain, in that order.
pub fn read_parquet(file_path: &str, config: &LoaderConfig) -> JetCloudResult<JetDataset> {
    let path = canonicalize_dataset_path(file_path)?;
    let metadata = DatasetMetadata::new(
        config.particle_features.clone(),
        config.jet_features.clone(),
        config.num_particles,
    )?;

    let file = File::open(&path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    validate_schema(builder.schema().as_ref(), &metadata)?;
    let total_rows = builder.metadata().file_metadata().num_rows() as usize;

    let (start, mut end) = split_range(total_rows, config.split, config.split_fraction)?;
    if let Some(cap) = config.n_jets {
        end = end.min(start + cap);
    }

    let reader = builder.build()?;
    let mut jets: Vec<JetData> = Vec::with_capacity(end - start);
    let mut row_offset = 0usize;
    'batches: for batch in reader {
        let batch = batch?;
        let batch_start = row_offset;
        row_offset += batch.num_rows();
        if row_offset <= start {
            continue;
        }
        if batch_start >= end {
            break;
        }
        let particle_columns: Vec<&ListArray> = metadata
            .particle_features
            .iter()
            .map(|feature| prepare_list_column(&batch, feature.column_name()))
            .collect::<Result<_, _>>()?;
        let jet_columns: Vec<FloatColumn<'_>> = metadata
            .jet_features
            .iter()
            .map(|feature| prepare_float_column(&batch, feature.column_name()))
            .collect::<Result<_, _>>()?;
        let pt_column = prepare_float_column(&batch, JetFeature::Pt.column_name())?;

        for local_row in 0..batch.num_rows() {
            let global_row = batch_start + local_row;
            if global_row < start {
                continue;
            }
            if global_row >= end {
                break 'batches;
            }
            let mut constituents = vec![Constituent::default(); metadata.num_particles];
            for (feature, column) in metadata.particle_features.iter().zip(&particle_columns) {
                let values = column.value(local_row);
                assign_constituent_feature(&mut constituents, *feature, values.as_ref())?;
            }
            jets.push(JetData {
                constituents,
                features: jet_columns
                    .iter()
                    .map(|column| column.value(local_row))
                    .collect(),
                jet_pt: pt_column.value(local_row),
            });
        }
    }

    if config.recalculate_jet_from_pc {
        log::debug!("Recomputing jet kinematics from {} point clouds", jets.len());
        crate::kinematics::recompute_jet_features(&mut jets, &metadata);
    }
    if config.log_squash_pt {
        log::debug!("Moving constituent momenta to the log-squash domain");
        for jet in &mut jets {
            let mask = derive_mask(&jet.constituents);
            crate::transforms::log_squash_pt(&mut jet.constituents, jet.jet_pt, &mask);
        }
    }

    log::info!("Loaded {} jets from {}", jets.len(), path.display());
    JetDataset::new(jets, Arc::new(metadata), config.high_as_context)
}

/// Persist a [`JetDataset`] to a Parquet file in the schema [`read_parquet`]
/// consumes.
///
/// When `pt` is not among the jet features, a `pt` column is written from the
/// stored reference momenta so the file remains loadable.
pub fn write_parquet(
    dataset: &JetDataset,
    file_path: &str,
    options: &WriteOptions,
) -> JetCloudResult<()> {
    let path = expand_output_path(file_path)?;
    let batch_size = options.batch_size.max(1);
    let n_jets = dataset.n_jets();

    let first_end = batch_size.min(n_jets);
    let first_batch = jets_range_to_record_batch(dataset, 0, first_end)?;
    let file = File::create(&path)?;
    let mut writer = ArrowWriter::try_new(file, first_batch.schema(), None)?;
    writer.write(&first_batch)?;
    let mut start = first_end;
    while start < n_jets {
        let end = (start + batch_size).min(n_jets);
        writer.write(&jets_range_to_record_batch(dataset, start, end)?)?;
        start = end;
    }
    writer.close()?;
    log::info!("Wrote {} jets to {}", n_jets, path.display());
    Ok(())
}

/// Options for writing a [`JetDataset`] to a file.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Number of jets per written record batch.
    pub batch_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { batch_size: 1024 }
    }
}

fn split_range(
    total_rows: usize,
    split: Split,
    fractions: [f64; 3],
) -> JetCloudResult<(usize, usize)> {
    if fractions.iter().any(|f| !f.is_finite() || *f < 0.0)
        || fractions.iter().sum::<f64>() > 1.0 + 1e-9
    {
        return Err(JetCloudError::Custom(format!(
            "Invalid split fractions {fractions:?}: each must be non-negative and they must sum to at most one"
        )));
    }
    let boundary = |cumulative: f64| (total_rows as f64 * cumulative).floor() as usize;
    let (start, end) = match split {
        Split::Train => (0, boundary(fractions[0])),
        Split::Valid => (
            boundary(fractions[0]),
            boundary(fractions[0] + fractions[1]),
        ),
        Split::Test => (
            boundary(fractions[0] + fractions[1]),
            boundary(fractions[0] + fractions[1] + fractions[2]),
        ),
        Split::All => (0, total_rows),
    };
    Ok((start, end))
}

fn validate_schema(
    schema: &arrow::datatypes::Schema,
    metadata: &DatasetMetadata,
) -> JetCloudResult<()> {
    let has_column =
        |name: &str| schema.fields().iter().any(|field| field.name() == name);
    for feature in &metadata.particle_features {
        if !has_column(feature.column_name()) {
            return Err(JetCloudError::UnknownName {
                category: "particle feature column",
                name: feature.column_name().to_string(),
            });
        }
    }
    for feature in &metadata.jet_features {
        if !has_column(feature.column_name()) {
            return Err(JetCloudError::UnknownName {
                category: "jet feature column",
                name: feature.column_name().to_string(),
            });
        }
    }
    if !has_column(JetFeature::Pt.column_name()) {
        return Err(JetCloudError::UnknownName {
            category: "jet feature column",
            name: JetFeature::Pt.column_name().to_string(),
        });
    }
    Ok(())
}

enum FloatColumn<'a> {
    F32(&'a Float32Array),
    F64(&'a Float64Array),
}

impl FloatColumn<'_> {
    fn value(&self, row: usize) -> Float {
        match self {
            FloatColumn::F32(array) => array.value(row) as Float,
            FloatColumn::F64(array) => array.value(row),
        }
    }
}

fn prepare_float_column<'a>(batch: &'a RecordBatch, name: &str) -> JetCloudResult<FloatColumn<'a>> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| JetCloudError::UnknownName {
            category: "jet feature column",
            name: name.to_string(),
        })?;
    if let Some(array) = column.as_any().downcast_ref::<Float32Array>() {
        Ok(FloatColumn::F32(array))
    } else if let Some(array) = column.as_any().downcast_ref::<Float64Array>() {
        Ok(FloatColumn::F64(array))
    } else {
        Err(JetCloudError::Custom(format!(
            "Column \"{name}\" must hold Float32 or Float64 values, got {:?}",
            column.data_type()
        )))
    }
}

fn prepare_list_column<'a>(batch: &'a RecordBatch, name: &str) -> JetCloudResult<&'a ListArray> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| JetCloudError::UnknownName {
            category: "particle feature column",
            name: name.to_string(),
        })?;
    column
        .as_any()
        .downcast_ref::<ListArray>()
        .ok_or_else(|| {
            JetCloudError::Custom(format!(
                "Column \"{name}\" must hold lists of floats, got {:?}",
                column.data_type()
            ))
        })
}

fn assign_constituent_feature(
    constituents: &mut [Constituent],
    feature: ParticleFeature,
    values: &dyn Array,
) -> JetCloudResult<()> {
    if let Some(array) = values.as_any().downcast_ref::<Float32Array>() {
        for (slot, row) in constituents.iter_mut().zip(0..array.len()) {
            set_constituent_feature(slot, feature, array.value(row) as Float);
        }
        Ok(())
    } else if let Some(array) = values.as_any().downcast_ref::<Float64Array>() {
        for (slot, row) in constituents.iter_mut().zip(0..array.len()) {
            set_constituent_feature(slot, feature, array.value(row));
        }
        Ok(())
    } else {
        Err(JetCloudError::Custom(format!(
            "Constituent column \"{feature}\" must hold Float32 or Float64 values, got {:?}",
            values.data_type()
        )))
    }
}

fn set_constituent_feature(constituent: &mut Constituent, feature: ParticleFeature, value: Float) {
    match feature {
        ParticleFeature::EtaRel => constituent.eta_rel = value,
        ParticleFeature::PhiRel => constituent.phi_rel = value,
        ParticleFeature::PtRel => constituent.pt = value,
    }
}

fn constituent_feature(constituent: &Constituent, feature: ParticleFeature) -> Float {
    match feature {
        ParticleFeature::EtaRel => constituent.eta_rel,
        ParticleFeature::PhiRel => constituent.phi_rel,
        ParticleFeature::PtRel => constituent.pt,
    }
}

fn jets_range_to_record_batch(
    dataset: &JetDataset,
    start: usize,
    end: usize,
) -> JetCloudResult<RecordBatch> {
    let metadata = dataset.metadata();
    let jets = &dataset.jets()[start..end];
    let mut columns: Vec<(String, ArrayRef)> = Vec::new();
    for feature in metadata.particle_features() {
        let array = ListArray::from_iter_primitive::<Float32Type, _, _>(jets.iter().map(|jet| {
            Some(
                jet.constituents
                    .iter()
                    .map(|constituent| Some(constituent_feature(constituent, *feature) as f32))
                    .collect::<Vec<_>>(),
            )
        }));
        columns.push((
            feature.column_name().to_string(),
            Arc::new(array) as ArrayRef,
        ));
    }
    for (index, feature) in metadata.jet_features().iter().enumerate() {
        let array =
            Float32Array::from_iter_values(jets.iter().map(|jet| jet.features[index] as f32));
        columns.push((
            feature.column_name().to_string(),
            Arc::new(array) as ArrayRef,
        ));
    }
    if metadata.jet_feature_index(JetFeature::Pt).is_none() {
        let array = Float32Array::from_iter_values(jets.iter().map(|jet| jet.jet_pt as f32));
        columns.push((
            JetFeature::Pt.column_name().to_string(),
            Arc::new(array) as ArrayRef,
        ));
    }
    Ok(RecordBatch::try_from_iter(columns)?)
}
