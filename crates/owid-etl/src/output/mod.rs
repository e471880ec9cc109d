//! Output directories and the artifacts written into them.

mod area;
mod writers;

pub use area::{InputArea, OutputArea};
pub use writers::{
    DATASETS_FILE, DISTINCT_ENTITIES_FILE, DatasetSummary, ESTIMATES_FILE, PARTITION_DIR,
    read_distinct_entities, write_datasets, write_distinct_entities, write_estimates,
    write_partitions, write_table,
};
