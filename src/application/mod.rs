// Feature extraction, scaling, offline pipelines and the serving loop
pub mod ml;
