// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! vidannotate - video timeline annotation
//!
//! Command line front end for creating and editing annotation datasets.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use vidannotate::models::schema::load_schema;
use vidannotate::util::time::format_position;
use vidannotate::{AnnotatedVideo, FieldGroup};

#[derive(Parser, Debug)]
#[command(author, version, about = "Annotate video timelines with schema-validated segments and frames")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a metadata schema and list its fields
    Schema {
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,
    },

    /// Create an empty dataset for a video
    New {
        #[arg(value_name = "VIDEO")]
        video: PathBuf,
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,
        /// Dataset file to write
        #[arg(short, long, value_name = "DATASET")]
        output: PathBuf,
    },

    /// Print the segments and frames of a dataset
    Info {
        #[arg(value_name = "DATASET")]
        dataset: PathBuf,
    },

    /// Add a segment starting at a position (in seconds)
    AddSegment {
        #[arg(value_name = "DATASET")]
        dataset: PathBuf,
        start: f64,
    },

    /// Add a frame at a position (in seconds)
    AddFrame {
        #[arg(value_name = "DATASET")]
        dataset: PathBuf,
        position: f64,
    },

    /// Set a metadata field on the segment (or frame) at a position
    Set {
        #[arg(value_name = "DATASET")]
        dataset: PathBuf,
        position: f64,
        field: String,
        value: String,
        /// Edit the frame at the position instead of its segment
        #[arg(long)]
        frame: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    match Cli::parse().command {
        Commands::Schema { schema } => {
            let schema = load_schema(&schema)
                .with_context(|| format!("Failed to load schema {}", schema.display()))?;
            print_group("segments", &schema.segments);
            print_group("frames", &schema.frames);
        }
        Commands::New { video, schema, output } => {
            let dataset = AnnotatedVideo::for_video(&video, &schema)
                .with_context(|| format!("Failed to open {}", video.display()))?;
            save(&dataset, &output)?;
        }
        Commands::Info { dataset } => {
            print_dataset(&open(&dataset)?);
        }
        Commands::AddSegment { dataset: path, start } => {
            let mut dataset = open(&path)?;
            let start = dataset.to_nearest_frame(start);
            let segment = dataset.add_segment(start)?;
            println!(
                "Added segment {} - {}",
                format_position(segment.start()),
                format_position(segment.end())
            );
            save(&dataset, &path)?;
        }
        Commands::AddFrame { dataset: path, position } => {
            let mut dataset = open(&path)?;
            let position = dataset.to_nearest_frame(position);
            dataset.add_frame(position)?;
            println!("Added frame at {position}s");
            save(&dataset, &path)?;
        }
        Commands::Set {
            dataset: path,
            position,
            field,
            value,
            frame,
        } => {
            let mut dataset = open(&path)?;
            let position = dataset.to_nearest_frame(position);
            let metadata = if frame {
                &mut dataset
                    .frame_mut(position)?
                    .with_context(|| format!("No frame at {position}s"))?
                    .metadata
            } else {
                &mut dataset
                    .segment_mut(position)
                    .with_context(|| format!("No segment at {position}s"))?
                    .metadata
            };
            let parsed = metadata.parse(&field, &value)?;
            metadata.set(&field, parsed)?;
            save(&dataset, &path)?;
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<AnnotatedVideo> {
    AnnotatedVideo::from_json_file(path).with_context(|| format!("Failed to load dataset {}", path.display()))
}

fn save(dataset: &AnnotatedVideo, path: &Path) -> Result<()> {
    dataset
        .to_json_file(path)
        .with_context(|| format!("Failed to save dataset {}", path.display()))
}

fn print_group(name: &str, group: &FieldGroup) {
    println!("{name}:");
    for field in group.fields() {
        match &field.values {
            Some(values) => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                println!("  {} ({}): {}", field.name, field.field_type, values.join(", "));
            }
            None => println!("  {} ({})", field.name, field.field_type),
        }
    }
}

fn print_dataset(dataset: &AnnotatedVideo) {
    let details = dataset.details();
    println!("Video:  {}", dataset.video().display());
    println!("Schema: {}", dataset.schema_file().display());
    println!(
        "        {}x{} @ {} fps, {}",
        details.width,
        details.height,
        details.framerate,
        format_position(details.duration)
    );

    for segment in dataset.segments() {
        println!(
            "{} - {}  {} frames",
            format_position(segment.start()),
            format_position(segment.end()),
            segment.frames().len()
        );
        for (name, value) in segment.metadata.iter() {
            println!("    {name} = {value}");
        }
    }
}
