//! Command line front end: voxelize built-in shapes, score their similarity
//! and compare the execution backends.

use std::time::Instant;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use voxel_iou::{
    Backend, DEFAULT_RESOLUTION, FillMode, Grid, Mesh, SimilarityEngine, Voxelizer,
    VoxelizerConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Voxelize one shape and print the grid summary
    Voxelize {
        #[arg(short, long, value_enum)]
        shape: Shape,

        /// Cells along the longest axis
        #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
        resolution: u32,

        #[arg(short, long, value_enum, default_value_t = BackendArg::Parallel)]
        backend: BackendArg,

        /// Skip the interior fill
        #[arg(long)]
        surface_only: bool,
    },
    /// Volumetric IoU of two shapes, as a percentage
    Similarity {
        #[arg(long, value_enum)]
        a: Shape,

        #[arg(long, value_enum)]
        b: Shape,

        /// Translation applied to the second shape, `x,y,z`
        #[arg(long, value_parser = parse_offset, default_value = "0,0,0")]
        offset: Vec3,

        #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
        resolution: u32,

        #[arg(short, long, value_enum, default_value_t = BackendArg::Parallel)]
        backend: BackendArg,

        /// Also color the first shape's vertices by local similarity
        #[arg(long)]
        heatmap: bool,
    },
    /// Run the sequential and parallel backends on the same shape
    CompareBackends {
        #[arg(short, long, value_enum)]
        shape: Shape,

        #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
        resolution: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Shape {
    Cube,
    Tetrahedron,
    Plane,
}

impl Shape {
    fn mesh(self) -> Mesh {
        match self {
            Shape::Cube => Mesh::unit_cube(),
            Shape::Tetrahedron => Mesh::tetrahedron(),
            Shape::Plane => Mesh::plane(1.0),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Sequential,
    Parallel,
    Gpu,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sequential => Backend::Sequential,
            BackendArg::Parallel => Backend::Parallel,
            BackendArg::Gpu => Backend::Gpu,
        }
    }
}

fn parse_offset(s: &str) -> Result<Vec3> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => bail!("expected x,y,z, got {s:?}"),
    }
}

/// Truncates, so 99.999% never prints as 100%.
fn percentage(score: f32) -> f64 {
    (score as f64 * 10_000.0).floor() / 100.0
}

fn print_grid(grid: &Grid) {
    let dims = grid.dims();
    println!("Dimensions: {}x{}x{}", dims.x, dims.y, dims.z);
    println!("Unit: {}", grid.unit());
    println!("Filled: {} / {}", grid.filled_count(), grid.voxels().len());
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Command::Voxelize {
            shape,
            resolution,
            backend,
            surface_only,
        } => {
            let fill = if surface_only {
                FillMode::SurfaceOnly
            } else {
                FillMode::Volume
            };
            let voxelizer = VoxelizerConfig::new(resolution)
                .with_fill(fill)
                .with_backend(backend.into())
                .build()?;

            let start = Instant::now();
            let grid = voxelizer.voxelize(&shape.mesh(), resolution)?;
            let elapsed = start.elapsed();

            print_grid(&grid);
            println!("Elapsed: {:.3} ms", elapsed.as_secs_f64() * 1000.0);
        }
        Command::Similarity {
            a,
            b,
            offset,
            resolution,
            backend,
            heatmap,
        } => {
            let voxelizer = VoxelizerConfig::new(resolution)
                .with_backend(backend.into())
                .build()?;
            let mesh_a = a.mesh();
            let mesh_b = b.mesh().translated(offset);

            let start = Instant::now();
            let report = SimilarityEngine::new(voxelizer)
                .with_heatmap(heatmap)
                .compare(&mesh_a, &mesh_b, resolution)?;
            log::info!("compared in {:?}", start.elapsed());

            println!("Similarity: {:.2}%", percentage(report.score));
            println!(
                "Overlap volume: {} / union volume: {}",
                report.overlap_volume, report.union_volume
            );

            if let Some(colors) = report.vertex_colors {
                // green channel carries the level
                let levels: Vec<f32> = colors.iter().map(|c| c.y).collect();
                let min = levels.iter().copied().fold(f32::INFINITY, f32::min);
                let max = levels.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let mean = levels.iter().sum::<f32>() / levels.len().max(1) as f32;
                println!(
                    "Heat map over {} vertices: min {min:.3}, mean {mean:.3}, max {max:.3}",
                    levels.len()
                );
            }
        }
        Command::CompareBackends { shape, resolution } => {
            let mesh = shape.mesh();
            let mut grids = Vec::new();
            for backend in [Backend::Sequential, Backend::Parallel] {
                let voxelizer = VoxelizerConfig::new(resolution)
                    .with_backend(backend)
                    .build()?;
                let start = Instant::now();
                let grid = voxelizer.voxelize(&mesh, resolution)?;
                println!(
                    "{backend:?}: {} filled in {:.3} ms",
                    grid.filled_count(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                grids.push(grid);
            }
            if grids[0] == grids[1] {
                println!("Backends agree.");
            } else {
                bail!("sequential and parallel grids differ");
            }
        }
    }

    Ok(())
}
