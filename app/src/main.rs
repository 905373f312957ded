use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hillfox_core::{
    GroundQuery, HeightfieldDescriptor, SceneConfig, TerrainGeneration, TerrainScene, preview,
};
use hillfox_physics::TerrainPhysics;
use hillfox_storage::{DEFAULT_COLLECTION, DEFAULT_DB, MongoTerrainStore, load_terrain, save_terrain};

#[derive(Parser)]
#[command(name = "hillfox")]
#[command(about = "Procedural terrain and grass generator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a terrain and grass field and print statistics
    Generate {
        #[command(flatten)]
        scene: SceneArgs,

        /// Write a hill-shaded preview PNG
        #[arg(long)]
        preview: Option<PathBuf>,
    },

    /// Generate a terrain and save its heightfield to MongoDB
    Save {
        #[command(flatten)]
        scene: SceneArgs,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Load the saved heightfield and rebuild the scene around it
    Load {
        #[command(flatten)]
        scene: SceneArgs,

        #[command(flatten)]
        db: DbArgs,
    },

    /// Compare sampled and collider ground height at a world position
    Probe {
        #[arg(allow_hyphen_values = true)]
        x: f32,

        #[arg(allow_hyphen_values = true)]
        z: f32,

        #[command(flatten)]
        scene: SceneArgs,
    },
}

#[derive(Args)]
struct SceneArgs {
    /// TOML scene config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the grass seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of grass blades
    #[arg(long)]
    blades: Option<u32>,
}

impl SceneArgs {
    fn resolve(&self) -> Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::load(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => SceneConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(blades) = self.blades {
            config.grass.blade_count = blades;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
struct DbArgs {
    /// MongoDB connection string
    #[arg(long, default_value = "mongodb://localhost:27017")]
    uri: String,

    #[arg(long, default_value = DEFAULT_DB)]
    db: String,

    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,
}

impl DbArgs {
    async fn connect(&self) -> Result<MongoTerrainStore> {
        MongoTerrainStore::init(&self.uri, &self.db, &self.collection)
            .await
            .with_context(|| format!("failed to connect to {}", self.uri))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate { scene, preview } => generate(&scene.resolve()?, preview),
        Commands::Save { scene, db } => save(&scene.resolve()?, &db),
        Commands::Load { scene, db } => load(&scene.resolve()?, &db),
        Commands::Probe { x, z, scene } => probe(&scene.resolve()?, x, z),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")
}

fn build(config: &SceneConfig) -> Result<TerrainGeneration> {
    let start = Instant::now();
    let generation = TerrainGeneration::build(config)?;
    log::debug!("scene built in {:.1?}", start.elapsed());
    Ok(generation)
}

fn generate(config: &SceneConfig, preview_path: Option<PathBuf>) -> Result<()> {
    let scene = TerrainScene::new();
    scene.install(build(config)?);
    let generation = scene.current()?;

    print_summary(&generation);
    if let Some(path) = preview_path {
        preview::save(&generation.heightfield, &path)?;
        println!("preview:   {}", path.display());
    }
    Ok(())
}

fn save(config: &SceneConfig, db: &DbArgs) -> Result<()> {
    let hf = HeightfieldDescriptor::generate(
        config.terrain.subdivisions,
        config.terrain.scale,
        &hillfox_core::SineOctaves::default(),
    )?;

    let rt = runtime()?;
    rt.block_on(async {
        let store = db.connect().await?;
        save_terrain(&store, &hf).await?;
        anyhow::Ok(())
    })?;

    println!(
        "saved {}x{} heightfield to {}/{}.{}",
        hf.side(),
        hf.side(),
        db.uri,
        db.db,
        db.collection
    );
    Ok(())
}

fn load(config: &SceneConfig, db: &DbArgs) -> Result<()> {
    let rt = runtime()?;
    let found = rt.block_on(async {
        let store = db.connect().await?;
        anyhow::Ok(load_terrain(&store).await?)
    })?;

    let Some(hf) = found else {
        println!("no terrain saved in {}.{}", db.db, db.collection);
        return Ok(());
    };

    let scene = TerrainScene::new();
    scene.install(TerrainGeneration::from_heightfield(hf, &config.grass, config.seed));
    print_summary(&*scene.current()?);
    Ok(())
}

fn probe(config: &SceneConfig, x: f32, z: f32) -> Result<()> {
    // Grass is irrelevant here; skip scattering it
    let mut config = config.clone();
    config.grass.blade_count = 0;
    let generation = build(&config)?;
    let physics = TerrainPhysics::from_heightfield(&generation.heightfield);

    let sampled = generation.ground_height(x, z);
    println!("position:  ({x}, {z})");
    println!("sampled:   {sampled:.4}");
    match physics.cast_ground(x, z) {
        Some(collider) => {
            println!("collider:  {collider:.4}");
            println!("delta:     {:.4}", (collider - sampled).abs());
        }
        None => println!("collider:  miss (outside the terrain)"),
    }
    println!("grounded:  {}", physics.is_grounded([x, sampled, z]));
    Ok(())
}

fn print_summary(generation: &TerrainGeneration) {
    let hf = &generation.heightfield;
    let scale = hf.scale();
    let (lo, hi) = hf.height_range();
    println!(
        "terrain:   {} subdivisions, {} x {} x {}",
        hf.subdivisions(),
        scale.x,
        scale.y,
        scale.z
    );
    println!(
        "mesh:      {} vertices, {} triangles",
        generation.mesh.positions.len(),
        generation.mesh.triangle_count()
    );
    println!(
        "heights:   {:.3}..{:.3} (world {:.3}..{:.3})",
        lo,
        hi,
        lo * scale.y,
        hi * scale.y
    );
    println!(
        "grass:     {} blades, {} triangles (seed {}, {} cells, {} discarded)",
        generation.grass.blade_count(),
        generation.grass.triangle_count(),
        generation.seed,
        generation.grass.lattice_cells,
        generation.grass.discarded
    );
}
