use hillfox_core::{Scale, generate_terrain};
use hillfox_storage::{DEFAULT_COLLECTION, DEFAULT_DB, MongoTerrainStore, load_terrain, save_terrain};

#[tokio::main]
async fn main() -> hillfox_storage::Result<()> {
    let (hf, _mesh) = generate_terrain(64, Scale::default())?;

    let store = MongoTerrainStore::init("mongodb://localhost:27017", DEFAULT_DB, DEFAULT_COLLECTION).await?;
    save_terrain(&store, &hf).await?;

    match load_terrain(&store).await? {
        Some(found) => println!(
            "Round-trip success: height at (32, 32) = {}",
            found.height_at(32, 32)
        ),
        None => println!("Terrain not found!"),
    }

    Ok(())
}
