use std::path::Path;

use hillfox_core::{SceneConfig, TerrainGeneration, preview};

fn main() -> hillfox_core::Result<()> {
    // Default scene: 40 subdivisions over 100 x 100, one million blades
    let generation = TerrainGeneration::build(&SceneConfig::default())?;

    let (lo, hi) = generation.heightfield.height_range();
    println!(
        "terrain: {} triangles, heights {:.3}..{:.3}; grass: {} blades",
        generation.mesh.triangle_count(),
        lo,
        hi,
        generation.grass.blade_count()
    );

    let path = Path::new("terrain_preview.png");
    preview::save(&generation.heightfield, path)?;
    println!("Saved terrain preview to {:?}", path);
    Ok(())
}
