use std::path::Path;

use image::{Rgb, RgbImage};
use palette::{Gradient, LinSrgb};

use crate::error::Result;
use crate::heightfield::HeightfieldDescriptor;

// Sun at 45° azimuth, 45° altitude
const LIGHT_AZIMUTH: f32 = std::f32::consts::FRAC_PI_4;
const LIGHT_ALTITUDE: f32 = std::f32::consts::FRAC_PI_4;

// deep water → sand → grass → rock → snow
fn terrain_gradient() -> Gradient<LinSrgb> {
    Gradient::with_domain(vec![
        (0.00, LinSrgb::new(0.0, 0.0, 0.5)),
        (0.30, LinSrgb::new(0.8, 0.8, 0.5)),
        (0.50, LinSrgb::new(0.1, 0.6, 0.2)),
        (0.75, LinSrgb::new(0.5, 0.4, 0.3)),
        (1.00, LinSrgb::new(1.0, 1.0, 1.0)),
    ])
}

// Lambertian shading per grid sample, row-major like the heightfield.
// Slopes are taken in world units so the picture reflects the real relief.
pub fn hillshade(heightfield: &HeightfieldDescriptor) -> Vec<f32> {
    let side = heightfield.side();
    let n = heightfield.subdivisions() as f32;
    let scale = heightfield.scale();
    let cell_x = scale.x / n;
    let cell_z = scale.z / n;

    let (sin_alt, cos_alt) = LIGHT_ALTITUDE.sin_cos();
    let (sin_az, cos_az) = LIGHT_AZIMUTH.sin_cos();
    let light = [cos_az * cos_alt, sin_az * cos_alt, sin_alt];

    let mut shade = Vec::with_capacity(side * side);
    for iz in 0..side {
        for ix in 0..side {
            // Central differences, one-sided on the border
            let (x0, x1) = (ix.saturating_sub(1), (ix + 1).min(side - 1));
            let (z0, z1) = (iz.saturating_sub(1), (iz + 1).min(side - 1));
            let dhdx = (heightfield.height_at(x1, iz) - heightfield.height_at(x0, iz)) * scale.y
                / ((x1 - x0) as f32 * cell_x);
            let dhdz = (heightfield.height_at(ix, z1) - heightfield.height_at(ix, z0)) * scale.y
                / ((z1 - z0) as f32 * cell_z);

            let (nx, ny, nz) = (-dhdx, -dhdz, 1.0);
            let len = (nx * nx + ny * ny + nz * nz).sqrt();
            let dot = (nx * light[0] + ny * light[1] + nz * light[2]) / len;
            shade.push(dot.max(0.0));
        }
    }
    shade
}

// One pixel per grid sample; image x follows grid x, image y follows grid z
pub fn render(heightfield: &HeightfieldDescriptor) -> RgbImage {
    let side = heightfield.side();
    let gradient = terrain_gradient();
    let shade = hillshade(heightfield);
    let (min, max) = heightfield.height_range();

    let mut img = RgbImage::new(side as u32, side as u32);
    for iz in 0..side {
        for ix in 0..side {
            let h = heightfield.height_at(ix, iz);
            let norm = if (max - min).abs() < f32::EPSILON {
                0.5
            } else {
                (h - min) / (max - min)
            };
            let rgb = gradient.get(norm).into_format::<u8>();
            let light = (shade[iz * side + ix] * 0.5 + 0.5).clamp(0.0, 1.0);
            let pixel = Rgb([
                (rgb.red as f32 * light) as u8,
                (rgb.green as f32 * light) as u8,
                (rgb.blue as f32 * light) as u8,
            ]);
            img.put_pixel(ix as u32, iz as u32, pixel);
        }
    }
    img
}

pub fn save(heightfield: &HeightfieldDescriptor, path: &Path) -> Result<()> {
    render(heightfield).save(path)?;
    log::info!("saved terrain preview to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::Scale;
    use crate::noise::SineOctaves;

    #[test]
    fn image_matches_grid() {
        let hf = HeightfieldDescriptor::generate(16, Scale::default(), &SineOctaves::default())
            .unwrap();
        let img = render(&hf);
        assert_eq!(img.dimensions(), (17, 17));
    }

    #[test]
    fn flat_terrain_is_evenly_lit() {
        let hf = HeightfieldDescriptor::from_parts(2, Scale::default(), vec![0.4; 9]).unwrap();
        let shade = hillshade(&hf);
        let expected = LIGHT_ALTITUDE.sin();
        assert!(shade.iter().all(|s| (s - expected).abs() < 1e-6));

        let img = render(&hf);
        let first = *img.get_pixel(0, 0);
        assert!(img.pixels().all(|p| *p == first));
    }

    #[test]
    fn slope_facing_light_is_brighter() {
        // Rises towards -x, so the surface tilts towards the +x light
        let rising = HeightfieldDescriptor::from_parts(
            1,
            Scale::new(1.0, 1.0, 1.0),
            vec![1.0, 0.0, 1.0, 0.0],
        )
        .unwrap();
        let falling = HeightfieldDescriptor::from_parts(
            1,
            Scale::new(1.0, 1.0, 1.0),
            vec![0.0, 1.0, 0.0, 1.0],
        )
        .unwrap();
        assert!(hillshade(&rising)[0] > hillshade(&falling)[0]);
    }

    #[test]
    fn save_writes_png() {
        let hf = HeightfieldDescriptor::generate(8, Scale::default(), &SineOctaves::default())
            .unwrap();
        let path = std::env::temp_dir().join(format!("hillfox-preview-{}.png", std::process::id()));
        save(&hf, &path).unwrap();
        let reopened = image::open(&path).unwrap();
        assert_eq!(reopened.width(), 9);
        std::fs::remove_file(&path).unwrap();
    }
}
