use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::canvas::labels::{LabelRegistry, MAX_LABELS};
use crate::canvas::raster::{BACKGROUND, LabelId, LabelRaster};
use crate::error::{AnnotatorError, Result};
use crate::utils::color::{Rgb, default_label_color};

/// Raster and labels decoded from a mask file, already at working resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedMask {
    pub raster: LabelRaster,
    pub registry: LabelRegistry,
}

fn mask_name(id: LabelId) -> String {
    format!("mask_{id}")
}

/// `photo.jpg` saves its mask as `photo_mask.png` next to it.
pub fn default_mask_path(image_path: &Path) -> PathBuf {
    let stem = image_path.file_stem().and_then(|s| s.to_str()).unwrap_or("image");
    image_path.with_file_name(format!("{stem}_mask.png"))
}

/// Encode the raster as an 8-bit indexed PNG at `original_size`.
/// Palette entry `k` holds the color of label `k`; unused entries are black.
pub fn encode_mask(raster: &LabelRaster, registry: &LabelRegistry, original_size: (u32, u32)) -> Result<Vec<u8>> {
    let (w, h) = original_size;
    let scaled = raster.resized_nearest(w as usize, h as usize);
    let palette: Vec<u8> = registry.palette().iter().flatten().copied().collect();

    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, w, h);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(palette);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(scaled.cells())?;
        writer.finish()?;
    }
    Ok(bytes)
}

/// Write the mask file, resampled to the original image size.
pub fn save_mask(path: &Path, raster: &LabelRaster, registry: &LabelRegistry, original_size: (u32, u32)) -> Result<()> {
    let bytes = encode_mask(raster, registry, original_size)?;
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(&bytes)?;
    file.flush()?;
    log::info!(
        "saved mask {} ({}x{}, {} labels)",
        path.display(),
        original_size.0,
        original_size.1,
        registry.len()
    );
    Ok(())
}

/// Read a mask file and bring it to the working size.
pub fn load_mask(path: &Path, working_size: (usize, usize)) -> Result<LoadedMask> {
    let bytes = std::fs::read(path)?;
    let loaded = decode_mask(&bytes, working_size)?;
    log::info!("loaded mask {} ({} labels)", path.display(), loaded.registry.len());
    Ok(loaded)
}

/// Decode an indexed mask, or fall back to a legacy RGB color mask.
/// Nothing is returned unless the whole file decoded.
pub fn decode_mask(bytes: &[u8], working_size: (usize, usize)) -> Result<LoadedMask> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;

    let loaded = if reader.info().color_type == png::ColorType::Indexed {
        let palette = reader.info().palette.as_ref().map(|p| p.to_vec()).unwrap_or_default();
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let frame = reader.next_frame(&mut buf)?;
        let ids = unpack_indices(&buf, frame.width as usize, frame.height as usize, frame.line_size, frame.bit_depth)?;
        import_indexed(frame.width as usize, frame.height as usize, ids, &palette)?
    } else {
        log::debug!("mask is {:?}, importing as legacy color mask", reader.info().color_type);
        let rgb = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgb8();
        import_legacy(rgb.width() as usize, rgb.height() as usize, rgb.as_raw())?
    };

    let (ww, wh) = working_size;
    Ok(LoadedMask {
        raster: loaded.raster.resized_nearest(ww, wh),
        registry: loaded.registry,
    })
}

/// Expand packed palette indices (1, 2, 4 or 8 bits) to one byte per pixel.
fn unpack_indices(
    buf: &[u8],
    width: usize,
    height: usize,
    line_size: usize,
    depth: png::BitDepth,
) -> Result<Vec<u8>> {
    let bits = match depth {
        png::BitDepth::One => 1,
        png::BitDepth::Two => 2,
        png::BitDepth::Four => 4,
        png::BitDepth::Eight => 8,
        png::BitDepth::Sixteen => {
            return Err(AnnotatorError::UnsupportedMask("16-bit palette indices".to_string()));
        }
    };
    if buf.len() < line_size * height {
        return Err(AnnotatorError::UnsupportedMask("truncated image data".to_string()));
    }

    let mut out = Vec::with_capacity(width * height);
    let per_byte = 8 / bits;
    let mask = ((1u16 << bits) - 1) as u8;
    for row in buf.chunks(line_size).take(height) {
        for x in 0..width {
            let byte = row[x / per_byte];
            let shift = 8 - bits * (x % per_byte + 1);
            out.push((byte >> shift) & mask);
        }
    }
    Ok(out)
}

fn palette_color(palette: &[u8], idx: u8) -> Option<Rgb> {
    let o = idx as usize * 3;
    palette.get(o..o + 3).map(|c| [c[0], c[1], c[2]])
}

/// Keep the first `MAX_LABELS` distinct non-zero indices (ascending).
/// Indices that fit a slot keep their value; larger ones move to the smallest free slot.
fn import_indexed(width: usize, height: usize, ids: Vec<u8>, palette: &[u8]) -> Result<LoadedMask> {
    let raw = LabelRaster::from_cells(width, height, ids)
        .ok_or_else(|| AnnotatorError::UnsupportedMask("pixel count does not match size".to_string()))?;
    let kept: Vec<LabelId> = raw.distinct_labels().into_iter().take(MAX_LABELS).collect();

    let mut remap = [BACKGROUND; 256];
    let mut used = [false; MAX_LABELS + 1];
    for &id in kept.iter().filter(|id| (**id as usize) <= MAX_LABELS) {
        remap[id as usize] = id;
        used[id as usize] = true;
    }
    for &id in kept.iter().filter(|id| (**id as usize) > MAX_LABELS) {
        if let Some(slot) = (1..=MAX_LABELS).find(|s| !used[*s]) {
            used[slot] = true;
            remap[id as usize] = slot as LabelId;
        }
    }

    let mut registry = LabelRegistry::new();
    for &id in &kept {
        let new_id = remap[id as usize];
        let color = palette_color(palette, id).unwrap_or_else(|| default_label_color(new_id));
        registry.insert(new_id, mask_name(new_id), color);
    }
    registry.set_active(kept.first().map(|id| remap[*id as usize]));

    let cells = raw.cells().iter().map(|c| remap[*c as usize]).collect();
    let raster = LabelRaster::from_cells(width, height, cells)
        .ok_or_else(|| AnnotatorError::UnsupportedMask("pixel count does not match size".to_string()))?;
    Ok(LoadedMask { raster, registry })
}

/// Each distinct non-black color (first seen, row-major) becomes a label, up to `MAX_LABELS`.
fn import_legacy(width: usize, height: usize, rgb: &[u8]) -> Result<LoadedMask> {
    if rgb.len() != width * height * 3 {
        return Err(AnnotatorError::UnsupportedMask("pixel count does not match size".to_string()));
    }
    let mut colors: Vec<Rgb> = Vec::new();
    let mut cells = Vec::with_capacity(width * height);
    for px in rgb.chunks_exact(3) {
        let color = [px[0], px[1], px[2]];
        if color == [0, 0, 0] {
            cells.push(BACKGROUND);
            continue;
        }
        let id = match colors.iter().position(|c| *c == color) {
            Some(pos) => (pos + 1) as LabelId,
            None if colors.len() < MAX_LABELS => {
                colors.push(color);
                colors.len() as LabelId
            }
            None => BACKGROUND,
        };
        cells.push(id);
    }

    let mut registry = LabelRegistry::new();
    for (idx, color) in colors.iter().enumerate() {
        let id = (idx + 1) as LabelId;
        registry.insert(id, mask_name(id), *color);
    }
    registry.set_active((!colors.is_empty()).then_some(1));

    let raster = LabelRaster::from_cells(width, height, cells)
        .ok_or_else(|| AnnotatorError::UnsupportedMask("pixel count does not match size".to_string()))?;
    Ok(LoadedMask { raster, registry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb as Px, RgbImage};

    fn indexed_png(width: u32, height: u32, data: &[u8], palette: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut encoder = png::Encoder::new(&mut bytes, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(palette.to_vec());
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
        writer.finish().unwrap();
        bytes
    }

    #[test]
    fn save_then_load_preserves_labels_and_colors() {
        let mut registry = LabelRegistry::new();
        let a = registry.create("a").unwrap();
        let b = registry.create_with_color("b", [10, 20, 30]).unwrap();
        let raster = LabelRaster::from_cells(2, 2, vec![a, 0, b, b]).unwrap();

        let bytes = encode_mask(&raster, &registry, (4, 4)).unwrap();
        let loaded = decode_mask(&bytes, (2, 2)).unwrap();
        assert_eq!(loaded.raster, raster);
        assert_eq!(loaded.registry.color(b), Some([10, 20, 30]));
        assert_eq!(loaded.registry.name(a), Some("mask_1"));
        assert_eq!(loaded.registry.active(), Some(a));
    }

    #[test]
    fn large_ids_are_moved_into_free_slots() {
        let mut palette = vec![0u8; 256 * 3];
        palette[200 * 3..200 * 3 + 3].copy_from_slice(&[1, 2, 3]);
        let bytes = indexed_png(3, 1, &[0, 200, 2], &palette);
        let loaded = decode_mask(&bytes, (3, 1)).unwrap();
        assert_eq!(loaded.raster.cells(), &[0, 1, 2]);
        assert_eq!(loaded.registry.color(1), Some([1, 2, 3]));
        assert_eq!(loaded.registry.ids(), vec![1, 2]);
        assert_eq!(loaded.registry.active(), Some(2));
    }

    #[test]
    fn only_twenty_labels_are_imported() {
        let data: Vec<u8> = (1..=25).collect();
        let bytes = indexed_png(25, 1, &data, &vec![7u8; 256 * 3]);
        let loaded = decode_mask(&bytes, (25, 1)).unwrap();
        assert_eq!(loaded.registry.len(), MAX_LABELS);
        assert_eq!(&loaded.raster.cells()[20..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn legacy_rgb_masks_use_first_seen_colors() {
        let img = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Px([0, 0, 0]),
            1 => Px([0, 0, 255]),
            _ => Px([255, 0, 0]),
        });
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        let loaded = decode_mask(&bytes, (3, 1)).unwrap();
        assert_eq!(loaded.raster.cells(), &[0, 1, 2]);
        assert_eq!(loaded.registry.color(1), Some([0, 0, 255]));
        assert_eq!(loaded.registry.active(), Some(1));
    }

    #[test]
    fn mask_is_resampled_to_working_size() {
        let mut registry = LabelRegistry::new();
        let a = registry.create("a").unwrap();
        let raster = LabelRaster::from_cells(2, 1, vec![a, 0]).unwrap();
        let bytes = encode_mask(&raster, &registry, (8, 4)).unwrap();
        let loaded = decode_mask(&bytes, (4, 2)).unwrap();
        assert_eq!(loaded.raster.cells(), &[1, 1, 0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn fractional_scale_round_trip_keeps_every_cell() {
        let mut registry = LabelRegistry::new();
        let a = registry.create("a").unwrap();
        let b = registry.create("b").unwrap();
        let cells: Vec<LabelId> = (0..1024 * 3)
            .map(|i| match (i % 1024) % 3 {
                1 => a,
                2 if i >= 1024 => b,
                _ => 0,
            })
            .collect();
        let raster = LabelRaster::from_cells(1024, 3, cells).unwrap();

        let bytes = encode_mask(&raster, &registry, (1500, 5)).unwrap();
        let loaded = decode_mask(&bytes, (1024, 3)).unwrap();
        assert_eq!(loaded.raster, raster);
    }

    #[test]
    fn default_mask_path_sits_next_to_the_image() {
        assert_eq!(
            default_mask_path(Path::new("/data/cells/photo.jpg")),
            PathBuf::from("/data/cells/photo_mask.png")
        );
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode_mask(b"not a png", (2, 2)).is_err());
    }
}
