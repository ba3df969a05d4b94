/// 8-bit RGB triple used for label colors and palette entries.
pub type Rgb = [u8; 3];

/// Default colors handed out to new labels; label `k` gets entry `k - 1`.
pub const HIGH_CONTRAST_COLORS: [Rgb; 20] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 255, 0],
    [255, 0, 255],
    [0, 255, 255],
    [255, 128, 0],
    [128, 0, 255],
    [0, 255, 128],
    [128, 255, 0],
    [255, 0, 128],
    [0, 128, 255],
    [128, 128, 0],
    [128, 0, 0],
    [0, 128, 0],
    [0, 0, 128],
    [200, 200, 200],
    [255, 200, 200],
    [200, 255, 200],
    [200, 200, 255],
];

/// Default color for a label id, wrapping around the palette.
pub fn default_label_color(id: u8) -> Rgb {
    let idx = (id.max(1) as usize - 1) % HIGH_CONTRAST_COLORS.len();
    HIGH_CONTRAST_COLORS[idx]
}

/// Attach an alpha channel to an RGB color (unmultiplied).
#[inline]
pub fn with_alpha(rgb: Rgb, alpha: u8) -> [u8; 4] {
    [rgb[0], rgb[1], rgb[2], alpha]
}

/// Neutral fill shown where the view extends past the image.
pub const OUTSIDE_IMAGE: [u8; 4] = [48, 48, 48, 255];
