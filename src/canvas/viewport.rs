use crate::utils::vector::Vec2;

/// At maximum zoom at least this many image pixels stay visible on the shorter canvas axis.
pub const MAX_ZOOM_PIXEL: f64 = 32.0;
/// At minimum zoom at most this many image pixels are visible on the longer canvas axis.
pub const MIN_ZOOM_PIXEL: f64 = 8192.0;

/// Mapping between canvas (screen) pixels and image pixels.
///
/// `zoom` is canvas pixels per image pixel. The view origin is the image-space
/// coordinate shown at the canvas top-left corner; it is unbounded, so the view
/// may extend past any edge of the image.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    view_x: i32,
    view_y: i32,
    view_w: f64,
    view_h: f64,
    zoom: f64,
    zoom_min: f64,
    zoom_max: f64,
    canvas_w: f64,
    canvas_h: f64,
    image_w: usize,
    image_h: usize,
}

impl Viewport {
    /// Create a viewport that fits the whole image into the canvas.
    pub fn new(canvas_w: f64, canvas_h: f64, image_w: usize, image_h: usize) -> Self {
        let mut viewport = Self {
            view_x: 0,
            view_y: 0,
            view_w: canvas_w.max(1.0),
            view_h: canvas_h.max(1.0),
            zoom: 1.0,
            zoom_min: 1.0,
            zoom_max: 1.0,
            canvas_w: canvas_w.max(1.0),
            canvas_h: canvas_h.max(1.0),
            image_w,
            image_h,
        };
        viewport.update_zoom_bounds();
        viewport.reset();
        viewport
    }

    fn update_zoom_bounds(&mut self) {
        let short_axis = self.canvas_w.min(self.canvas_h);
        let long_axis = self.canvas_w.max(self.canvas_h);
        self.zoom_max = short_axis / MAX_ZOOM_PIXEL;
        self.zoom_min = (long_axis / MIN_ZOOM_PIXEL).min(self.zoom_max);
    }

    fn update_view_extent(&mut self) {
        self.view_w = self.canvas_w / self.zoom;
        self.view_h = self.canvas_h / self.zoom;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.zoom_min, self.zoom_max)
    }

    /// Image-space coordinate at the canvas top-left corner.
    pub fn origin(&self) -> (i32, i32) {
        (self.view_x, self.view_y)
    }

    /// Image-space extent currently visible.
    pub fn view_size(&self) -> (f64, f64) {
        (self.view_w, self.view_h)
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_w, self.canvas_h)
    }

    pub fn image_size(&self) -> (usize, usize) {
        (self.image_w, self.image_h)
    }

    /// Canvas pixel to image pixel. Not clamped: results may fall outside the image.
    pub fn screen_to_image(&self, pos: Vec2) -> (i32, i32) {
        let ix = (pos.x * self.view_w / self.canvas_w).floor() as i32 + self.view_x;
        let iy = (pos.y * self.view_h / self.canvas_h).floor() as i32 + self.view_y;
        (ix, iy)
    }

    /// Canvas position of the top-left corner of image pixel `(ix, iy)`.
    pub fn image_to_screen(&self, ix: f64, iy: f64) -> Vec2 {
        Vec2::new(
            (ix - self.view_x as f64) * self.canvas_w / self.view_w,
            (iy - self.view_y as f64) * self.canvas_h / self.view_h,
        )
    }

    pub fn in_bounds(&self, ix: i32, iy: i32) -> bool {
        ix >= 0 && iy >= 0 && (ix as usize) < self.image_w && (iy as usize) < self.image_h
    }

    /// Multiply the zoom by `factor` keeping the image point under `anchor` fixed on screen.
    /// Returns `true` when the zoom actually changed.
    pub fn zoom_about(&mut self, anchor: Vec2, factor: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let new_zoom = (self.zoom * factor).clamp(self.zoom_min, self.zoom_max);
        if (new_zoom - self.zoom).abs() <= f64::EPSILON * self.zoom {
            return false;
        }
        let fx = self.view_x as f64 + anchor.x * self.view_w / self.canvas_w;
        let fy = self.view_y as f64 + anchor.y * self.view_h / self.canvas_h;

        self.zoom = new_zoom;
        self.update_view_extent();

        self.view_x = (fx - anchor.x * self.view_w / self.canvas_w).round() as i32;
        self.view_y = (fy - anchor.y * self.view_h / self.canvas_h).round() as i32;
        true
    }

    /// Zoom about the canvas center, for keyboard zoom without a cursor.
    pub fn zoom_about_center(&mut self, factor: f64) -> bool {
        let center = Vec2::new(self.canvas_w * 0.5, self.canvas_h * 0.5);
        self.zoom_about(center, factor)
    }

    /// Shift the view by a screen-space delta (dragging right moves the image right).
    pub fn pan(&mut self, dx_screen: f64, dy_screen: f64) {
        self.view_x -= (dx_screen * self.view_w / self.canvas_w).round() as i32;
        self.view_y -= (dy_screen * self.view_h / self.canvas_h).round() as i32;
    }

    pub fn set_origin(&mut self, view_x: i32, view_y: i32) {
        self.view_x = view_x;
        self.view_y = view_y;
    }

    /// Canvas resized: zoom bounds follow the new size, the origin stays put.
    pub fn resize(&mut self, canvas_w: f64, canvas_h: f64) -> bool {
        let (canvas_w, canvas_h) = (canvas_w.max(1.0), canvas_h.max(1.0));
        if canvas_w == self.canvas_w && canvas_h == self.canvas_h {
            return false;
        }
        self.canvas_w = canvas_w;
        self.canvas_h = canvas_h;
        self.update_zoom_bounds();
        self.zoom = self.zoom.clamp(self.zoom_min, self.zoom_max);
        self.update_view_extent();
        true
    }

    /// New image: remember its size and fit it.
    pub fn set_image_size(&mut self, image_w: usize, image_h: usize) {
        self.image_w = image_w;
        self.image_h = image_h;
        self.reset();
    }

    /// Fit the whole image into the canvas and center it.
    pub fn reset(&mut self) {
        let fit = if self.image_w == 0 || self.image_h == 0 {
            1.0
        } else {
            (self.canvas_w / self.image_w as f64).min(self.canvas_h / self.image_h as f64)
        };
        self.zoom = fit.clamp(self.zoom_min, self.zoom_max);
        self.update_view_extent();
        self.view_x = ((self.image_w as f64 - self.view_w) * 0.5).round() as i32;
        self.view_y = ((self.image_h as f64 - self.view_h) * 0.5).round() as i32;
    }
}
