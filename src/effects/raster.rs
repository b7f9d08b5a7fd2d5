//! Pixel-level drawing and effects over a premultiplied RGBA8 surface.
//!
//! Every operation clips against the buffer bounds and treats empty or
//! inverted rectangles as no-ops. The software backend draws with these
//! directly; the GPU backend reuses them on read-back frames for effects its
//! scene graph cannot express.

use crate::{
    effects::{blur, composite},
    foundation::{
        core::{Color, Point, Rect},
        error::{FivedError, FivedResult},
    },
};

/// Number of offset copies composited by [`motion_blur`].
pub const MOTION_BLUR_SAMPLES: u32 = 5;

/// Blur radius applied to the bright pass in [`bloom`].
pub const BLOOM_RADIUS: u32 = 6;

/// Largest blur radius any operation here will run; larger requests are clamped.
pub const MAX_BLUR_RADIUS: u32 = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientDirection {
    Horizontal,
    Vertical,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Transparent buffer; fails when `width * height * 4` overflows `usize`.
    pub fn try_new(width: u32, height: u32) -> FivedResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                FivedError::render(format!("pixel buffer {width}x{height} is too large"))
            })?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> FivedResult<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(FivedError::render(
                "pixel buffer expects width*height*4 bytes",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(0, 0, self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn clip(&self, rect: Rect) -> Option<Rect> {
        rect.intersect(self.bounds())
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        let i = self.index(x, y);
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn fill(&mut self, px: [u8; 4]) {
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Copy of the clipped region; `rect` must already lie inside the buffer.
    fn copy_region(&self, rect: Rect) -> PixelBuffer {
        // A sub-region of `self`, so the size cannot overflow.
        let mut out = PixelBuffer {
            width: rect.width(),
            height: rect.height(),
            data: vec![0u8; rect.width() as usize * rect.height() as usize * 4],
        };
        let row_bytes = rect.width() as usize * 4;
        for (row, y) in (rect.top..rect.bottom).enumerate() {
            let src = self.index(rect.left, y);
            let dst = row * row_bytes;
            out.data[dst..dst + row_bytes].copy_from_slice(&self.data[src..src + row_bytes]);
        }
        out
    }

    /// Overwrite the region at `(left, top)`; `src` must fit inside the buffer.
    fn write_region(&mut self, left: i32, top: i32, src: &PixelBuffer) {
        let row_bytes = src.width as usize * 4;
        for row in 0..src.height as i32 {
            let dst = self.index(left, top + row);
            let s = row as usize * row_bytes;
            self.data[dst..dst + row_bytes].copy_from_slice(&src.data[s..s + row_bytes]);
        }
    }

    /// Composite `src` with its top-left at `(left, top)`, clipped to `clip`.
    pub fn blend_region(&mut self, left: i32, top: i32, src: &PixelBuffer, opacity: f32, clip: Rect) {
        let placed = Rect::from_size(left, top, src.width, src.height);
        let Some(area) = placed.intersect(clip).and_then(|r| self.clip(r)) else {
            return;
        };
        for y in area.top..area.bottom {
            for x in area.left..area.right {
                let si = src.index(x - left, y - top);
                let s = [src.data[si], src.data[si + 1], src.data[si + 2], src.data[si + 3]];
                let di = self.index(x, y);
                let d = [self.data[di], self.data[di + 1], self.data[di + 2], self.data[di + 3]];
                self.data[di..di + 4].copy_from_slice(&composite::over(d, s, opacity));
            }
        }
    }

    fn shade<F>(&mut self, rect: Rect, mut shader: F)
    where
        F: FnMut(i32, i32) -> [u8; 4],
    {
        let Some(area) = self.clip(rect) else {
            return;
        };
        for y in area.top..area.bottom {
            for x in area.left..area.right {
                let src = shader(x, y);
                if src[3] == 0 {
                    continue;
                }
                let i = self.index(x, y);
                let d = [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]];
                self.data[i..i + 4].copy_from_slice(&composite::over(d, src, 1.0));
            }
        }
    }
}

pub fn fill_rect(buf: &mut PixelBuffer, rect: Rect, color: Color) {
    if color.is_transparent() {
        return;
    }
    let px = color.to_premul();
    buf.shade(rect, |_, _| px);
}

/// Two-stop linear gradient across the rectangle, start color on the left/top edge.
pub fn fill_linear_gradient(
    buf: &mut PixelBuffer,
    rect: Rect,
    start: Color,
    end: Color,
    direction: GradientDirection,
) {
    if rect.is_empty() || (start.is_transparent() && end.is_transparent()) {
        return;
    }
    let span = match direction {
        GradientDirection::Horizontal => rect.width(),
        GradientDirection::Vertical => rect.height(),
    }
    .saturating_sub(1)
    .max(1) as f32;
    buf.shade(rect, |x, y| {
        let along = match direction {
            GradientDirection::Horizontal => x - rect.left,
            GradientDirection::Vertical => y - rect.top,
        };
        start.lerp(end, along as f32 / span).to_premul()
    });
}

/// Two-stop elliptical gradient from `center` to the rectangle's inscribed ellipse.
/// Pixels outside the ellipse take the edge color.
pub fn fill_radial_gradient(
    buf: &mut PixelBuffer,
    rect: Rect,
    center: Point,
    center_color: Color,
    edge_color: Color,
) {
    if rect.is_empty() || (center_color.is_transparent() && edge_color.is_transparent()) {
        return;
    }
    let rx = (rect.width() as f32 * 0.5).max(0.5);
    let ry = (rect.height() as f32 * 0.5).max(0.5);
    buf.shade(rect, |x, y| {
        let dx = (x as f32 + 0.5 - center.x) / rx;
        let dy = (y as f32 + 0.5 - center.y) / ry;
        let t = (dx * dx + dy * dy).sqrt().min(1.0);
        center_color.lerp(edge_color, t).to_premul()
    });
}

/// Soft shadow of `rect` displaced by the offset and blurred by `blur_radius`.
pub fn drop_shadow(
    buf: &mut PixelBuffer,
    rect: Rect,
    offset_x: i32,
    offset_y: i32,
    blur_radius: i32,
    color: Color,
) -> FivedResult<()> {
    if color.is_transparent() || rect.is_empty() {
        return Ok(());
    }
    let radius = blur_radius.clamp(0, MAX_BLUR_RADIUS as i32);
    let shadow = rect.offset(offset_x, offset_y);
    if radius == 0 {
        fill_rect(buf, shadow, color);
        return Ok(());
    }

    // Anything further than `radius` outside the buffer cannot bleed back in.
    let Some(shadow) = shadow.intersect(buf.bounds().inflate(radius)) else {
        return Ok(());
    };
    let region = shadow.inflate(radius);
    let mut layer = PixelBuffer::try_new(region.width(), region.height())?;
    let inner = Rect::from_size(radius, radius, shadow.width(), shadow.height());
    fill_rect(&mut layer, inner, color);

    let blurred = blur::gaussian_blur_premul(&layer.data, layer.width, layer.height, radius as u32)?;
    let layer = PixelBuffer::from_premul(layer.width, layer.height, blurred)?;
    let clip = buf.bounds();
    buf.blend_region(region.left, region.top, &layer, 1.0, clip);
    Ok(())
}

pub fn blur_region(buf: &mut PixelBuffer, rect: Rect, radius: f32) -> FivedResult<()> {
    let radius = radius_px(radius);
    if radius == 0 {
        return Ok(());
    }
    let Some(area) = buf.clip(rect) else {
        return Ok(());
    };
    let region = buf.copy_region(area);
    let blurred = blur::gaussian_blur_premul(&region.data, region.width, region.height, radius)?;
    let region = PixelBuffer::from_premul(region.width, region.height, blurred)?;
    buf.write_region(area.left, area.top, &region);
    Ok(())
}

/// Bright-pass, blur, then add back scaled by `intensity`.
pub fn bloom(buf: &mut PixelBuffer, rect: Rect, threshold: f32, intensity: f32) -> FivedResult<()> {
    if !(intensity.is_finite() && intensity > 0.0) {
        return Ok(());
    }
    let Some(area) = buf.clip(rect) else {
        return Ok(());
    };
    let threshold = if threshold.is_finite() {
        threshold.clamp(0.0, 1.0)
    } else {
        1.0
    };

    let mut bright = buf.copy_region(area);
    for px in bright.data.chunks_exact_mut(4) {
        let luma = (0.2126 * f32::from(px[0]) + 0.7152 * f32::from(px[1]) + 0.0722 * f32::from(px[2]))
            / 255.0;
        if luma < threshold {
            px.copy_from_slice(&[0, 0, 0, 0]);
        }
    }
    let glow = blur::gaussian_blur_premul(&bright.data, bright.width, bright.height, BLOOM_RADIUS)?;

    let mut region = buf.copy_region(area);
    composite::add_in_place(&mut region.data, &glow, intensity)?;
    buf.write_region(area.left, area.top, &region);
    Ok(())
}

/// Scanline depth of field.
///
/// The focal line sits at `focal_distance` (0 = top, 1 = bottom) of `rect`. Each
/// row is blurred horizontally with `blur_amount` scaled by its distance from the
/// focal line, normalized by half the rect height and clamped to `[0, 1]`.
pub fn depth_of_field(
    buf: &mut PixelBuffer,
    rect: Rect,
    focal_distance: f32,
    blur_amount: f32,
) -> FivedResult<()> {
    if !(blur_amount.is_finite() && blur_amount > 0.0) {
        return Ok(());
    }
    let Some(area) = buf.clip(rect) else {
        return Ok(());
    };
    let focal = if focal_distance.is_finite() {
        focal_distance.clamp(0.0, 1.0)
    } else {
        0.5
    };
    let focal_y = rect.top as f32 + focal * rect.height() as f32;
    let half = (rect.height() as f32 * 0.5).max(1.0);

    let row_bytes = area.width() as usize * 4;
    for y in area.top..area.bottom {
        let distance = ((y as f32 + 0.5 - focal_y).abs() / half).clamp(0.0, 1.0);
        let radius = radius_px(blur_amount * distance);
        if radius == 0 {
            continue;
        }
        let start = buf.index(area.left, y);
        let blurred = blur::blur_row_premul(&buf.data[start..start + row_bytes], radius)?;
        buf.data[start..start + row_bytes].copy_from_slice(&blurred);
    }
    Ok(())
}

/// Composite [`MOTION_BLUR_SAMPLES`] copies of the region stepped along the motion
/// vector, each weighted `255 * intensity / N`.
pub fn motion_blur(buf: &mut PixelBuffer, rect: Rect, velocity_x: f32, velocity_y: f32, intensity: f32) {
    if !(intensity.is_finite() && intensity > 0.0) || !velocity_x.is_finite() || !velocity_y.is_finite() {
        return;
    }
    let Some(area) = buf.clip(rect) else {
        return;
    };
    let n = MOTION_BLUR_SAMPLES as f32;
    let weight = (255.0 * intensity.min(1.0) / n).floor();
    if weight <= 0.0 {
        return;
    }
    let opacity = weight / 255.0;

    let source = buf.copy_region(area);
    let clip = buf.bounds();
    for k in 1..=MOTION_BLUR_SAMPLES {
        let step = k as f32 / n;
        let dx = (velocity_x * step).round() as i32;
        let dy = (velocity_y * step).round() as i32;
        buf.blend_region(
            area.left.saturating_add(dx),
            area.top.saturating_add(dy),
            &source,
            opacity,
            clip,
        );
    }
}

/// Split red and blue horizontally by `offset * strength` pixels.
///
/// Red is read from `x + shift`, blue from `x - shift`, green is untouched. A
/// source index outside the region leaves that channel of the pixel unchanged.
/// Moved channels are clamped to the destination alpha to stay premultiplied.
pub fn chromatic_aberration(buf: &mut PixelBuffer, rect: Rect, offset: f32, strength: f32) {
    let scaled = offset * strength;
    if !scaled.is_finite() {
        return;
    }
    let shift = scaled.round() as i32;
    if shift == 0 {
        return;
    }
    let Some(area) = buf.clip(rect) else {
        return;
    };

    let source = buf.copy_region(area);
    let w = source.width as i32;
    for y in 0..source.height as i32 {
        for x in 0..w {
            let di = buf.index(area.left + x, area.top + y);
            let alpha = buf.data[di + 3];
            if let Some(red_x) = x.checked_add(shift).filter(|sx| (0..w).contains(sx)) {
                buf.data[di] = source.data[source.index(red_x, y)].min(alpha);
            }
            if let Some(blue_x) = x.checked_sub(shift).filter(|sx| (0..w).contains(sx)) {
                buf.data[di + 2] = source.data[source.index(blue_x, y) + 2].min(alpha);
            }
        }
    }
}

fn radius_px(radius: f32) -> u32 {
    if radius.is_finite() && radius > 0.0 {
        radius.round().min(MAX_BLUR_RADIUS as f32) as u32
    } else {
        0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/raster.rs"]
mod tests;
