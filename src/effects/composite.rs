use crate::foundation::error::{FivedError, FivedResult};

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over of premultiplied pixels, with `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = if opacity.is_finite() {
        opacity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Additive blend used for light effects; channels saturate at 255.
pub fn add(dst: PremulRgba8, src: PremulRgba8, intensity: f32) -> PremulRgba8 {
    let intensity = if intensity.is_finite() {
        intensity.max(0.0)
    } else {
        0.0
    };
    let mut out = dst;
    for i in 0..4 {
        let v = f32::from(dst[i]) + f32::from(src[i]) * intensity;
        out[i] = v.round().clamp(0.0, 255.0) as u8;
    }
    // Color may not exceed coverage in premultiplied space.
    let a = out[3];
    for c in out.iter_mut().take(3) {
        *c = (*c).min(a);
    }
    out
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> FivedResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(FivedError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

pub fn add_in_place(dst: &mut [u8], src: &[u8], intensity: f32) -> FivedResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(FivedError::render(
            "add_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = add([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], intensity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Convert a premultiplied pixel back to straight alpha.
pub fn unpremultiply(px: PremulRgba8) -> [u8; 4] {
    let a = px[3];
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |c: u8| -> u8 { ((u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a)).min(255) as u8 };
    [un(px[0]), un(px[1]), un(px[2]), a]
}

fn mul_div255(x: u16, y: u16) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
