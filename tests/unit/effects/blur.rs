use super::*;

#[test]
fn radius_zero_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    assert_eq!(gaussian_blur_premul(&src, 1, 2, 0).unwrap(), src);
}

#[test]
fn constant_image_survives_blur() {
    let (w, h) = (6u32, 4u32);
    let src = [12u8, 24, 36, 48].repeat((w * h) as usize);
    assert_eq!(gaussian_blur_premul(&src, w, h, 3).unwrap(), src);
}

#[test]
fn mismatched_length_is_rejected() {
    assert!(gaussian_blur_premul(&[0u8; 7], 1, 2, 1).is_err());
}

#[test]
fn single_pixel_spreads_but_keeps_energy() {
    let (w, h) = (7u32, 7u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((3 * w + 3) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = gaussian_blur_premul(&src, w, h, 2).unwrap();

    let lit = out.chunks_exact(4).filter(|px| px[3] != 0).count();
    assert!(lit > 1);
    let sum_a: i32 = out.chunks_exact(4).map(|px| i32::from(px[3])).sum();
    assert!((sum_a - 255).abs() <= 6);
}

#[test]
fn row_blur_leaves_uniform_row_alone() {
    let row = [9u8, 8, 7, 255].repeat(5);
    assert_eq!(blur_row_premul(&row, 2).unwrap(), row);
}
