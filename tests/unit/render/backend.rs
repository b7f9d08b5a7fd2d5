use super::*;

#[test]
fn auto_with_failed_probe_is_software() {
    let backend = create_backend_with_probe(BackendKind::Auto, || false).unwrap();
    assert_eq!(backend.kind(), BackendKind::Software);
    assert!(!backend.is_initialized());
}

#[test]
fn explicit_software_is_software() {
    let backend = create_backend_with_probe(BackendKind::Software, || true).unwrap();
    assert_eq!(backend.kind(), BackendKind::Software);
}

#[cfg(not(feature = "gpu"))]
#[test]
fn explicit_gpu_without_feature_is_an_error_but_auto_still_succeeds() {
    assert!(create_backend_with_probe(BackendKind::Gpu, || true).is_err());
    let backend = create_backend_with_probe(BackendKind::Auto, || true).unwrap();
    assert_eq!(backend.kind(), BackendKind::Software);
    assert!(!gpu_available());
}

#[test]
fn backend_kind_parses_aliases() {
    assert_eq!("AUTO".parse::<BackendKind>().unwrap(), BackendKind::Auto);
    assert_eq!("gdi".parse::<BackendKind>().unwrap(), BackendKind::Software);
    assert_eq!(" d2d ".parse::<BackendKind>().unwrap(), BackendKind::Gpu);
    assert!("metal".parse::<BackendKind>().is_err());
}

#[test]
fn software_reports_no_gpu_effects() {
    let backend = SoftwareRenderBackend::new();
    let caps = backend.capabilities();
    assert!(!caps.gpu_accelerated);
    assert!(caps.advanced_effects);
    assert!(!backend.supports_gpu_effects());
}
