use wuquant::{Method, PaletteConfig, QuantizeError};

fn gradient(width: usize, height: usize) -> Vec<rgb::RGB<u8>> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / width) as u8;
            let g = (y * 255 / height) as u8;
            let b = 128u8;
            pixels.push(rgb::RGB { r, g, b });
        }
    }
    pixels
}

#[test]
fn smoke_test_quantize() {
    let pixels = gradient(32, 32);
    let palette = wuquant::quantize(&pixels, 6).unwrap();

    assert_eq!(palette.len(), 6);
    assert_eq!(palette.masses().iter().sum::<u64>(), 32 * 32);
    assert!(palette.masses().windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn smoke_test_refine() {
    let pixels = gradient(48, 48);
    let palette = wuquant::refine(&pixels, 6).unwrap();

    assert_eq!(palette.len(), 6);
    assert_eq!(palette.masses().iter().sum::<u64>(), 48 * 48);
}

#[test]
fn all_methods_through_config() {
    let pixels = gradient(16, 16);
    for method in [Method::Wu, Method::Wsm] {
        for colors in [1, 2, 5, 16] {
            let config = PaletteConfig::new().colors(colors).method(method);
            let palette = wuquant::extract_palette(&pixels, &config).unwrap();
            assert!(palette.len() <= colors, "{method:?}/{colors}");
            assert!(!palette.is_empty());
        }
    }
}

#[test]
fn error_zero_colors() {
    let pixels = vec![rgb::RGB { r: 0, g: 0, b: 0 }; 4];

    assert!(matches!(
        wuquant::quantize(&pixels, 0),
        Err(QuantizeError::InvalidRequest(_))
    ));
    assert!(matches!(
        wuquant::refine(&pixels, 0),
        Err(QuantizeError::InvalidRequest(_))
    ));
    assert!(matches!(
        wuquant::extract_palette(&pixels, &PaletteConfig::new().colors(0)),
        Err(QuantizeError::InvalidRequest(_))
    ));
}

#[test]
fn error_bad_config() {
    let pixels = vec![rgb::RGB { r: 0, g: 0, b: 0 }; 4];

    assert!(matches!(
        wuquant::extract_palette(&pixels, &PaletteConfig::new().max_iterations(0)),
        Err(QuantizeError::InvalidRequest(_))
    ));
    assert!(matches!(
        wuquant::extract_palette(&pixels, &PaletteConfig::new().tolerance(f64::NAN)),
        Err(QuantizeError::InvalidRequest(_))
    ));
}

#[test]
fn method_selectors() {
    assert_eq!(Method::try_from(0).unwrap(), Method::Wu);
    assert_eq!(Method::try_from(1).unwrap(), Method::Wsm);
    assert!(matches!(
        Method::try_from(2),
        Err(QuantizeError::InvalidRequest(_))
    ));

    assert_eq!("wu".parse::<Method>().unwrap(), Method::Wu);
    assert_eq!(" WSM ".parse::<Method>().unwrap(), Method::Wsm);
    assert!("median-cut".parse::<Method>().is_err());
}

#[test]
fn single_color_image() {
    let pixels = vec![
        rgb::RGB {
            r: 128,
            g: 64,
            b: 32
        };
        64
    ];

    let palette = wuquant::quantize(&pixels, 6).unwrap();
    assert_eq!(palette.len(), 1);
    assert_eq!(palette.entries()[0], [128, 64, 32]);

    let refined = wuquant::refine(&pixels, 6).unwrap();
    assert_eq!(refined, palette);
}

#[test]
fn two_color_image() {
    let mut pixels = Vec::with_capacity(64);
    for i in 0..64 {
        if i < 40 {
            pixels.push(rgb::RGB { r: 0, g: 0, b: 0 });
        } else {
            pixels.push(rgb::RGB {
                r: 255,
                g: 255,
                b: 255,
            });
        }
    }

    for palette in [
        wuquant::quantize(&pixels, 2).unwrap(),
        wuquant::refine(&pixels, 2).unwrap(),
    ] {
        assert_eq!(palette.entries(), &[[0, 0, 0], [255, 255, 255]]);
        assert_eq!(palette.masses(), &[40, 24]);
        assert_eq!(palette.hex_strings(), ["#000000", "#ffffff"]);
    }
}

#[test]
fn empty_image() {
    let palette = wuquant::quantize(&[], 6).unwrap();
    assert!(palette.is_empty());
    assert!(wuquant::refine(&[], 6).unwrap().is_empty());

    let config = PaletteConfig::new().method(Method::Wsm);
    assert_eq!(wuquant::dominant_color(&[], &config).unwrap(), None);
}

#[test]
fn dominant_color_is_heaviest() {
    let mut pixels = vec![rgb::RGB { r: 200, g: 20, b: 20 }; 90];
    pixels.extend(vec![rgb::RGB { r: 20, g: 20, b: 200 }; 10]);

    for method in [Method::Wu, Method::Wsm] {
        let config = PaletteConfig::new().colors(2).method(method);
        assert_eq!(
            wuquant::dominant_color(&pixels, &config).unwrap(),
            Some([200, 20, 20])
        );
    }
}

#[test]
fn palette_never_padded() {
    let pixels = vec![
        rgb::RGB { r: 10, g: 10, b: 10 },
        rgb::RGB { r: 240, g: 10, b: 10 },
        rgb::RGB { r: 10, g: 240, b: 10 },
    ];
    let palette = wuquant::quantize(&pixels, 10).unwrap();
    assert_eq!(palette.len(), 3);
    let refined = wuquant::refine(&pixels, 10).unwrap();
    assert_eq!(refined.len(), 3);
}
