//! The engine handle is process-wide, so everything touching it lives in this one test.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use pispi_qr::{
    render::{
        engine, generate_qr_svg, reset_engine, set_engine, ErrorCorrection, QrEngine, RawModules,
        SvgOptions,
    },
    Error, PaymentInput,
};

#[derive(Default)]
struct Counting {
    calls: AtomicUsize,
}

impl QrEngine for Counting {
    fn create(&self, payload: &str, level: ErrorCorrection) -> Result<RawModules, Error> {
        assert!(payload.starts_with("000201"));
        assert_eq!(level, ErrorCorrection::Medium);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RawModules::from_rows(vec![vec![1, 0, 1], vec![0, 1, 0], vec![1, 0, 1]]))
    }
}

struct Broken;

impl QrEngine for Broken {
    fn create(&self, _: &str, _: ErrorCorrection) -> Result<RawModules, Error> {
        Ok(RawModules::default())
    }
}

fn input() -> PaymentInput {
    PaymentInput::builder(
        "3497a720-ab11-4973-9619-534e04f263a1",
        "BJ",
        "DYNAMIC",
        "Tx-20251112-055052-001",
    )
    .with_amount(82500u32)
    .build()
    .0
}

#[test]
fn process_wide_engine() {
    let counting = Arc::new(Counting::default());
    set_engine(counting.clone());

    let svg = generate_qr_svg(&input(), &SvgOptions::default()).unwrap();
    assert_eq!(svg.matches("<circle").count(), 5);
    generate_qr_svg(&input(), &SvgOptions::default().with_size(200.0)).unwrap();
    assert_eq!(counting.calls.load(Ordering::SeqCst), 2);

    // Invalid input never reaches the engine.
    let mut invalid = input();
    invalid.country_code = "FR".into();
    assert_eq!(
        generate_qr_svg(&invalid, &SvgOptions::default()),
        Err(Error::UnsupportedCountry("FR".into()))
    );
    assert_eq!(counting.calls.load(Ordering::SeqCst), 2);

    set_engine(Arc::new(Broken));
    assert!(matches!(
        generate_qr_svg(&input(), &SvgOptions::default()),
        Err(Error::MatrixShape(_))
    ));

    reset_engine();
    let resolved = engine();
    if cfg!(feature = "qrcode") {
        let svg = generate_qr_svg(&input(), &SvgOptions::default()).unwrap();
        assert!(resolved.is_ok());
        assert!(svg.contains("<circle"));
    } else {
        assert_eq!(resolved.err(), Some(Error::EngineUnavailable));
        assert_eq!(
            generate_qr_svg(&input(), &SvgOptions::default()),
            Err(Error::EngineUnavailable)
        );
    }
}
